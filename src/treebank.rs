//! Parse trees and the bracketed format treebanks store them in.
use std::fmt::Display;

use chumsky::prelude::*;
use itertools::Itertools;

use crate::error::{Error, TreeLocation};
use crate::grammar::{Nonterminal, Production, Symbol, Terminal};

mod corpus;

pub use corpus::{Corpus, TreebankCorpus, collect_productions, count_productions};

///One parsed sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParsedTree {
    Node {
        label: Nonterminal,
        children: Vec<ParsedTree>,
    },
    Leaf(Terminal),
}

impl ParsedTree {
    pub fn node(label: impl Into<String>, children: Vec<ParsedTree>) -> Self {
        ParsedTree::Node {
            label: Nonterminal::new(label),
            children,
        }
    }

    pub fn leaf(token: impl Into<String>) -> Self {
        ParsedTree::Leaf(Terminal::new(token))
    }

    ///The symbol this tree contributes to the right-hand side of its parent's production.
    pub fn symbol(&self) -> Symbol {
        match self {
            ParsedTree::Node { label, .. } => Symbol::Nonterminal(label.clone()),
            ParsedTree::Leaf(token) => Symbol::Terminal(token.clone()),
        }
    }

    ///The production of every internal node, in pre-order.
    pub fn productions(&self) -> Productions<'_> {
        Productions { stack: vec![self] }
    }

    ///The tokens of the tree from left to right.
    pub fn leaves(&self) -> Vec<&Terminal> {
        let mut leaves = vec![];
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            match tree {
                ParsedTree::Node { children, .. } => stack.extend(children.iter().rev()),
                ParsedTree::Leaf(token) => leaves.push(token),
            }
        }
        leaves
    }

    ///Parses exactly one bracketed tree.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let mut trees = parse_trees(s, TreeLocation::Text)?;
        match trees.len() {
            1 => Ok(trees.remove(0)),
            n => Err(Error::MalformedTree {
                location: TreeLocation::Text,
                tree: 0,
                message: format!("expected one tree but found {n}"),
            }),
        }
    }

    ///Parses every bracketed tree in `s`.
    pub fn parse_all(s: &str) -> Result<Vec<Self>, Error> {
        parse_trees(s, TreeLocation::Text)
    }
}

///Iterator over the productions of a [`ParsedTree`].
#[derive(Debug, Clone)]
pub struct Productions<'a> {
    stack: Vec<&'a ParsedTree>,
}

impl Iterator for Productions<'_> {
    type Item = Production;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(tree) = self.stack.pop() {
            if let ParsedTree::Node { label, children } = tree {
                self.stack.extend(children.iter().rev());
                return Some(Production::new(
                    label.clone(),
                    children.iter().map(ParsedTree::symbol).collect(),
                ));
            }
        }
        None
    }
}

impl Display for ParsedTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParsedTree::Leaf(token) => write!(f, "{}", token.token()),
            ParsedTree::Node { label, children } if children.is_empty() => write!(f, "({label})"),
            ParsedTree::Node { label, children } => {
                write!(f, "({label} {})", children.iter().join(" "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RawTree<'src> {
    Node(Option<&'src str>, Vec<RawTree<'src>>),
    Leaf(&'src str),
}

fn treebank_parser<'src>()
-> impl Parser<'src, &'src str, Vec<RawTree<'src>>, extra::Err<Rich<'src, char>>> {
    let token = none_of("() \t\r\n")
        .repeated()
        .at_least(1)
        .to_slice()
        .labelled("token");

    let tree = recursive(|tree| {
        token
            .clone()
            .or_not()
            .then(
                choice((tree, token.clone().map(RawTree::Leaf)))
                    .padded()
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .padded()
            .delimited_by(just('('), just(')'))
            .map(|(label, children)| RawTree::Node(label, children))
            .labelled("tree")
    });

    tree.padded().repeated().collect::<Vec<_>>().then_ignore(end())
}

///Which top level tree the byte offset `offset` falls in.
fn tree_index_at(s: &str, offset: usize) -> usize {
    let mut depth = 0_usize;
    let mut opened = 0_usize;
    for c in s[..offset.min(s.len())].chars() {
        match c {
            '(' => {
                if depth == 0 {
                    opened += 1;
                }
                depth += 1;
            }
            ')' => depth = depth.saturating_sub(1),
            _ => (),
        }
    }
    opened.saturating_sub(1)
}

fn convert(raw: RawTree<'_>, location: &TreeLocation, tree: usize) -> Result<ParsedTree, Error> {
    match raw {
        RawTree::Leaf(token) => Ok(ParsedTree::leaf(token)),
        RawTree::Node(Some(label), children) => Ok(ParsedTree::node(
            label,
            children
                .into_iter()
                .map(|x| convert(x, location, tree))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        RawTree::Node(None, _) => Err(Error::MalformedTree {
            location: location.clone(),
            tree,
            message: "node without a label".to_string(),
        }),
    }
}

///Parses a sequence of bracketed trees. A root without a label wrapping a single tree, as in
///`( (S ...) )`, is replaced by the tree it wraps.
pub(crate) fn parse_trees(s: &str, location: TreeLocation) -> Result<Vec<ParsedTree>, Error> {
    let raw = treebank_parser()
        .parse(s)
        .into_result()
        .map_err(|errors| Error::MalformedTree {
            location: location.clone(),
            tree: errors
                .first()
                .map(|e| tree_index_at(s, e.span().start))
                .unwrap_or(0),
            message: errors.iter().map(|x| x.to_string()).join("; "),
        })?;

    raw.into_iter()
        .enumerate()
        .map(|(i, tree)| match tree {
            RawTree::Node(None, mut children)
                if children.len() == 1 && matches!(children[0], RawTree::Node(..)) =>
            {
                convert(children.remove(0), &location, i)
            }
            tree => convert(tree, &location, i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treebanks::{PTB_SAMPLE, TOY_TREEBANK};
    use anyhow::Result;

    #[test]
    fn parses_a_tree() -> Result<()> {
        let tree = ParsedTree::parse("(S (NP (DT the) (NN dog)) (VP (VBZ barks)))")?;
        assert_eq!(
            tree,
            ParsedTree::node(
                "S",
                vec![
                    ParsedTree::node(
                        "NP",
                        vec![
                            ParsedTree::node("DT", vec![ParsedTree::leaf("the")]),
                            ParsedTree::node("NN", vec![ParsedTree::leaf("dog")]),
                        ]
                    ),
                    ParsedTree::node(
                        "VP",
                        vec![ParsedTree::node("VBZ", vec![ParsedTree::leaf("barks")])]
                    ),
                ]
            )
        );
        assert_eq!(
            tree.to_string(),
            "(S (NP (DT the) (NN dog)) (VP (VBZ barks)))"
        );
        Ok(())
    }

    #[test]
    fn productions_in_pre_order() -> Result<()> {
        let tree = ParsedTree::parse("(S (NP (DT the) (NN dog)) (VP (VBZ barks)))")?;
        let productions: Vec<String> = tree.productions().map(|x| x.to_string()).collect();
        assert_eq!(
            productions,
            vec![
                "S -> NP VP",
                "NP -> DT NN",
                "DT -> 'the'",
                "NN -> 'dog'",
                "VP -> VBZ",
                "VBZ -> 'barks'"
            ]
        );
        assert_eq!(
            tree.leaves()
                .into_iter()
                .map(|x| x.token())
                .collect::<Vec<_>>(),
            vec!["the", "dog", "barks"]
        );
        Ok(())
    }

    #[test]
    fn unwraps_penn_root() -> Result<()> {
        let trees = ParsedTree::parse_all(PTB_SAMPLE)?;
        assert_eq!(trees.len(), 2);
        for tree in trees.iter() {
            assert!(matches!(tree, ParsedTree::Node { label, .. } if label.symbol() == "S"));
        }
        assert_eq!(trees[0].productions().count(), 29);
        assert_eq!(trees[1].productions().count(), 22);
        assert_eq!(
            trees[0]
                .leaves()
                .into_iter()
                .map(|x| x.token())
                .join(" "),
            "Pierre Vinken , 61 years old , will join the board as a nonexecutive director Nov. 29 ."
        );
        Ok(())
    }

    #[test]
    fn empty_nodes_have_empty_productions() -> Result<()> {
        let tree = ParsedTree::parse("(S (NP) (VP (VB go)))")?;
        let first_child = tree.productions().nth(1).unwrap();
        assert!(first_child.rhs().is_empty());
        assert_eq!(tree.to_string(), "(S (NP) (VP (VB go)))");
        Ok(())
    }

    #[test]
    fn empty_text_has_no_trees() -> Result<()> {
        assert!(ParsedTree::parse_all("  \n\t")?.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_trees() {
        for (text, index) in [
            ("(S (NP (DT the)) (VP (VB go))", 0),
            ("(S (VB go)) (S (NP) ((VB go)))", 1),
            ("(S (VB go)) (S (VB go)) ( (S (VB go)) (S (VB go)) )", 2),
            ("(S (VB go)) word", 0),
            ("(S (VB go))) (S (VB go))", 0),
        ] {
            let err = ParsedTree::parse_all(text).unwrap_err();
            assert!(
                matches!(err, Error::MalformedTree { tree, .. } if tree == index),
                "{text}: {err:?}"
            );
        }
        assert!(ParsedTree::parse(TOY_TREEBANK).is_err());
    }
}

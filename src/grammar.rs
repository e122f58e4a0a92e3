//! Symbols, productions and probabilistic context-free grammars.
use std::fmt::Display;

use ahash::{AHashMap, AHashSet};

use crate::error::Error;

mod induction;
#[cfg(feature = "sampling")]
mod sampling;
mod scoring;
mod serialization;

pub use induction::{ProductionCounts, induce_pcfg};
#[cfg(feature = "sampling")]
pub use sampling::Sampler;
pub use serialization::{RuleFormat, RuleRecord, format_probability};

///Two probabilities of the same left-hand side may drift from one by at most this much when a
///grammar is built from already weighted rules.
pub const PROBABILITY_TOLERANCE: f64 = 0.01;

///A grammar category that can be expanded further.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonterminal(String);

impl Nonterminal {
    pub fn new(symbol: impl Into<String>) -> Self {
        Nonterminal(symbol.into())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl Display for Nonterminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Nonterminal {
    fn from(value: &str) -> Self {
        Nonterminal::new(value)
    }
}

///A leaf token, e.g. a word.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Terminal(String);

impl Terminal {
    pub fn new(token: impl Into<String>) -> Self {
        Terminal(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

///Terminals are quoted so that they can't be confused with nonterminals: `'dog'`, or `"don't"`
///if the token has a single quote but no double quote. Backslashes and the quote character are
///escaped with a backslash.
impl Display for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = self.0.as_str();
        let quote = if token.contains('\'') && !token.contains('"') {
            '"'
        } else {
            '\''
        };
        write!(f, "{quote}")?;
        for c in token.chars() {
            if c == quote || c == '\\' {
                write!(f, "\\")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "{quote}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Nonterminal(Nonterminal),
    Terminal(Terminal),
}

impl Symbol {
    pub fn nonterminal(symbol: impl Into<String>) -> Self {
        Symbol::Nonterminal(Nonterminal::new(symbol))
    }

    pub fn terminal(token: impl Into<String>) -> Self {
        Symbol::Terminal(Terminal::new(token))
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::Nonterminal(_))
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Nonterminal(x) => write!(f, "{x}"),
            Symbol::Terminal(x) => write!(f, "{x}"),
        }
    }
}

///A single rewrite rule, `lhs -> rhs`.
///
///Two productions are equal when both sides are equal, so repeated observations of the same
///rule in a treebank compare equal and are counted together during induction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Production {
    lhs: Nonterminal,
    rhs: Vec<Symbol>,
}

impl Production {
    pub fn new(lhs: Nonterminal, rhs: Vec<Symbol>) -> Self {
        Production { lhs, rhs }
    }

    pub fn lhs(&self) -> &Nonterminal {
        &self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    ///Whether the right-hand side consists only of terminals, e.g. `NN -> 'dog'`.
    pub fn is_lexical(&self) -> bool {
        !self.rhs.is_empty() && self.rhs.iter().all(|x| !x.is_nonterminal())
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> ", self.lhs)?;
        for (i, symbol) in self.rhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedProduction {
    production: Production,
    probability: f64,
}

impl WeightedProduction {
    pub fn new(production: Production, probability: f64) -> Self {
        WeightedProduction {
            production,
            probability,
        }
    }

    pub fn production(&self) -> &Production {
        &self.production
    }

    pub fn lhs(&self) -> &Nonterminal {
        self.production.lhs()
    }

    pub fn rhs(&self) -> &[Symbol] {
        self.production.rhs()
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Display for WeightedProduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.production,
            format_probability(self.probability, RuleFormat::default().precision)
        )
    }
}

///A probabilistic context-free grammar: a start symbol and weighted rules where the rules of
///each left-hand side form a probability distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Pcfg {
    start: Nonterminal,
    productions: Vec<WeightedProduction>,
}

impl Pcfg {
    ///Builds a grammar from already weighted rules, checking that every probability is in
    ///(0, 1] and that each left-hand side sums to one within [`PROBABILITY_TOLERANCE`].
    pub fn new(start: Nonterminal, productions: Vec<WeightedProduction>) -> Result<Self, Error> {
        let mut totals: Vec<(&Nonterminal, f64)> = vec![];
        let mut seen: AHashMap<&Nonterminal, usize> = AHashMap::new();
        for rule in productions.iter() {
            let p = rule.probability;
            if !(p.is_finite() && p > 0.0 && p <= 1.0) {
                return Err(Error::InvalidProbability {
                    production: rule.production.clone(),
                    probability: p,
                });
            }
            let i = *seen.entry(rule.lhs()).or_insert_with(|| {
                totals.push((rule.lhs(), 0.0));
                totals.len() - 1
            });
            totals[i].1 += p;
        }

        if let Some((lhs, total)) = totals
            .into_iter()
            .find(|(_, total)| (total - 1.0).abs() > PROBABILITY_TOLERANCE)
        {
            return Err(Error::ProbabilityMass {
                lhs: lhs.clone(),
                total,
            });
        }

        Ok(Pcfg { start, productions })
    }

    pub(crate) fn from_induced(start: Nonterminal, productions: Vec<WeightedProduction>) -> Self {
        Pcfg { start, productions }
    }

    pub fn start(&self) -> &Nonterminal {
        &self.start
    }

    pub fn productions(&self) -> &[WeightedProduction] {
        &self.productions
    }

    pub fn productions_with_lhs<'a>(
        &'a self,
        lhs: &'a Nonterminal,
    ) -> impl Iterator<Item = &'a WeightedProduction> + 'a {
        self.productions.iter().filter(move |x| x.lhs() == lhs)
    }

    ///Every left-hand side in the order it first appears in the grammar.
    pub fn nonterminals(&self) -> Vec<&Nonterminal> {
        let mut seen = AHashSet::new();
        self.productions
            .iter()
            .map(|x| x.lhs())
            .filter(|lhs| seen.insert(*lhs))
            .collect()
    }

    pub fn probability(&self, production: &Production) -> Option<f64> {
        self.productions
            .iter()
            .find(|x| x.production() == production)
            .map(|x| x.probability)
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }
}

impl Display for Pcfg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grammar with {} productions (start state = {})", self.len(), self.start)?;
        for rule in self.productions.iter() {
            writeln!(f, "    {rule}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn np_vp() -> Production {
        Production::new(
            "S".into(),
            vec![Symbol::nonterminal("NP"), Symbol::nonterminal("VP")],
        )
    }

    #[test]
    fn production_display() {
        assert_eq!(np_vp().to_string(), "S -> NP VP");
        assert_eq!(
            Production::new("DT".into(), vec![Symbol::terminal("the")]).to_string(),
            "DT -> 'the'"
        );
        assert_eq!(
            Production::new("-NONE-".into(), vec![]).to_string(),
            "-NONE- -> "
        );
        assert_eq!(
            WeightedProduction::new(np_vp(), 1.0).to_string(),
            "S -> NP VP [1.0]"
        );
    }

    #[test]
    fn terminal_quoting() {
        assert_eq!(Terminal::new("don't").to_string(), "\"don't\"");
        assert_eq!(Terminal::new("\"'").to_string(), "'\"\\''");
        assert_eq!(Terminal::new("a\\b").to_string(), "'a\\\\b'");
    }

    #[test]
    fn structural_equality() {
        assert_eq!(np_vp(), np_vp());
        assert_ne!(
            np_vp(),
            Production::new(
                "S".into(),
                vec![Symbol::nonterminal("NP"), Symbol::terminal("VP")],
            )
        );
        assert!(Production::new("NN".into(), vec![Symbol::terminal("dog")]).is_lexical());
        assert!(!np_vp().is_lexical());
    }

    #[test]
    fn new_checks_probability_mass() -> Result<()> {
        let vp = Production::new("S".into(), vec![Symbol::nonterminal("VP")]);
        let g = Pcfg::new(
            "S".into(),
            vec![
                WeightedProduction::new(np_vp(), 0.666667),
                WeightedProduction::new(vp.clone(), 0.333333),
            ],
        )?;
        assert_eq!(g.len(), 2);
        assert_eq!(g.probability(&vp), Some(0.333333));
        assert_eq!(g.nonterminals(), vec![&Nonterminal::new("S")]);

        let err = Pcfg::new(
            "S".into(),
            vec![
                WeightedProduction::new(np_vp(), 0.5),
                WeightedProduction::new(vp.clone(), 0.25),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::ProbabilityMass { total, .. } if total == 0.75));

        let err = Pcfg::new("S".into(), vec![WeightedProduction::new(vp, 1.5)]).unwrap_err();
        assert!(matches!(err, Error::InvalidProbability { .. }));
        Ok(())
    }
}

use ahash::AHashMap;
use rand::{Rng, distr::weighted::WeightedIndex};
use rand_distr::Distribution;

use super::{Nonterminal, Pcfg, Symbol, WeightedProduction};
use crate::error::Error;
use crate::treebank::ParsedTree;

///Draws random trees from a [`Pcfg`], top-down from its start symbol.
#[derive(Debug, Clone)]
pub struct Sampler<'a> {
    start: &'a Nonterminal,
    expansions: AHashMap<&'a Nonterminal, (Vec<&'a WeightedProduction>, WeightedIndex<f64>)>,
    max_depth: usize,
}

impl<'a> Sampler<'a> {
    fn new(pcfg: &'a Pcfg, max_depth: usize) -> Result<Self, Error> {
        let mut grouped: AHashMap<&Nonterminal, Vec<&WeightedProduction>> = AHashMap::new();
        for rule in pcfg.productions.iter() {
            grouped.entry(rule.lhs()).or_default().push(rule);
        }
        let expansions: AHashMap<_, _> = grouped
            .into_iter()
            .map(|(lhs, rules)| {
                let dist = WeightedIndex::new(rules.iter().map(|x| x.probability()))
                    .map_err(|_| Error::NoExpansion(lhs.clone()))?;
                Ok((lhs, (rules, dist)))
            })
            .collect::<Result<_, Error>>()?;
        Ok(Sampler {
            start: &pcfg.start,
            expansions,
            max_depth,
        })
    }

    ///Samples a tree rooted in the start symbol.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ParsedTree, Error> {
        self.expand(self.start, rng, 0)
    }

    fn expand<R: Rng + ?Sized>(
        &self,
        lhs: &Nonterminal,
        rng: &mut R,
        depth: usize,
    ) -> Result<ParsedTree, Error> {
        if depth >= self.max_depth {
            return Err(Error::DepthExceeded(self.max_depth));
        }
        let (rules, dist) = self
            .expansions
            .get(lhs)
            .ok_or_else(|| Error::NoExpansion(lhs.clone()))?;
        let rule = rules[dist.sample(rng)];

        let mut children = Vec::with_capacity(rule.rhs().len());
        for symbol in rule.rhs() {
            children.push(match symbol {
                Symbol::Nonterminal(x) => self.expand(x, rng, depth + 1)?,
                Symbol::Terminal(x) => ParsedTree::Leaf(x.clone()),
            });
        }
        Ok(ParsedTree::Node {
            label: lhs.clone(),
            children,
        })
    }
}

impl Pcfg {
    ///A [`Sampler`] that gives up on derivations deeper than `max_depth`.
    pub fn sampler(&self, max_depth: usize) -> Result<Sampler<'_>, Error> {
        Sampler::new(self, max_depth)
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_depth: usize,
    ) -> Result<ParsedTree, Error> {
        self.sampler(max_depth)?.sample(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::induce_pcfg;
    use crate::treebank::collect_productions;
    use crate::treebanks::TOY_TREEBANK;
    use anyhow::Result;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn samples_trees_of_the_grammar() -> Result<()> {
        let trees = ParsedTree::parse_all(TOY_TREEBANK)?;
        let g = induce_pcfg("S".into(), collect_productions(&trees)?)?;
        let sampler = g.sampler(32)?;
        let mut rng = ChaCha8Rng::seed_from_u64(1312);
        for _ in 0..50 {
            let tree = sampler.sample(&mut rng)?;
            assert!(matches!(&tree, ParsedTree::Node { label, .. } if label.symbol() == "S"));
            assert!(!tree.leaves().is_empty());
            g.tree_log_prob(&tree)?;
        }
        Ok(())
    }

    #[test]
    fn same_seed_same_trees() -> Result<()> {
        let trees = ParsedTree::parse_all(TOY_TREEBANK)?;
        let g = induce_pcfg("S".into(), collect_productions(&trees)?)?;
        let a = g.generate(&mut ChaCha8Rng::seed_from_u64(7), 32)?;
        let b = g.generate(&mut ChaCha8Rng::seed_from_u64(7), 32)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn sampling_errors() -> Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let g = Pcfg::parse_rules("S -> S [1.0]\n", "S".into())?;
        assert!(matches!(
            g.generate(&mut rng, 10),
            Err(Error::DepthExceeded(10))
        ));

        let g = Pcfg::parse_rules("S -> NP [1.0]\n", "S".into())?;
        assert!(matches!(
            g.generate(&mut rng, 10),
            Err(Error::NoExpansion(x)) if x.symbol() == "NP"
        ));
        Ok(())
    }
}

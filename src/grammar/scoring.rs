use ahash::AHashMap;
use logprob::LogProb;

use super::{Pcfg, Production};
use crate::error::Error;
use crate::treebank::ParsedTree;

impl Pcfg {
    ///The log probability of deriving `tree` with the grammar, i.e. the sum of the log
    ///probabilities of its productions. The root need not be the start symbol.
    pub fn tree_log_prob(&self, tree: &ParsedTree) -> Result<LogProb<f64>, Error> {
        let lookup = self
            .productions
            .iter()
            .map(|x| {
                LogProb::from_raw_prob(x.probability())
                    .map(|p| (x.production(), p))
                    .map_err(|_| Error::InvalidProbability {
                        production: x.production().clone(),
                        probability: x.probability(),
                    })
            })
            .collect::<Result<AHashMap<&Production, LogProb<f64>>, Error>>()?;

        let mut log_prob: LogProb<f64> = LogProb::prob_of_one();
        for production in tree.productions() {
            match lookup.get(&production) {
                Some(p) => log_prob += *p,
                None => return Err(Error::UnknownProduction(production)),
            }
        }
        Ok(log_prob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::induce_pcfg;
    use crate::treebank::collect_productions;
    use crate::treebanks::TOY_TREEBANK;
    use anyhow::Result;
    use approx::assert_relative_eq;

    #[test]
    fn scores_trees() -> Result<()> {
        let trees = ParsedTree::parse_all(TOY_TREEBANK)?;
        let g = induce_pcfg("S".into(), collect_productions(&trees)?)?;

        //S -> VP, VP -> VB, VB -> 'run'
        let p = g.tree_log_prob(&trees[2])?;
        assert_relative_eq!(p.into_inner(), (1.0_f64 / 3.0).ln() + (1.0_f64 / 3.0).ln());

        let p = g.tree_log_prob(&ParsedTree::parse("(DT the)")?)?;
        assert_relative_eq!(p.into_inner(), (2.0_f64 / 3.0).ln());

        //A bare word is derived without any production.
        let p = g.tree_log_prob(&ParsedTree::leaf("run"))?;
        assert_eq!(p.into_inner(), 0.0);

        let unseen = ParsedTree::parse("(S (VP (VB sees)))")?;
        assert!(matches!(
            g.tree_log_prob(&unseen),
            Err(Error::UnknownProduction(x)) if x.to_string() == "VB -> 'sees'"
        ));
        Ok(())
    }
}

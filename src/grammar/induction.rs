use ahash::AHashMap;
use tracing::info;

use super::{Nonterminal, Pcfg, Production, Symbol, WeightedProduction};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    lhs: Nonterminal,
    expansions: Vec<(Vec<Symbol>, u64)>,
    index: AHashMap<Vec<Symbol>, usize>,
    total: u64,
}

impl Group {
    fn new(lhs: Nonterminal) -> Self {
        Group {
            lhs,
            expansions: vec![],
            index: AHashMap::new(),
            total: 0,
        }
    }

    fn add(&mut self, rhs: Vec<Symbol>, count: u64) {
        match self.index.get(&rhs) {
            Some(&i) => self.expansions[i].1 += count,
            None => {
                self.index.insert(rhs.clone(), self.expansions.len());
                self.expansions.push((rhs, count));
            }
        }
        self.total += count;
    }
}

///Occurrence counts of productions grouped by left-hand side.
///
///Groups are kept in the order their left-hand side was first seen, and the right-hand sides
///of a group in the order they were first seen, so that a grammar induced from the same
///productions is always written out the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionCounts {
    groups: Vec<Group>,
    index: AHashMap<Nonterminal, usize>,
}

impl ProductionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, production: Production) {
        self.add_count(production, 1);
    }

    fn add_count(&mut self, production: Production, count: u64) {
        let Production { lhs, rhs } = production;
        let i = match self.index.get(&lhs) {
            Some(&i) => i,
            None => {
                self.index.insert(lhs.clone(), self.groups.len());
                self.groups.push(Group::new(lhs));
                self.groups.len() - 1
            }
        };
        self.groups[i].add(rhs, count);
    }

    ///Adds the counts of `other` to `self`. Productions new to `self` are ordered after the
    ///existing ones, in the order `other` first saw them, so merging partitions of a corpus in
    ///partition order gives the same counts as counting the whole corpus at once.
    pub fn merge(&mut self, other: ProductionCounts) {
        for group in other.groups {
            let lhs = group.lhs;
            for (rhs, count) in group.expansions {
                self.add_count(Production::new(lhs.clone(), rhs), count);
            }
        }
    }

    ///How often `production` was observed.
    pub fn count(&self, production: &Production) -> u64 {
        self.index
            .get(production.lhs())
            .and_then(|&i| {
                let group = &self.groups[i];
                group
                    .index
                    .get(production.rhs())
                    .map(|&j| group.expansions[j].1)
            })
            .unwrap_or(0)
    }

    ///How often any production of `lhs` was observed.
    pub fn lhs_total(&self, lhs: &Nonterminal) -> u64 {
        self.index
            .get(lhs)
            .map(|&i| self.groups[i].total)
            .unwrap_or(0)
    }

    ///The number of distinct productions.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|x| x.expansions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    ///The number of observed productions, repetitions included.
    pub fn total(&self) -> u64 {
        self.groups.iter().map(|x| x.total).sum()
    }

    ///Relative frequency estimate of the grammar: each production gets its count divided by the
    ///count of its left-hand side.
    pub fn into_pcfg(self, start: Nonterminal) -> Result<Pcfg, Error> {
        let n_observations = self.total();
        let n_nonterminals = self.groups.len();
        let mut productions = Vec::with_capacity(self.len());
        for group in self.groups {
            if group.total == 0 {
                return Err(Error::EmptyGroupDivision { lhs: group.lhs });
            }
            let total = group.total as f64;
            for (rhs, count) in group.expansions {
                productions.push(WeightedProduction::new(
                    Production::new(group.lhs.clone(), rhs),
                    count as f64 / total,
                ));
            }
        }
        info!(
            n_observations,
            n_nonterminals,
            n_productions = productions.len(),
            start = %start,
            "induced grammar"
        );
        Ok(Pcfg::from_induced(start, productions))
    }
}

impl Extend<Production> for ProductionCounts {
    fn extend<I: IntoIterator<Item = Production>>(&mut self, iter: I) {
        for production in iter {
            self.add(production);
        }
    }
}

impl FromIterator<Production> for ProductionCounts {
    fn from_iter<I: IntoIterator<Item = Production>>(iter: I) -> Self {
        let mut counts = ProductionCounts::new();
        counts.extend(iter);
        counts
    }
}

///Induces a PCFG from every production observed in a treebank using relative frequencies.
///
///```
///use treebank_pcfg::grammar::{induce_pcfg, Production, Symbol};
///
///let s_np_vp = Production::new("S".into(), vec![Symbol::nonterminal("NP"), Symbol::nonterminal("VP")]);
///let s_vp = Production::new("S".into(), vec![Symbol::nonterminal("VP")]);
///let pcfg = induce_pcfg("S".into(), vec![s_np_vp.clone(), s_np_vp, s_vp]).unwrap();
///
///assert_eq!(pcfg.productions()[0].to_string(), "S -> NP VP [0.666667]");
///assert_eq!(pcfg.productions()[1].to_string(), "S -> VP [0.333333]");
///```
pub fn induce_pcfg(
    start: Nonterminal,
    productions: impl IntoIterator<Item = Production>,
) -> Result<Pcfg, Error> {
    productions
        .into_iter()
        .collect::<ProductionCounts>()
        .into_pcfg(start)
}

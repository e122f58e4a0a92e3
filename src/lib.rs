//! Induce probabilistic context-free grammars from treebanks.
//!
//! Every internal node of a parse tree is an observation of a production: its label rewritten
//! as the labels of its children. Counting those observations over a treebank and dividing the
//! count of each production by the count of its left-hand side gives the maximum likelihood
//! PCFG of the treebank.
//!
//! ```
//! use treebank_pcfg::{induce_from_corpus, ParsedTree};
//!
//! let trees = ParsedTree::parse_all(
//!     "(S (NP (PRP it)) (VP (VBZ rains)))
//!      (S (VP (VB run)))",
//! )
//! .unwrap();
//! let pcfg = induce_from_corpus("S".into(), &trees).unwrap();
//! let rules: Vec<String> = pcfg.productions().iter().map(|x| x.to_string()).collect();
//! assert_eq!(
//!     rules,
//!     [
//!         "S -> NP VP [0.5]",
//!         "S -> VP [0.5]",
//!         "NP -> PRP [1.0]",
//!         "PRP -> 'it' [1.0]",
//!         "VP -> VBZ [0.5]",
//!         "VP -> VB [0.5]",
//!         "VBZ -> 'rains' [1.0]",
//!         "VB -> 'run' [1.0]",
//!     ]
//! );
//! ```

pub mod error;
pub mod grammar;
pub mod treebank;
pub mod treebanks;

pub use error::Error;
pub use grammar::{
    Nonterminal, Pcfg, Production, RuleFormat, Symbol, Terminal, WeightedProduction, induce_pcfg,
};
pub use treebank::{Corpus, ParsedTree, TreebankCorpus, collect_productions};

///Reads every tree of `corpus` and induces a PCFG from their productions.
///
///Fails without a grammar if any tree can't be read.
pub fn induce_from_corpus<C: Corpus + ?Sized>(
    start: Nonterminal,
    corpus: &C,
) -> Result<Pcfg, Error> {
    treebank::count_productions(corpus)?.into_pcfg(start)
}

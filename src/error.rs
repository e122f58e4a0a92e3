use std::path::PathBuf;

use thiserror::Error;

use crate::grammar::{Nonterminal, Production};

///Where in a corpus a tree came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeLocation {
    ///A tree read from a file on disk.
    File(PathBuf),
    ///A tree parsed from text held in memory.
    Text,
}

impl std::fmt::Display for TreeLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeLocation::File(path) => write!(f, "{}", path.display()),
            TreeLocation::Text => write!(f, "<text>"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read corpus file {}", path.display())]
    CorpusRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tree {tree} in {location}: {message}")]
    MalformedTree {
        location: TreeLocation,
        tree: usize,
        message: String,
    },

    #[error("the productions of {lhs} have a total count of zero")]
    EmptyGroupDivision { lhs: Nonterminal },

    #[error("could not write to {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read grammar file {}", path.display())]
    GrammarRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse rule on line {line}: {message}")]
    RuleParse { line: usize, message: String },

    #[error("{production} has probability {probability}, which is not in (0, 1]")]
    InvalidProbability {
        production: Production,
        probability: f64,
    },

    #[error("the productions of {lhs} have a total probability of {total}")]
    ProbabilityMass { lhs: Nonterminal, total: f64 },

    #[error("{0} is not a production of the grammar")]
    UnknownProduction(Production),

    #[error("{0} has no productions to expand it with")]
    NoExpansion(Nonterminal),

    #[error("derivation exceeded the maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("could not serialize rules to JSON")]
    Json(#[from] serde_json::Error),
}

use std::path::{Path, PathBuf};

use itertools::Either;
use tracing::debug;

use super::{ParsedTree, parse_trees};
use crate::error::{Error, TreeLocation};
use crate::grammar::{Production, ProductionCounts};

///A source of parsed trees.
///
///Each call to [`Corpus::parsed_trees`] starts again from the first tree, so a corpus can be
///read as many times as needed.
pub trait Corpus {
    fn parsed_trees(&self) -> impl Iterator<Item = Result<ParsedTree, Error>> + '_;
}

impl Corpus for [ParsedTree] {
    fn parsed_trees(&self) -> impl Iterator<Item = Result<ParsedTree, Error>> + '_ {
        self.iter().cloned().map(Ok)
    }
}

impl Corpus for Vec<ParsedTree> {
    fn parsed_trees(&self) -> impl Iterator<Item = Result<ParsedTree, Error>> + '_ {
        self.as_slice().parsed_trees()
    }
}

///Bracketed treebank files on disk, read one file at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreebankCorpus {
    files: Vec<PathBuf>,
}

impl TreebankCorpus {
    pub fn from_files<P: Into<PathBuf>>(files: impl IntoIterator<Item = P>) -> Self {
        TreebankCorpus {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    ///Every `.mrg` file directly inside `dir`, sorted by name.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let read_error = |source: std::io::Error| Error::CorpusRead {
            path: dir.to_path_buf(),
            source,
        };
        let mut files = vec![];
        for entry in std::fs::read_dir(dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if path.is_file() && path.extension().is_some_and(|x| x == "mrg") {
                files.push(path);
            }
        }
        files.sort();
        debug!(dir = %dir.display(), n_files = files.len(), "found treebank files");
        Ok(TreebankCorpus { files })
    }

    ///Treats each directory in `paths` as in [`TreebankCorpus::from_dir`] and every other path
    ///as a single file.
    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self, Error> {
        let mut files = vec![];
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                files.extend(TreebankCorpus::from_dir(path)?.files);
            } else {
                files.push(path.to_path_buf());
            }
        }
        Ok(TreebankCorpus { files })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Corpus for TreebankCorpus {
    fn parsed_trees(&self) -> impl Iterator<Item = Result<ParsedTree, Error>> + '_ {
        self.files.iter().flat_map(|path| {
            debug!(path = %path.display(), "reading treebank file");
            let trees = std::fs::read_to_string(path)
                .map_err(|source| Error::CorpusRead {
                    path: path.clone(),
                    source,
                })
                .and_then(|text| parse_trees(&text, TreeLocation::File(path.clone())));
            match trees {
                Ok(trees) => Either::Left(trees.into_iter().map(Ok)),
                Err(e) => Either::Right(std::iter::once(Err(e))),
            }
        })
    }
}

///Every production of every tree in the corpus, in corpus order. Nothing is returned if any
///tree can't be read.
pub fn collect_productions<C: Corpus + ?Sized>(corpus: &C) -> Result<Vec<Production>, Error> {
    let mut productions = vec![];
    let mut n_trees = 0;
    for tree in corpus.parsed_trees() {
        productions.extend(tree?.productions());
        n_trees += 1;
    }
    debug!(n_trees, n_productions = productions.len(), "collected productions");
    Ok(productions)
}

///Like [`collect_productions`] but counts the productions as they are read instead of keeping
///every one of them.
pub fn count_productions<C: Corpus + ?Sized>(corpus: &C) -> Result<ProductionCounts, Error> {
    let mut counts = ProductionCounts::new();
    let mut n_trees = 0;
    for tree in corpus.parsed_trees() {
        counts.extend(tree?.productions());
        n_trees += 1;
    }
    debug!(n_trees, n_productions = counts.total(), "counted productions");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treebanks::{PTB_SAMPLE, TOY_TREEBANK};
    use anyhow::Result;

    #[test]
    fn collects_in_corpus_order() -> Result<()> {
        let trees = ParsedTree::parse_all(TOY_TREEBANK)?;
        let productions = collect_productions(&trees)?;
        let expected: Vec<Production> = trees.iter().flat_map(|x| x.productions()).collect();
        assert_eq!(productions, expected);
        assert_eq!(productions.len(), 6 + 10 + 3);

        let empty: Vec<ParsedTree> = vec![];
        assert!(collect_productions(&empty)?.is_empty());
        Ok(())
    }

    #[test]
    fn counting_matches_collecting() -> Result<()> {
        let trees = ParsedTree::parse_all(PTB_SAMPLE)?;
        let counts = count_productions(&trees)?;
        assert_eq!(counts.total(), collect_productions(&trees)?.len() as u64);
        Ok(())
    }

    #[test]
    fn reads_directory_in_name_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("wsj_0002.mrg"), PTB_SAMPLE)?;
        std::fs::write(dir.path().join("wsj_0001.mrg"), TOY_TREEBANK)?;
        std::fs::write(dir.path().join("README"), "not a treebank")?;

        let corpus = TreebankCorpus::from_dir(dir.path())?;
        assert_eq!(
            corpus.files(),
            &[dir.path().join("wsj_0001.mrg"), dir.path().join("wsj_0002.mrg")]
        );

        let trees = corpus.parsed_trees().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(trees.len(), 5);
        assert_eq!(trees[..3], ParsedTree::parse_all(TOY_TREEBANK)?[..]);

        //Reading again gives the same trees.
        let again = corpus.parsed_trees().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(trees, again);

        let corpus = TreebankCorpus::from_paths([dir.path().join("wsj_0002.mrg")])?;
        assert_eq!(corpus.parsed_trees().count(), 2);
        Ok(())
    }

    #[test]
    fn read_errors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.mrg");
        let corpus = TreebankCorpus::from_files([&missing]);
        let err = collect_productions(&corpus).unwrap_err();
        assert!(matches!(err, Error::CorpusRead { path, .. } if path == missing));

        let bad = dir.path().join("bad.mrg");
        std::fs::write(&bad, "(S (NP (DT the)) (VP (VB go)))\n(S (NP (DT the))")?;
        let corpus = TreebankCorpus::from_files([&bad]);
        let err = count_productions(&corpus).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedTree { location: TreeLocation::File(path), tree: 1, .. } if path == bad
        ));

        assert!(matches!(
            TreebankCorpus::from_dir(dir.path().join("nowhere")),
            Err(Error::CorpusRead { .. })
        ));
        Ok(())
    }
}

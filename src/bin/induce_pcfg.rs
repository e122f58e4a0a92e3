use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use rand::{SeedableRng, rngs::StdRng};
use tracing::info;
use tracing_subscriber::EnvFilter;
use treebank_pcfg::{Pcfg, RuleFormat, TreebankCorpus, induce_from_corpus};

#[derive(Debug, Parser)]
#[command(
    name = "induce-pcfg",
    version,
    about = "Induce a probabilistic context-free grammar from a bracketed treebank"
)]
struct Cli {
    ///Log debug messages (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    ///Induce a grammar from treebank files and write its rules
    Induce {
        ///`.mrg` files, or directories of them
        #[arg(required = true)]
        corpus: Vec<PathBuf>,

        ///Start symbol of the grammar
        #[arg(short, long, default_value = "S")]
        start: String,

        ///Where to write the rules
        #[arg(short, long, default_value = "ptb_pcfg_rules.txt")]
        output: PathBuf,

        ///Significant digits of each probability
        #[arg(short, long, default_value_t = 6)]
        precision: usize,

        ///Also write rules of two or more nonterminals as JSON, most probable first
        #[arg(long)]
        rules_json: Option<PathBuf>,
    },
    ///Print random sentences from a grammar written by `induce`
    Sample {
        ///Rule file to read
        rules: PathBuf,

        ///Start symbol of the grammar
        #[arg(short, long, default_value = "S")]
        start: String,

        ///Number of sentences
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        ///Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        ///Give up on derivations deeper than this
        #[arg(long, default_value_t = 64)]
        max_depth: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Induce {
            corpus,
            start,
            output,
            precision,
            rules_json,
        } => {
            let corpus = TreebankCorpus::from_paths(&corpus).context("could not find corpus")?;
            info!(n_files = corpus.files().len(), "inducing grammar");
            let pcfg = induce_from_corpus(start.as_str().into(), &corpus)
                .context("could not induce grammar")?;
            pcfg.save(&output, &RuleFormat::new(precision))?;
            if let Some(path) = rules_json {
                pcfg.save_phrasal_rules(&path)?;
            }
        }
        Command::Sample {
            rules,
            start,
            count,
            seed,
            max_depth,
        } => {
            let pcfg = Pcfg::load(&rules, start.as_str().into())?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let sampler = pcfg.sampler(max_depth)?;
            for _ in 0..count {
                let tree = sampler.sample(&mut rng).context("could not sample a sentence")?;
                println!("{}", tree.leaves().into_iter().map(|x| x.token()).join(" "));
            }
        }
    }
    Ok(())
}

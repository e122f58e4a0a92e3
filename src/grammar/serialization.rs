use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::LazyLock,
};

use chumsky::{prelude::*, text::inline_whitespace};
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Nonterminal, Pcfg, Production, Symbol, Terminal, WeightedProduction};
use crate::error::Error;

///How rules are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleFormat {
    ///Significant digits of each probability.
    pub precision: usize,
}

impl RuleFormat {
    pub fn new(precision: usize) -> Self {
        RuleFormat {
            precision: precision.max(1),
        }
    }
}

impl Default for RuleFormat {
    fn default() -> Self {
        RuleFormat { precision: 6 }
    }
}

fn trim_zeros(x: &str) -> &str {
    if x.contains('.') {
        x.trim_end_matches('0').trim_end_matches('.')
    } else {
        x
    }
}

///Writes a probability with `precision` significant digits in the style of C's `%g`: trailing
///zeros are dropped and scientific notation is used for very small values. A probability that
///rounds to one is written `1.0`.
///
///```
///use treebank_pcfg::grammar::format_probability;
///
///assert_eq!(format_probability(1.0, 6), "1.0");
///assert_eq!(format_probability(2.0 / 3.0, 6), "0.666667");
///assert_eq!(format_probability(0.25, 6), "0.25");
///assert_eq!(format_probability(1.0 / 81_000.0, 6), "1.23457e-05");
///assert_eq!(format_probability(0.99999999, 6), "1.0");
///```
pub fn format_probability(probability: f64, precision: usize) -> String {
    let formatted = format_general(probability, precision);
    if formatted == "1" {
        "1.0".to_string()
    } else {
        formatted
    }
}

fn format_general(probability: f64, precision: usize) -> String {
    if probability == 0.0 || !probability.is_finite() {
        return probability.to_string();
    }
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, probability);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    if exponent < -4 || exponent >= precision as i32 {
        format!(
            "{}e{}{:02}",
            trim_zeros(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_zeros(&format!("{:.*}", decimals, probability)).to_string()
    }
}

fn quoted<'src>(
    quote: char,
) -> impl Parser<'src, &'src str, Terminal, extra::Err<Rich<'src, char>>> + Clone {
    just(quote)
        .ignore_then(
            choice((just('\\').ignore_then(any()), none_of([quote, '\\'])))
                .repeated()
                .at_least(1)
                .collect::<String>(),
        )
        .then_ignore(just(quote))
        .map(Terminal::new)
        .labelled("terminal")
}

fn rule_parser<'src>()
-> impl Parser<'src, &'src str, WeightedProduction, extra::Err<Rich<'src, char>>> {
    //Treebank tags such as `''` and `` `` `` start with quotes, so only whitespace and the
    //opening bracket of the probability end a nonterminal. Terminals are never empty, which
    //keeps `''` from reading as a quoted empty string.
    let nonterminal = none_of(" \t\r\n[")
        .repeated()
        .at_least(1)
        .to_slice()
        .map(|x: &str| Nonterminal::new(x))
        .labelled("nonterminal");

    let symbol = choice((
        quoted('\'').map(Symbol::Terminal),
        quoted('"').map(Symbol::Terminal),
        nonterminal.clone().map(Symbol::Nonterminal),
    ));

    let probability = none_of("]")
        .repeated()
        .at_least(1)
        .to_slice()
        .try_map(|x: &str, span| {
            x.trim()
                .parse::<f64>()
                .map_err(|e| Rich::custom(span, format!("bad probability {x:?}: {e}")))
        })
        .delimited_by(just('['), just(']'))
        .labelled("probability");

    nonterminal
        .then_ignore(just("->").padded_by(inline_whitespace()))
        .then(
            symbol
                .then_ignore(inline_whitespace())
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then(probability)
        .then_ignore(inline_whitespace())
        .then_ignore(end())
        .map(|((lhs, rhs), p)| WeightedProduction::new(Production::new(lhs, rhs), p))
}

static CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?<clause>[A-Z$]+)(?:-\d+)?$").unwrap());
static SUBCLAUSES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+(?: [A-Z]+)+$").unwrap());

///A phrasal rule flattened for export, e.g. `{"clause": "S", "subclauses": "NP VP", "prob": 0.9}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub clause: String,
    pub subclauses: String,
    pub prob: f64,
}

impl Pcfg {
    ///Writes one rule per line, `LHS -> RHS [PROBABILITY]`, in grammar order.
    pub fn write_rules<W: Write>(&self, mut writer: W, format: &RuleFormat) -> std::io::Result<()> {
        for rule in self.productions.iter() {
            writeln!(
                writer,
                "{} [{}]",
                rule.production(),
                format_probability(rule.probability(), format.precision)
            )?;
        }
        Ok(())
    }

    pub fn to_rules_string(&self, format: &RuleFormat) -> String {
        let mut buffer = vec![];
        self.write_rules(&mut buffer, format)
            .expect("writing to a Vec cannot fail");
        String::from_utf8(buffer).expect("rules are written from valid UTF-8")
    }

    pub fn save(&self, path: impl AsRef<Path>, format: &RuleFormat) -> Result<(), Error> {
        let path = path.as_ref();
        let output_error = |source: std::io::Error| Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(output_error)?);
        self.write_rules(&mut writer, format).map_err(output_error)?;
        writer.flush().map_err(output_error)?;
        info!(path = %path.display(), n_productions = self.len(), "wrote grammar");
        Ok(())
    }

    ///Reads rules in the format of [`Pcfg::write_rules`]. Blank lines are skipped.
    pub fn parse_rules(text: &str, start: Nonterminal) -> Result<Self, Error> {
        let parser = rule_parser();
        let mut rules = vec![];
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let rule = parser
                .parse(line)
                .into_result()
                .map_err(|errors| Error::RuleParse {
                    line: i + 1,
                    message: errors.into_iter().map(|x| x.to_string()).join("; "),
                })?;
            rules.push(rule);
        }
        Pcfg::new(start, rules)
    }

    pub fn load(path: impl AsRef<Path>, start: Nonterminal) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::GrammarRead {
            path: path.to_path_buf(),
            source,
        })?;
        Pcfg::parse_rules(&text, start)
    }

    ///Rules that rewrite a plain phrasal category into two or more plain categories, most
    ///probable first. Plain categories are made of capital letters, such as `NP` or `VP`; a
    ///clause may also contain `$` and carry a numeric index (`NP-1`), which is dropped.
    ///Function tags (`NP-SBJ`) and punctuation tags make a rule ineligible.
    pub fn phrasal_rules(&self) -> Vec<RuleRecord> {
        let mut records: Vec<RuleRecord> = self
            .productions
            .iter()
            .filter(|x| x.rhs().len() >= 2 && x.rhs().iter().all(Symbol::is_nonterminal))
            .filter_map(|x| {
                let clause = CLAUSE.captures(x.lhs().symbol())?.name("clause")?.as_str();
                let subclauses = x.rhs().iter().join(" ");
                SUBCLAUSES.is_match(&subclauses).then(|| RuleRecord {
                    clause: clause.to_string(),
                    subclauses,
                    prob: x.probability(),
                })
            })
            .collect();
        records.sort_by(|a, b| b.prob.total_cmp(&a.prob));
        records
    }

    pub fn phrasal_rules_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.phrasal_rules())?)
    }

    pub fn save_phrasal_rules(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let json = self.phrasal_rules_json()?;
        std::fs::write(path, json).map_err(|source| Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "wrote phrasal rules");
        Ok(())
    }
}

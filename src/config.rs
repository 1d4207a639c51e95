//! Command-line configuration.

use crate::error::{EngineError, Result};
use crate::money::Money;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Options for a single CLI run.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "family-tally")]
#[command(about = "Split shared expenses between families and plan the settling transfers")]
pub struct Config {
    /// `family,size` CSV.
    pub roster_path: PathBuf,

    /// `session,item,amount,payer,split,participants` CSV.
    pub expenses_path: PathBuf,

    /// Only expenses from this session are tallied (also read from `FAMILY_TALLY_SESSION`).
    #[arg(long, env = "FAMILY_TALLY_SESSION")]
    pub session: Option<String>,

    /// Balances within this amount of zero count as settled.
    #[arg(
        long,
        default_value = "0.01",
        allow_hyphen_values = true,
        value_parser = parse_epsilon
    )]
    pub epsilon: Money,

    /// Tally as if no settlement had been recorded yet.
    #[arg(long)]
    pub exclude_settlements: bool,

    /// Print the loaded expense records after the plan.
    #[arg(long)]
    pub show_log: bool,
}

impl Config {
    /// Parses arguments, excluding the program name.
    ///
    /// `--help` and `--version` print and exit the process.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = std::iter::once("family-tally".to_string()).chain(args.into_iter().map(Into::into));
        match Config::try_parse_from(argv) {
            Ok(config) => Ok(config),
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
                ErrorKind::MissingRequiredArgument => Err(EngineError::MissingArgument),
                _ => Err(EngineError::InvalidArgument(e.to_string())),
            },
        }
    }
}

fn parse_epsilon(value: &str) -> std::result::Result<Money, String> {
    let epsilon =
        Money::from_str(value).map_err(|e| format!("invalid epsilon '{}': {}", value, e))?;
    if epsilon.is_negative() {
        return Err(format!("epsilon must not be negative, got {}", value));
    }
    Ok(epsilon)
}

//! Family Tally CLI
//!
//! Reads a family roster and an expense log, then prints every family's
//! balance followed by the transfers that settle them.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- roster.csv expenses.csv --session "Summer Trip 2025"
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use family_tally::{Config, Result, Roster, TallyEngine};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::from_args(env::args().skip(1))?;

    let roster = Roster::from_csv(BufReader::new(File::open(&config.roster_path)?))?;
    let mut engine = TallyEngine::new(roster).with_epsilon(config.epsilon);

    let expenses = BufReader::new(File::open(&config.expenses_path)?);
    engine.process_csv(expenses, config.session.as_deref())?;
    if config.exclude_settlements {
        engine.revert_settlements();
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    engine.write_balances(&mut handle)?;
    writeln!(handle)?;
    engine.write_plan(&mut handle)?;
    if config.show_log {
        writeln!(handle)?;
        engine.write_log(&mut handle)?;
    }

    Ok(())
}

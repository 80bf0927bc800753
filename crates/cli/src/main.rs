//! `cds`: integrates a constrained mechanical model and prints its
//! trajectory as CSV, followed by solver diagnostics.
//!
//! Log output goes to stderr and is controlled by `RUST_LOG`
//! (default `warn`).

mod config;
mod run;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::RunConfig;
use crate::run::{Outcome, execute};

/// Simulate a constrained multibody model and write its trajectory as CSV.
#[derive(Debug, Parser)]
#[command(name = "cds", version, about)]
struct Cli {
    /// Run configuration (TOML) with `[solver]` and `[model]` tables.
    #[arg(short, long, value_name = "PATH")]
    config: PathBuf,

    /// Write CSV rows here instead of stdout. Diagnostics stay on stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    exit_code(run_cli(&cli))
}

/// Maps a run to the process status. Setup failures are reported through the
/// log only.
fn exit_code(result: Result<Outcome>) -> ExitCode {
    match result {
        Ok(outcome) => ExitCode::from(outcome.exit_status()),
        Err(err) => {
            error!(error = %format!("{err:#}"), "setup failed");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: &Cli) -> Result<Outcome> {
    let config = RunConfig::load(&cli.config)?;

    let outcome = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not create {}", path.display()))?;
            execute(&config, BufWriter::new(file))?.0
        }
        None => execute(&config, io::stdout().lock())?.0,
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout)?;
    write!(stdout, "{}", outcome.diagnostics)?;
    stdout.flush()?;

    Ok(outcome)
}

use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing::Level;

mod commands;
mod replay;
mod scenario;

pub use commands::replay::ReplayCommand;
pub use replay::{OperatorReport, Replayer, Report, SetAllocation, StepReport};
pub use scenario::{Action, OperatorSpec, ReportTarget, Scenario, ShareSpec, Step};

#[derive(Debug, Parser)]
#[command(author, version, about = "kunlun", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(name = "replay")]
    Replay(ReplayCommand),
}

pub fn run() -> eyre::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Replay(replay) => replay.execute(),
    }
}

pub fn initialize_tracing_log() {
    let level_env = std::env::var("RUST_LOG").unwrap_or("info".to_owned());
    let level = if let Ok(level) = Level::from_str(&level_env) {
        level
    } else {
        eprint!("Invalid log level {level_env}, defaulting to info");
        Level::INFO
    };

    tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .with_target(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .init();
}

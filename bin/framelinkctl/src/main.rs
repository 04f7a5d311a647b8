//! ---
//! fl_section: "05-networking-external-interfaces"
//! fl_subsection: "binary"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Operator CLI for captured frame/host traffic."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Parser, Subcommand};

mod inspect;
mod replay;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Replay and inspect captured frame/host traffic",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Replay an inbound capture through a message service")]
    Replay(replay::ReplayOptions),
    #[command(about = "Check captured messages against the protocol vocabulary")]
    Inspect(inspect::InspectOptions),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Replay(opts) => replay::run(opts)?,
        Commands::Inspect(opts) => inspect::run(opts)?,
    }
    Ok(())
}

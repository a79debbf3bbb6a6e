//! model-sonar: diagnostics for locally-stored LLM model files
//!
//! Every failure mode here is soft: diagnostics go to stdout and the
//! process returns normally, because the tool's whole job is describing
//! files that break stricter tools.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod inspect;
mod pathcheck;

#[derive(Parser)]
#[command(name = "model-sonar", version, about = "Diagnostics for locally-stored LLM model files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect a GGUF model file's header, metadata and tensor descriptors
    Inspect(inspect::InspectArgs),
    /// Check whether a model path exists and list what is around it
    Check(pathcheck::CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect(args) => inspect::run(&args),
        Command::Check(args) => pathcheck::run(&args),
    }
}

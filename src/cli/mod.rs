// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `prepare` — aligns a corpus and saves the prepared splits
//   2. `decode`  — turns saved model scores into triples

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, DecodeArgs, PrepareArgs};

#[derive(Parser, Debug)]
#[command(
    name = "joint-nlu-data",
    version,
    about = "Prepare subword-aligned joint intent/slot data and decode model scores."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Decode(args)  => run_decode(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    tracing::info!("Preparing corpus in: {}", args.data_dir);
    let stats = PrepareUseCase::new(args.into()).execute()?;

    println!("{:<6} {:>9} {:>15} {:>8} {:>8}", "split", "examples", "subword tokens", "longest", "batches");
    for s in &stats {
        println!(
            "{:<6} {:>9} {:>15} {:>8} {:>8}",
            s.split.as_str(), s.examples, s.subword_tokens, s.longest, s.batches
        );
    }
    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    use crate::application::decode_use_case::DecodeUseCase;

    let recovered = DecodeUseCase::new(args.into()).execute()?;
    for (i, triples) in recovered.iter().enumerate() {
        let line: Vec<String> = triples.iter().map(ToString::to_string).collect();
        println!("{i}\t{}", line.join(" | "));
    }
    Ok(())
}

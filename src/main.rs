use anyhow::Result;
use clap::Parser;
use joint_nlu_data::cli::Cli;
use tracing_subscriber::{filter::Directive, EnvFilter};

fn main() -> Result<()> {
    let directive: Directive = "joint_nlu_data=info".parse()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();

    Cli::parse().run()
}

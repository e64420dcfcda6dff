use anyhow::Result;
use clap::Parser;
use privacy_migration::app::cli::{Cli, Command};
use privacy_migration::app::{headless, report};
use privacy_migration::scripted::Scenario;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => headless::run(args).await,
        Command::Phases => {
            print!("{}", report::format_phase_table());
            Ok(ExitCode::SUCCESS)
        }
        Command::Scenario => {
            print!("{}", Scenario::happy_path_yaml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

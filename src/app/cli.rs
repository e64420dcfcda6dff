use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "migrator")]
#[command(about = "Staged migration of legacy data to privacy-first storage")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MIGRATOR_GIT_SHA"), ")"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Assess, then migrate against a scripted scenario
    Run(RunArgs),
    /// Print the phase table with each phase's progress slice
    Phases,
    /// Print the default scenario YAML as a starting template
    Scenario,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Scenario file (defaults to the embedded happy path)
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// Orchestrator config (defaults to ~/.privacy-migration/migration.yaml, then built-in)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Root directory for structured logs (defaults to ~/.privacy-migration/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Skip the confirmation prompt after assessment
    #[arg(short, long)]
    pub yes: bool,

    /// Print the final summary as JSON and suppress progress lines
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "migrator",
            "run",
            "--scenario",
            "s.yaml",
            "--config",
            "c.yaml",
            "--log-dir",
            "/tmp/logs",
            "--yes",
            "--json",
        ])
        .unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.scenario, Some(PathBuf::from("s.yaml")));
        assert_eq!(args.config, Some(PathBuf::from("c.yaml")));
        assert_eq!(args.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert!(args.yes);
        assert!(args.json);
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["migrator", "run"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert!(args.scenario.is_none());
        assert!(!args.yes);
        assert!(!args.json);
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["migrator"]).is_err());
    }

    #[test]
    fn test_info_subcommands_parse() {
        assert!(matches!(
            Cli::try_parse_from(["migrator", "phases"]).unwrap().command,
            Command::Phases
        ));
        assert!(matches!(
            Cli::try_parse_from(["migrator", "scenario"]).unwrap().command,
            Command::Scenario
        ));
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Examples:
  $ alice init                     Initialize SDK
  $ alice analyze                  Analyze current directory
  $ alice analyze ./my-project     Analyze specific directory
  $ alice status                   Show configuration

Git Hook Integration:
  Add to .git/hooks/pre-commit:
  #!/bin/sh
  alice analyze --silent || exit 1";

#[derive(Parser, Debug)]
#[command(
    name = "alice",
    version,
    about = "ALICE SDK - Automated code quality analysis",
    after_help = AFTER_HELP
)]
pub struct Cli {
    #[arg(long, short, global = true, help = "Enable debug logging on stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize ALICE SDK configuration
    Init(InitArgs),
    /// Analyze code in the specified directory (default: current directory)
    Analyze(AnalyzeArgs),
    /// Show current ALICE SDK configuration
    Status,
    /// Manage ALICE SDK configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    #[arg(long, help = "Never prompt; read values from flags and environment")]
    pub non_interactive: bool,
    #[arg(long, env = "ALICE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, env = "ALICE_SERVER_URL")]
    pub server_url: Option<String>,
    #[arg(long, env = "ALICE_DEVELOPER_NAME")]
    pub name: Option<String>,
    #[arg(long, env = "ALICE_DEVELOPER_EMAIL")]
    pub email: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[arg(default_value = ".")]
    pub path: PathBuf,
    #[arg(long, short, help = "Suppress detailed output")]
    pub silent: bool,
    #[arg(
        long,
        env = "ALICE_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Upload timeout in seconds (0 disables)"
    )]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[arg(long = "set-key", value_name = "API_KEY", help = "Set API key")]
    pub set_key: Option<String>,
    #[arg(long = "set-server", value_name = "URL", help = "Set server URL")]
    pub set_server: Option<String>,
    #[arg(long, help = "Show current configuration")]
    pub show: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["alice", "analyze", "--silent"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.path, PathBuf::from("."));
                assert!(args.silent);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn config_flags_parse_together() {
        let cli = Cli::try_parse_from([
            "alice",
            "config",
            "--set-key",
            "abc123",
            "--set-server",
            "http://localhost:5000",
        ])
        .unwrap();
        match cli.command {
            Commands::Config(args) => {
                assert_eq!(args.set_key.as_deref(), Some("abc123"));
                assert_eq!(args.set_server.as_deref(), Some("http://localhost:5000"));
                assert!(!args.show);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

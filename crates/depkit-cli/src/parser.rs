//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Install and start Python and Ollama on this machine.
#[derive(Parser)]
#[command(name = "depkit")]
#[command(about = "Provision Python and the Ollama model server")]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "DEPKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directive when `RUST_LOG` is unset.
    pub const fn log_directive(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["depkit", "--verbose", "--config", "/tmp/depkit.json", "check"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/depkit.json")));
        assert_eq!(cli.log_directive(), "debug");
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from(["depkit", "provision", "--json", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Provision { json: true }));
    }

    #[test]
    fn test_install_requires_name() {
        assert!(Cli::try_parse_from(["depkit", "install"]).is_err());
        let cli = Cli::parse_from(["depkit", "install", "ollama"]);
        assert!(matches!(cli.command, Commands::Install { ref name } if name == "ollama"));
    }
}

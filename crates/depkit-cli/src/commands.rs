//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show whether each dependency is installed (and running)
    Check {
        /// Print statuses as JSON
        #[arg(long)]
        json: bool,
    },

    /// Install a single dependency
    Install {
        /// Dependency name ("python" or "ollama")
        name: String,
    },

    /// Print manual installation steps for this platform
    Instructions {
        /// Dependency name ("python" or "ollama")
        name: String,
    },

    /// Start the model server and wait until it answers
    Start,

    /// Stop the model server
    Stop,

    /// Check, install and start everything, as on application startup
    Provision {
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
}

//! Command execution port.
//!
//! This is the only true suspension point of provisioning: everything that
//! touches the operating system goes through a [`CommandExecutor`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Create output from captured streams.
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr, for parsers that do not care which stream
    /// a tool chose.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
            (false, true) => self.stdout.clone(),
            _ => self.stderr.clone(),
        }
    }
}

/// Callback receiving each line of streamed output.
///
/// Higher-ranked so implementations can pass borrowed lines of any lifetime.
pub type OnLine<'a> = &'a (dyn for<'l> Fn(&'l str) + Send + Sync);

/// Port for running external commands.
///
/// Implementations do not retry: retry policy belongs to callers.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a shell command to completion and capture its output.
    ///
    /// Fails with [`CommandError::Failed`] on a non-zero exit status.
    async fn execute(&self, command: &str) -> Result<CommandOutput, CommandError>;

    /// Run a shell command, passing each output line to `on_line` as it
    /// arrives.
    async fn execute_streaming(
        &self,
        command: &str,
        on_line: OnLine<'_>,
    ) -> Result<(), CommandError>;

    /// Whether a command is available, including known install locations
    /// outside `PATH`.
    async fn command_exists(&self, name: &str) -> bool;

    /// Absolute path of a command, when it can be resolved.
    async fn locate(&self, _name: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_output() {
        assert_eq!(CommandOutput::new("a", "").combined(), "a");
        assert_eq!(CommandOutput::new("", "b").combined(), "b");
        assert_eq!(CommandOutput::new("a", "b").combined(), "a\nb");
    }

    struct Silent;

    #[async_trait]
    impl CommandExecutor for Silent {
        async fn execute(&self, command: &str) -> Result<CommandOutput, CommandError> {
            Err(CommandError::failed(command, Some(127), "", "not found"))
        }

        async fn execute_streaming(
            &self,
            _command: &str,
            _on_line: OnLine<'_>,
        ) -> Result<(), CommandError> {
            Ok(())
        }

        async fn command_exists(&self, _name: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_locate_defaults_to_none() {
        assert_eq!(tokio_test::block_on(Silent.locate("ollama")), None);
    }

    #[tokio::test]
    async fn test_failed_execute_keeps_exit_code() {
        let err = Silent.execute("ollama --version").await.unwrap_err();
        assert_eq!(err.exit_code(), Some(127));
        assert_eq!(err.command(), "ollama --version");
    }
}

//! CLI error types and exit codes.

use depkit_core::{InstallError, SettingsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] SettingsError),

    /// An install or service operation failed.
    #[error("{0}")]
    Install(#[from] InstallError),

    /// Provisioning ended in an error state.
    #[error("Provisioning failed: {0}")]
    Provisioning(String),
}

impl CliError {
    /// Exit code following sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78,           // EX_CONFIG
            Self::Install(InstallError::UnknownDependency { .. }) => 2,
            Self::Install(_) => 1,
            Self::Provisioning(_) => 75,     // EX_TEMPFAIL
        }
    }
}

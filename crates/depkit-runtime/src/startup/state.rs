//! Startup provisioning states.

use serde::{Deserialize, Serialize};

/// Whether an error can resolve itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Another installer holds a lock; waiting and retrying should work.
    TransientLock,
    /// Needs user action, usually a manual install or start.
    Terminal,
}

/// Outcome of a batch of installs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum InstallSummary {
    AllInstalled,
    Partial {
        installed: Vec<String>,
        failed: Vec<String>,
    },
    NoneInstalled,
}

impl InstallSummary {
    /// Summarize installed and failed dependency names.
    pub fn from_results(installed: Vec<String>, failed: Vec<String>) -> Self {
        match (installed.is_empty(), failed.is_empty()) {
            (_, true) => Self::AllInstalled,
            (true, false) => Self::NoneInstalled,
            (false, false) => Self::Partial { installed, failed },
        }
    }
}

/// Actionable provisioning failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<InstallSummary>,
    /// Manual steps for terminal errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ProvisioningError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TransientLock,
            message: message.into(),
            summary: None,
            instructions: None,
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Terminal,
            message: message.into(),
            summary: None,
            instructions: None,
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: InstallSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::TransientLock
    }

    /// What the user should do next.
    pub fn guidance(&self) -> &str {
        match (self.kind, self.instructions.as_deref()) {
            (ErrorKind::TransientLock, _) => {
                "Another installer is using the package manager. Wait for it to finish, then retry."
            }
            (ErrorKind::Terminal, Some(instructions)) => instructions,
            (ErrorKind::Terminal, None) => {
                "Install the missing dependencies manually, then retry."
            }
        }
    }

    /// Label for the retry action.
    pub const fn retry_label(&self) -> &'static str {
        match self.kind {
            ErrorKind::TransientLock => "Wait and retry",
            ErrorKind::Terminal => "Retry after manual install",
        }
    }
}

impl std::fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Where startup provisioning currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ProvisioningState {
    CheckingDependencies,
    Installing { dependency: String },
    VerifyingService,
    Ready,
    Error(ProvisioningError),
}

impl ProvisioningState {
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether the flow stopped here (ready or error).
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error(_))
    }

    pub const fn error(&self) -> Option<&ProvisioningError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckingDependencies => write!(f, "Checking dependencies"),
            Self::Installing { dependency } => write!(f, "Installing {dependency}"),
            Self::VerifyingService => write!(f, "Verifying service"),
            Self::Ready => write!(f, "Ready"),
            Self::Error(e) => write!(f, "Error: {e}"),
        }
    }
}

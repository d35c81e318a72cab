//! Install progress events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage of a single install attempt.
///
/// An attempt always starts at `Checking` and ends at exactly one of
/// `Completed` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStatus {
    Checking,
    Downloading,
    Installing,
    Completed,
    Error,
}

impl InstallStatus {
    /// Whether this status ends an install attempt.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// A single event on the install progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallProgressEvent {
    /// Name of the dependency the event is about.
    pub dependency: String,
    /// Stage reached.
    pub status: InstallStatus,
    /// Human-readable description.
    pub message: String,
    /// Percentage in `0..=100`, when the stage reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Error text for `Error` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl InstallProgressEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        dependency: impl Into<String>,
        status: InstallStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            dependency: dependency.into(),
            status,
            message: message.into(),
            progress: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a percentage, clamped to 100.
    #[must_use]
    pub fn with_progress(mut self, progress: Option<u8>) -> Self {
        self.progress = progress.map(|p| p.min(100));
        self
    }

    /// Attach error text.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Intermediate progress a platform strategy reports while installing.
///
/// The orchestrator turns these into [`InstallProgressEvent`]s for the
/// dependency being installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// `Downloading` or `Installing`.
    pub status: InstallStatus,
    /// Human-readable description.
    pub message: String,
    /// Percentage, when known.
    pub progress: Option<u8>,
}

impl ProgressUpdate {
    /// A download step, optionally with a percentage.
    pub fn downloading(message: impl Into<String>, progress: Option<u8>) -> Self {
        Self {
            status: InstallStatus::Downloading,
            message: message.into(),
            progress: progress.map(|p| p.min(100)),
        }
    }

    /// An install step.
    pub fn installing(message: impl Into<String>) -> Self {
        Self {
            status: InstallStatus::Installing,
            message: message.into(),
            progress: None,
        }
    }
}

//! Dependency status and kind types.

use serde::{Deserialize, Serialize};

/// Version reported when a tool exists but its version output is unparseable.
pub const SENTINEL_VERSION: &str = "installed";

/// Role a dependency plays, used to order sequential installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// A language interpreter other installers may rely on.
    Interpreter,
    /// A binary that runs as a background service.
    Service,
}

impl DependencyKind {
    /// Install precedence. Lower values are installed first.
    ///
    /// Service install scripts may assume an interpreter is present, so
    /// interpreters always come first.
    pub const fn install_rank(self) -> u8 {
        match self {
            Self::Interpreter => 0,
            Self::Service => 1,
        }
    }
}

/// Snapshot of a dependency produced by a single check.
///
/// Statuses are never cached: installation can happen out-of-band, so every
/// check produces a fresh value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStatus {
    /// Whether the dependency was found.
    pub installed: bool,
    /// Parsed version, or [`SENTINEL_VERSION`] when unparseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Whether the service is reachable (services only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    /// Resolved path of the binary, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DependencyStatus {
    /// Status for a dependency that could not be found.
    pub const fn missing() -> Self {
        Self {
            installed: false,
            version: None,
            running: None,
            path: None,
        }
    }

    /// Status for an installed dependency with the given version.
    pub fn installed(version: impl Into<String>) -> Self {
        Self {
            installed: true,
            version: Some(version.into()),
            running: None,
            path: None,
        }
    }

    /// Set the resolved binary path.
    #[must_use]
    pub fn with_path(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    /// Set the running flag.
    #[must_use]
    pub const fn with_running(mut self, running: bool) -> Self {
        self.running = Some(running);
        self
    }

    /// Whether the version is the "exists but unparseable" sentinel.
    pub fn has_sentinel_version(&self) -> bool {
        self.version.as_deref() == Some(SENTINEL_VERSION)
    }

    /// Installed and, if a service, reachable.
    pub fn is_ready(&self) -> bool {
        self.installed && self.running.unwrap_or(true)
    }
}

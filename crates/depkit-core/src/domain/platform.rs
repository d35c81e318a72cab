//! Operating system family detection.

use serde::{Deserialize, Serialize};

/// Operating system family that selects an installation strategy.
///
/// Three families are supported. Everything else maps to
/// [`Platform::Unsupported`], which only ever produces manual instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
    Unsupported,
}

impl Platform {
    /// Detect the platform this binary was compiled for.
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Unsupported
        }
    }

    /// Human-readable name for messages and instruction headers.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::Unsupported => "this platform",
        }
    }

    /// Whether automatic installation is available at all.
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Whether the platform runs commands through a Unix shell.
    pub const fn is_unix(self) -> bool {
        matches!(self, Self::MacOs | Self::Linux)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

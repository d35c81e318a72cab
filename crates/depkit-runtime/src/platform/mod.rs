//! Platform installation strategies.
//!
//! Each strategy turns a dependency name into an ordered list of
//! [`InstallMethod`]s and hands it to [`run_install_chain`], which owns the
//! shared algorithm: package-manager bootstrap, privilege gating, output
//! forwarding and failure collection.

mod chain;
mod elevation;
mod instructions;
mod linux;
mod macos;
mod unsupported;
mod windows;

use std::sync::Arc;

use depkit_core::{CommandExecutor, InstallerFactory, Platform, PlatformInstaller};

pub use chain::{InstallPlan, parse_percent, run_install_chain};
pub use elevation::{Elevation, detect_unix_elevation, detect_windows_elevation};
pub use instructions::{generic_instructions, manual_instructions_for};
pub use linux::LinuxInstaller;
pub use macos::MacOsInstaller;
pub use unsupported::UnsupportedInstaller;
pub use windows::WindowsInstaller;

/// Dependency names the strategies know how to install.
pub const PYTHON: &str = "python";
pub const OLLAMA: &str = "ollama";

/// How an install method obtains the dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Vendor-provided install script.
    OfficialScript,
    /// A system or user package manager.
    PackageManager,
    /// Download and unpack or run an installer directly.
    DirectDownload,
}

/// One way of installing a dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallMethod {
    /// Executable that must exist for the method to be attempted.
    pub tool: &'static str,
    /// Method category.
    pub kind: MethodKind,
    /// Shell command to run.
    pub command: String,
    /// Whether the command needs elevated privileges.
    pub requires_privileges: bool,
}

impl InstallMethod {
    pub fn new(tool: &'static str, kind: MethodKind, command: impl Into<String>) -> Self {
        Self {
            tool,
            kind,
            command: command.into(),
            requires_privileges: false,
        }
    }

    /// Mark the method as needing elevated privileges.
    #[must_use]
    pub const fn privileged(mut self) -> Self {
        self.requires_privileges = true;
        self
    }

    /// Short label for progress and failure messages.
    pub fn label(&self) -> String {
        match self.kind {
            MethodKind::OfficialScript => format!("{} (official script)", self.tool),
            MethodKind::PackageManager => self.tool.to_string(),
            MethodKind::DirectDownload => "direct download".to_string(),
        }
    }
}

/// Human-readable label for a dependency name.
pub fn display_name(dependency: &str) -> &str {
    match dependency {
        PYTHON => "Python",
        OLLAMA => "Ollama",
        other => other,
    }
}

/// Select the strategy for a platform.
pub fn installer_for(
    platform: Platform,
    executor: Arc<dyn CommandExecutor>,
) -> Arc<dyn PlatformInstaller> {
    match platform {
        Platform::MacOs => Arc::new(MacOsInstaller::new(executor)),
        Platform::Windows => Arc::new(WindowsInstaller::new(executor)),
        Platform::Linux => Arc::new(LinuxInstaller::new(executor)),
        Platform::Unsupported => Arc::new(UnsupportedInstaller::new()),
    }
}

/// Factory wiring every platform to its strategy.
pub fn default_installer_factory() -> InstallerFactory {
    Arc::new(installer_for)
}

//! Process runtime and OS-level provisioning adapters for depkit.
//!
//! This crate implements the ports declared in `depkit-core`: command
//! execution through the system shell, HTTP liveness probing, per-platform
//! installation strategies and the Python / Ollama descriptors. On top of
//! them sit the progress reporter, the orchestrator and the startup state
//! machine.

pub mod bootstrap;
pub mod command;
pub mod dependencies;
pub mod health;
pub mod orchestrator;
pub mod platform;
pub mod progress;
pub mod startup;
pub mod version;

#[cfg(test)]
mod testing;

pub use bootstrap::{ProvisioningContext, build_default, build_with};
pub use command::SystemCommandExecutor;
pub use dependencies::{OllamaDependency, PythonDependency};
pub use health::HttpLivenessProbe;
pub use orchestrator::DependencyOrchestrator;
pub use platform::default_installer_factory;
pub use progress::{ProgressReporter, SubscriptionId};
pub use startup::{
    ErrorKind, InstallSummary, ProvisioningError, ProvisioningState, StartupPolicy,
    StartupProvisioner,
};

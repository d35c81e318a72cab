//! Core domain types and port definitions for depkit.
//!
//! `depkit-core` describes *what* provisioning means without touching the
//! operating system: dependency status, install progress events, the error
//! taxonomy, configuration, retry policies, and the port traits that runtime
//! adapters implement.
//!
//! # Structure
//!
//! - [`domain`] - Platforms, dependency kinds and status values
//! - [`error`] - Command and installation errors
//! - [`events`] - Install progress event stream types
//! - [`ports`] - Trait abstractions for command execution, descriptors,
//!   platform strategies and liveness probing
//! - [`policy`] - Named retry/backoff policies
//! - [`settings`] - Provisioning configuration and validation

pub mod domain;
pub mod error;
pub mod events;
pub mod policy;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{DependencyKind, DependencyStatus, Platform, SENTINEL_VERSION};
pub use error::{CommandError, InstallError};
pub use events::{InstallProgressEvent, InstallStatus, ProgressUpdate};
pub use policy::RetryPolicy;
pub use ports::{
    CommandExecutor, CommandOutput, Dependency, InstallerFactory, Installable, LivenessProbe,
    OnLine, OnProgress, PlatformInstaller, ServiceControl,
};
pub use settings::{
    DEFAULT_SERVICE_HOST, DEFAULT_SERVICE_PORT, ProvisionSettings, SettingsError,
    validate_settings,
};

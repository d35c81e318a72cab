//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that provisioning logic expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No process spawning or HTTP types in any signature
//! - Descriptors never install directly; they go through a
//!   [`PlatformInstaller`] obtained from an [`InstallerFactory`]
//! - Optional capabilities are separate traits reached through
//!   [`Dependency::as_installable`] and [`Dependency::as_service`]

pub mod command_executor;
pub mod dependency;
pub mod liveness;
pub mod platform_installer;

pub use command_executor::{CommandExecutor, CommandOutput, OnLine};
pub use dependency::{Dependency, Installable, ServiceControl};
pub use liveness::LivenessProbe;
pub use platform_installer::{InstallerFactory, OnProgress, PlatformInstaller};

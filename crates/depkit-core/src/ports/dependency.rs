//! Dependency descriptor ports.
//!
//! Every descriptor can be checked. Installing and service control are
//! optional capabilities: a descriptor exposes them by overriding
//! [`Dependency::as_installable`] / [`Dependency::as_service`], and callers
//! query the capability before invoking it.

use async_trait::async_trait;

use super::platform_installer::OnProgress;
use crate::domain::{DependencyKind, DependencyStatus, Platform};
use crate::error::InstallError;

/// A named external tool the application needs.
#[async_trait]
pub trait Dependency: Send + Sync {
    /// Stable identifier (e.g. `"ollama"`).
    fn name(&self) -> &str;

    /// Human-readable label (e.g. `"Ollama"`).
    fn display_name(&self) -> &str;

    /// Role used to order installs.
    fn kind(&self) -> DependencyKind;

    /// Detect the dependency. Never fails: problems degrade to
    /// `installed: false` or a sentinel version.
    async fn check(&self) -> DependencyStatus;

    /// Install capability, if supported.
    fn as_installable(&self) -> Option<&dyn Installable> {
        None
    }

    /// Service-control capability, if supported.
    fn as_service(&self) -> Option<&dyn ServiceControl> {
        None
    }
}

/// Capability: the dependency can be installed automatically.
#[async_trait]
pub trait Installable: Send + Sync {
    /// Install through the strategy for `platform`.
    async fn install(
        &self,
        platform: Platform,
        on_progress: OnProgress<'_>,
    ) -> Result<(), InstallError>;

    /// Manual instructions for `platform`. Never fails.
    fn manual_instructions(&self, platform: Platform) -> String;
}

/// Capability: the dependency runs as a background service.
#[async_trait]
pub trait ServiceControl: Send + Sync {
    /// Launch the service and wait until it answers its liveness probe.
    ///
    /// Returns `false` when the polling budget is exhausted.
    async fn start(&self) -> bool;

    /// Best-effort stop. May be a no-op where only the service's own GUI
    /// can stop it.
    async fn stop(&self) -> bool;

    /// Single liveness probe.
    async fn is_running(&self) -> bool;

    /// Endpoint the service is expected on.
    fn endpoint(&self) -> String;
}

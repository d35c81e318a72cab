//! Platform installation strategy port.
//!
//! One implementation exists per operating system family. Each encodes an
//! ordered list of installation methods per dependency, the manual
//! instructions shown when automation fails, and a privilege probe.

use std::sync::Arc;

use async_trait::async_trait;

use super::CommandExecutor;
use crate::domain::Platform;
use crate::error::InstallError;
use crate::events::ProgressUpdate;

/// Callback receiving intermediate install progress.
pub type OnProgress<'a> = &'a (dyn Fn(ProgressUpdate) + Send + Sync);

/// Factory selecting the installation strategy for a platform.
///
/// Injected into descriptors so platform logic stays out of dependency
/// logic and tests can substitute fakes.
pub type InstallerFactory =
    Arc<dyn Fn(Platform, Arc<dyn CommandExecutor>) -> Arc<dyn PlatformInstaller> + Send + Sync>;

/// Installation strategy for one operating system family.
#[async_trait]
pub trait PlatformInstaller: Send + Sync {
    /// Platform this strategy targets.
    fn platform(&self) -> Platform;

    /// Install the named dependency.
    ///
    /// Methods are tried in order and the first success stops the chain.
    async fn install(&self, dependency: &str, on_progress: OnProgress<'_>)
    -> Result<(), InstallError>;

    /// Plain-text manual instructions for the named dependency.
    ///
    /// Never fails and always contains at least one URL.
    fn manual_instructions(&self, dependency: &str) -> String;

    /// Whether the process holds elevated privileges.
    ///
    /// Only reports; must never prompt.
    async fn check_privileges(&self) -> bool;
}

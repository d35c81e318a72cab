//! Strategy for platforms without automatic installation.

use async_trait::async_trait;
use depkit_core::{InstallError, OnProgress, Platform, PlatformInstaller};

use super::generic_instructions;

/// Produces manual instructions only.
#[derive(Debug, Default)]
pub struct UnsupportedInstaller;

impl UnsupportedInstaller {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PlatformInstaller for UnsupportedInstaller {
    fn platform(&self) -> Platform {
        Platform::Unsupported
    }

    async fn install(
        &self,
        dependency: &str,
        _on_progress: OnProgress<'_>,
    ) -> Result<(), InstallError> {
        Err(InstallError::UnsupportedPlatform {
            dependency: dependency.to_string(),
            platform: Platform::Unsupported,
        })
    }

    fn manual_instructions(&self, dependency: &str) -> String {
        generic_instructions(Platform::Unsupported, dependency)
    }

    async fn check_privileges(&self) -> bool {
        false
    }
}

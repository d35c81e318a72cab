//! Dependency orchestrator.
//!
//! Owns the fixed set of descriptors and is the only place that reports
//! install progress: descriptors and strategies return values, the
//! orchestrator turns them into events.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use depkit_core::{
    Dependency, DependencyKind, DependencyStatus, InstallError, InstallProgressEvent, Platform,
    ProgressUpdate, SENTINEL_VERSION,
};
use futures_util::FutureExt;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::platform::generic_instructions;
use crate::progress::ProgressReporter;

/// Coordinates checks, installs and service control across descriptors.
pub struct DependencyOrchestrator {
    dependencies: Vec<Arc<dyn Dependency>>,
    platform: Platform,
    reporter: ProgressReporter,
}

impl DependencyOrchestrator {
    pub fn new(
        dependencies: Vec<Arc<dyn Dependency>>,
        platform: Platform,
        reporter: ProgressReporter,
    ) -> Self {
        Self {
            dependencies,
            platform,
            reporter,
        }
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    /// Registered names, in registration order.
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<DependencyKind> {
        self.find(name).ok().map(|d| d.kind())
    }

    /// Name of the first service-controllable dependency.
    pub fn service_dependency(&self) -> Option<String> {
        self.dependencies
            .iter()
            .find(|d| d.as_service().is_some())
            .map(|d| d.name().to_string())
    }

    fn find(&self, name: &str) -> Result<&Arc<dyn Dependency>, InstallError> {
        self.dependencies
            .iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| InstallError::unknown(name))
    }

    /// Check every dependency concurrently.
    ///
    /// A check that panics is reported as not installed.
    pub async fn check_dependencies(&self) -> BTreeMap<String, DependencyStatus> {
        let checks = self.dependencies.iter().map(|dep| async move {
            let status = AssertUnwindSafe(dep.check())
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    warn!(dependency = dep.name(), "Dependency check panicked");
                    DependencyStatus::missing()
                });
            (dep.name().to_string(), status)
        });

        join_all(checks).await.into_iter().collect()
    }

    pub async fn check_dependency(&self, name: &str) -> Result<DependencyStatus, InstallError> {
        Ok(self.find(name)?.check().await)
    }

    /// Install one dependency, reporting progress along the way.
    ///
    /// Emits `checking` first and exactly one of `completed` or `error` last.
    /// An already installed dependency never reaches its strategy.
    pub async fn install_dependency(&self, name: &str) -> Result<(), InstallError> {
        let dep = match self.find(name) {
            Ok(dep) => dep,
            Err(e) => {
                self.reporter
                    .report_checking(name, format!("Checking {name}..."));
                self.reporter
                    .report_error(name, format!("Cannot install {name}"), e.to_string());
                return Err(e);
            }
        };
        let label = dep.display_name();

        self.reporter
            .report_checking(name, format!("Checking {label}..."));
        if dep.check().await.installed {
            self.reporter
                .report_completed(name, format!("{label} is already installed"));
            return Ok(());
        }

        let result = self.install_missing(dep.as_ref()).await;
        match &result {
            Ok(version) => {
                info!(dependency = name, version = %version, "Dependency installed");
                let message = if version.is_empty() || version == SENTINEL_VERSION {
                    format!("{label} installed")
                } else {
                    format!("{label} {version} installed")
                };
                self.reporter.report_completed(name, message);
            }
            Err(e) => {
                warn!(dependency = name, "Installation failed: {}", e);
                self.reporter
                    .report_error(name, format!("Failed to install {label}"), e.to_string());
            }
        }
        result.map(|_| ())
    }

    /// Install through the descriptor and verify. Returns the detected version.
    async fn install_missing(&self, dep: &dyn Dependency) -> Result<String, InstallError> {
        let name = dep.name();
        let installable = dep
            .as_installable()
            .ok_or_else(|| InstallError::NotInstallable {
                name: name.to_string(),
            })?;

        let on_progress = |update: ProgressUpdate| {
            self.reporter.report(
                InstallProgressEvent::new(name, update.status, update.message)
                    .with_progress(update.progress),
            );
        };
        installable.install(self.platform, &on_progress).await?;

        self.reporter
            .report_installing(name, format!("Verifying {}...", dep.display_name()));
        let status = dep.check().await;
        if !status.installed {
            return Err(InstallError::VerificationFailed {
                dependency: name.to_string(),
            });
        }
        Ok(status.version.unwrap_or_default())
    }

    /// Manual instructions for this platform. Never fails.
    pub fn get_manual_instructions(&self, name: &str) -> String {
        self.find(name)
            .ok()
            .and_then(|d| d.as_installable())
            .map_or_else(
                || generic_instructions(self.platform, name),
                |installable| installable.manual_instructions(self.platform),
            )
    }

    /// Start a service dependency and wait until it is reachable.
    pub async fn start_service(&self, name: &str) -> Result<(), InstallError> {
        let dep = self.find(name)?;
        let service = dep
            .as_service()
            .ok_or_else(|| InstallError::NotServiceControllable {
                name: name.to_string(),
            })?;

        if service.start().await {
            Ok(())
        } else {
            Err(InstallError::ServiceUnreachable {
                dependency: name.to_string(),
                endpoint: service.endpoint(),
            })
        }
    }

    /// Best-effort stop. `false` for unknown or non-service dependencies.
    pub async fn stop_service(&self, name: &str) -> bool {
        match self.find(name).ok().and_then(|d| d.as_service()) {
            Some(service) => service.stop().await,
            None => false,
        }
    }

    /// Single liveness probe of a service dependency.
    pub async fn is_service_running(&self, name: &str) -> bool {
        match self.find(name).ok().and_then(|d| d.as_service()) {
            Some(service) => service.is_running().await,
            None => false,
        }
    }
}

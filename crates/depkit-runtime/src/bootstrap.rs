//! Default composition of the provisioning stack.

use std::sync::Arc;

use depkit_core::{CommandExecutor, Dependency, LivenessProbe, Platform, ProvisionSettings};

use crate::command::SystemCommandExecutor;
use crate::dependencies::{OllamaDependency, PythonDependency};
use crate::health::HttpLivenessProbe;
use crate::orchestrator::DependencyOrchestrator;
use crate::platform::default_installer_factory;
use crate::progress::ProgressReporter;
use crate::startup::{StartupPolicy, StartupProvisioner};

/// Fully wired provisioning services.
pub struct ProvisioningContext {
    pub orchestrator: Arc<DependencyOrchestrator>,
    pub provisioner: StartupProvisioner,
    pub reporter: ProgressReporter,
}

/// Build the standard Python + Ollama stack for the current platform.
pub fn build_default(settings: &ProvisionSettings) -> ProvisioningContext {
    let executor: Arc<dyn CommandExecutor> = Arc::new(SystemCommandExecutor::new());
    let probe: Arc<dyn LivenessProbe> = Arc::new(HttpLivenessProbe::from_settings(settings));
    build_with(settings, Platform::current(), executor, probe)
}

/// Build the standard stack around injected collaborators.
pub fn build_with(
    settings: &ProvisionSettings,
    platform: Platform,
    executor: Arc<dyn CommandExecutor>,
    probe: Arc<dyn LivenessProbe>,
) -> ProvisioningContext {
    let installers = default_installer_factory();
    let dependencies: Vec<Arc<dyn Dependency>> = vec![
        Arc::new(
            PythonDependency::new(executor.clone(), installers.clone()).with_platform(platform),
        ),
        Arc::new(
            OllamaDependency::new(executor, installers, probe, settings.start_policy())
                .with_platform(platform),
        ),
    ];

    let reporter = ProgressReporter::new();
    let orchestrator = Arc::new(DependencyOrchestrator::new(
        dependencies,
        platform,
        reporter.clone(),
    ));
    let provisioner =
        StartupProvisioner::new(orchestrator.clone(), StartupPolicy::from_settings(settings));

    ProvisioningContext {
        orchestrator,
        provisioner,
        reporter,
    }
}

//! Startup provisioning state machine.
//!
//! Drives the application from "nothing checked" to exactly one of
//! [`ProvisioningState::Ready`] or [`ProvisioningState::Error`]. It is the
//! only component that classifies failures.

mod classify;
mod state;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use depkit_core::{DependencyStatus, InstallError, ProvisionSettings, RetryPolicy};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::orchestrator::DependencyOrchestrator;

pub use classify::{LOCK_PATTERNS, classify_failure, is_lock_contention};
pub use state::{ErrorKind, InstallSummary, ProvisioningError, ProvisioningState};

/// Timing and classification inputs of the state machine.
#[derive(Debug, Clone)]
pub struct StartupPolicy {
    /// Settling delay between sequential installs.
    pub inter_install_delay: Duration,
    /// Post-start liveness verification.
    pub probe_retry: RetryPolicy,
    /// Additional lock-contention patterns.
    pub extra_lock_patterns: Vec<String>,
}

impl StartupPolicy {
    pub fn from_settings(settings: &ProvisionSettings) -> Self {
        Self {
            inter_install_delay: settings.inter_install_delay(),
            probe_retry: settings.probe_retry_policy(),
            extra_lock_patterns: settings.extra_lock_patterns.clone(),
        }
    }
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self::from_settings(&ProvisionSettings::default())
    }
}

/// Provisions dependencies at application startup.
///
/// Consumers follow progress through [`subscribe_state`](Self::subscribe_state).
pub struct StartupProvisioner {
    orchestrator: Arc<DependencyOrchestrator>,
    policy: StartupPolicy,
    state: watch::Sender<ProvisioningState>,
    lock_detected: AtomicBool,
    errored: AtomicBool,
    auto_install_suppressed: AtomicBool,
}

impl StartupProvisioner {
    pub fn new(orchestrator: Arc<DependencyOrchestrator>, policy: StartupPolicy) -> Self {
        let (state, _) = watch::channel(ProvisioningState::CheckingDependencies);
        Self {
            orchestrator,
            policy,
            state,
            lock_detected: AtomicBool::new(false),
            errored: AtomicBool::new(false),
            auto_install_suppressed: AtomicBool::new(false),
        }
    }

    /// Receiver observing every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<ProvisioningState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> ProvisioningState {
        self.state.borrow().clone()
    }

    pub fn is_auto_install_suppressed(&self) -> bool {
        self.auto_install_suppressed.load(Ordering::SeqCst)
    }

    pub fn has_lock_error(&self) -> bool {
        self.lock_detected.load(Ordering::SeqCst)
    }

    pub fn has_error(&self) -> bool {
        self.errored.load(Ordering::SeqCst)
    }

    /// Automatic provisioning at startup.
    ///
    /// Does not install anything while automatic installation is suppressed
    /// after a lock conflict.
    pub async fn run(&self) -> ProvisioningState {
        self.provision(false).await
    }

    /// Explicit retry by the user.
    ///
    /// Clears the lock and error flags and installs even while automatic
    /// installation is suppressed. The suppression itself stays in place.
    pub async fn retry(&self) -> ProvisioningState {
        self.lock_detected.store(false, Ordering::SeqCst);
        self.errored.store(false, Ordering::SeqCst);
        self.provision(true).await
    }

    async fn provision(&self, explicit: bool) -> ProvisioningState {
        self.set_state(ProvisioningState::CheckingDependencies);

        let statuses = self.orchestrator.check_dependencies().await;
        let service = self.orchestrator.service_dependency();
        let missing = self.missing_in_install_order(&statuses);

        if missing.is_empty() {
            let service_running = service
                .as_ref()
                .and_then(|name| statuses.get(name))
                .is_none_or(|status| status.running == Some(true));
            return match service {
                Some(name) if !service_running => self.verify_service(&name).await,
                _ => self.set_state(ProvisioningState::Ready),
            };
        }

        if !explicit && self.is_auto_install_suppressed() {
            info!(missing = ?missing, "Automatic installation is paused");
            return self.fail(ProvisioningError::transient(format!(
                "Automatic installation is paused after a lock conflict. Missing: {}. \
                 Retry once the other installer has finished.",
                missing.join(", ")
            )));
        }

        let mut installed = Vec::new();
        let mut failures: Vec<(String, InstallError)> = Vec::new();
        for (index, name) in missing.iter().enumerate() {
            if index > 0 {
                sleep(self.policy.inter_install_delay).await;
            }
            self.set_state(ProvisioningState::Installing {
                dependency: name.clone(),
            });
            match self.orchestrator.install_dependency(name).await {
                Ok(()) => installed.push(name.clone()),
                Err(e) => failures.push((name.clone(), self.classify(name, e))),
            }
        }

        if !failures.is_empty() {
            let failed = failures.iter().map(|(name, _)| name.clone()).collect();
            let summary = InstallSummary::from_results(installed, failed);
            return self.fail_installs(&failures, summary);
        }

        match service {
            Some(name) => self.verify_service(&name).await,
            None => self.set_state(ProvisioningState::Ready),
        }
    }

    /// Names of missing dependencies, interpreters before services.
    fn missing_in_install_order(
        &self,
        statuses: &BTreeMap<String, DependencyStatus>,
    ) -> Vec<String> {
        let mut missing: Vec<String> = self
            .orchestrator
            .dependency_names()
            .into_iter()
            .filter(|name| !statuses.get(name).is_some_and(|s| s.installed))
            .collect();
        missing.sort_by_key(|name| {
            self.orchestrator
                .kind_of(name)
                .map_or(u8::MAX, |kind| kind.install_rank())
        });
        missing
    }

    /// Re-tag an install failure as lock contention when its text says so.
    fn classify(&self, dependency: &str, error: InstallError) -> InstallError {
        if let InstallError::TransientLockContention { .. } = error {
            return error;
        }
        let message = error.to_string();
        match classify_failure(&message, &self.policy.extra_lock_patterns) {
            ErrorKind::TransientLock => InstallError::TransientLockContention {
                dependency: dependency.to_string(),
                message,
            },
            ErrorKind::Terminal => error,
        }
    }

    fn fail_installs(
        &self,
        failures: &[(String, InstallError)],
        summary: InstallSummary,
    ) -> ProvisioningState {
        let message = failures
            .iter()
            .map(|(name, error)| format!("{name}: {error}"))
            .collect::<Vec<_>>()
            .join("\n");

        let locked = failures
            .iter()
            .any(|(_, error)| matches!(error, InstallError::TransientLockContention { .. }));

        if locked {
            warn!("Installation blocked by another process");
            self.lock_detected.store(true, Ordering::SeqCst);
            self.auto_install_suppressed.store(true, Ordering::SeqCst);
            return self.fail(ProvisioningError::transient(message).with_summary(summary));
        }

        let instructions = failures
            .iter()
            .map(|(name, _)| self.orchestrator.get_manual_instructions(name))
            .collect::<Vec<_>>()
            .join("\n");
        self.fail(
            ProvisioningError::terminal(message)
                .with_summary(summary)
                .with_instructions(instructions),
        )
    }

    /// Start the service and confirm it answers, probing once more after
    /// the retry delay.
    async fn verify_service(&self, name: &str) -> ProvisioningState {
        self.set_state(ProvisioningState::VerifyingService);

        if let Err(e) = self.orchestrator.start_service(name).await {
            debug!(service = name, "Service start did not confirm liveness: {}", e);
        }

        let policy = self.policy.probe_retry;
        let mut attempt = 1;
        loop {
            if self.orchestrator.is_service_running(name).await {
                return self.set_state(ProvisioningState::Ready);
            }
            if !policy.allows_retry_after(attempt) {
                break;
            }
            attempt += 1;
            sleep(policy.delay).await;
        }

        let instructions = format!(
            "Start {name} manually (for example `{name} serve`), then retry.\n\n{}",
            self.orchestrator.get_manual_instructions(name)
        );
        self.fail(
            ProvisioningError::terminal(format!("{name} is installed but is not responding"))
                .with_instructions(instructions),
        )
    }

    fn fail(&self, error: ProvisioningError) -> ProvisioningState {
        self.errored.store(true, Ordering::SeqCst);
        self.set_state(ProvisioningState::Error(error))
    }

    fn set_state(&self, state: ProvisioningState) -> ProvisioningState {
        info!(state = %state, "Provisioning state changed");
        self.state.send_replace(state.clone());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressReporter;
    use async_trait::async_trait;
    use depkit_core::{
        Dependency, DependencyKind, InstallError, Installable, OnProgress, Platform,
        ServiceControl,
    };
    use std::sync::Mutex;

    struct Scripted {
        name: &'static str,
        kind: DependencyKind,
        installed: AtomicBool,
        install_result: Mutex<Vec<Result<(), String>>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn new(name: &'static str, kind: DependencyKind, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                kind,
                installed: AtomicBool::new(false),
                install_result: Mutex::new(Vec::new()),
                log: log.clone(),
            }
        }

        fn failing(self, message: &str) -> Self {
            self.install_result
                .lock()
                .unwrap()
                .push(Err(message.to_string()));
            self
        }
    }

    #[async_trait]
    impl Dependency for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        fn display_name(&self) -> &str {
            self.name
        }
        fn kind(&self) -> DependencyKind {
            self.kind
        }
        async fn check(&self) -> DependencyStatus {
            let status = if self.installed.load(Ordering::SeqCst) {
                DependencyStatus::installed("1.0.0")
            } else {
                DependencyStatus::missing()
            };
            if self.kind == DependencyKind::Service {
                status.with_running(true)
            } else {
                status
            }
        }
        fn as_installable(&self) -> Option<&dyn Installable> {
            Some(self)
        }
        fn as_service(&self) -> Option<&dyn ServiceControl> {
            (self.kind == DependencyKind::Service).then_some(self as &dyn ServiceControl)
        }
    }

    #[async_trait]
    impl Installable for Scripted {
        async fn install(&self, _: Platform, _: OnProgress<'_>) -> Result<(), InstallError> {
            self.log.lock().unwrap().push(format!("install:{}", self.name));
            let scripted = self.install_result.lock().unwrap().pop();
            match scripted {
                Some(Err(message)) => Err(InstallError::MethodsExhausted {
                    dependency: self.name.to_string(),
                    failures: vec![message],
                }),
                _ => {
                    self.installed.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }
        }
        fn manual_instructions(&self, _: Platform) -> String {
            format!("https://example.invalid/{}", self.name)
        }
    }

    #[async_trait]
    impl ServiceControl for Scripted {
        async fn start(&self) -> bool {
            true
        }
        async fn stop(&self) -> bool {
            true
        }
        async fn is_running(&self) -> bool {
            true
        }
        fn endpoint(&self) -> String {
            "http://127.0.0.1:11434/api/tags".to_string()
        }
    }

    fn fast_policy() -> StartupPolicy {
        StartupPolicy {
            inter_install_delay: Duration::from_millis(1),
            probe_retry: RetryPolicy::new(2, Duration::from_millis(1)),
            extra_lock_patterns: Vec::new(),
        }
    }

    fn provisioner(deps: Vec<Arc<dyn Dependency>>) -> StartupProvisioner {
        let orchestrator =
            DependencyOrchestrator::new(deps, Platform::Linux, ProgressReporter::new());
        StartupProvisioner::new(Arc::new(orchestrator), fast_policy())
    }

    #[tokio::test]
    async fn test_interpreter_installed_before_service() {
        let log = Arc::new(Mutex::new(Vec::new()));
        // Registered service-first to prove ordering is by kind.
        let ollama = Scripted::new("ollama", DependencyKind::Service, &log);
        let python = Scripted::new("python", DependencyKind::Interpreter, &log);
        let machine = provisioner(vec![Arc::new(ollama) as Arc<dyn Dependency>, Arc::new(python)]);

        assert_eq!(machine.run().await, ProvisioningState::Ready);
        assert_eq!(*log.lock().unwrap(), vec!["install:python", "install:ollama"]);
    }

    #[tokio::test]
    async fn test_partial_failure_is_terminal_with_summary() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let python = Scripted::new("python", DependencyKind::Interpreter, &log);
        let ollama =
            Scripted::new("ollama", DependencyKind::Service, &log).failing("disk full");
        let machine = provisioner(vec![Arc::new(python) as Arc<dyn Dependency>, Arc::new(ollama)]);

        let state = machine.run().await;
        let error = state.error().unwrap();
        assert_eq!(error.kind, ErrorKind::Terminal);
        assert_eq!(
            error.summary,
            Some(InstallSummary::Partial {
                installed: vec!["python".to_string()],
                failed: vec!["ollama".to_string()],
            })
        );
        assert!(error.instructions.as_deref().unwrap().contains("https://"));
        assert!(!machine.is_auto_install_suppressed());
    }

    #[tokio::test]
    async fn test_lock_suppresses_auto_install_until_retry() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ollama = Scripted::new("ollama", DependencyKind::Service, &log)
            .failing("Error: has already locked Cellar/ollama");
        let machine = provisioner(vec![Arc::new(ollama) as Arc<dyn Dependency>]);

        let state = machine.run().await;
        assert!(state.error().unwrap().is_transient());
        assert!(machine.has_lock_error());
        assert!(machine.is_auto_install_suppressed());

        // Automatic runs do not install while suppressed.
        let state = machine.run().await;
        assert!(state.error().unwrap().message.contains("paused"));
        assert_eq!(log.lock().unwrap().len(), 1);

        // An explicit retry installs and keeps the suppression flag.
        assert_eq!(machine.retry().await, ProvisioningState::Ready);
        assert_eq!(log.lock().unwrap().len(), 2);
        assert!(!machine.has_lock_error());
        assert!(machine.is_auto_install_suppressed());
    }

    #[tokio::test]
    async fn test_lock_failure_is_tagged_as_contention() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let python = Scripted::new("python", DependencyKind::Interpreter, &log)
            .failing("E: Could not get lock /var/lib/dpkg/lock-frontend");
        let machine = provisioner(vec![Arc::new(python) as Arc<dyn Dependency>]);

        let state = machine.run().await;
        let error = state.error().unwrap();
        assert_eq!(error.kind, ErrorKind::TransientLock);
        assert!(error.message.contains("python is blocked by another process"));
        assert!(error.instructions.is_none());
    }

    #[test]
    fn test_classify_uses_extra_patterns() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let python = Scripted::new("python", DependencyKind::Interpreter, &log);
        let orchestrator = DependencyOrchestrator::new(
            vec![Arc::new(python) as Arc<dyn Dependency>],
            Platform::Linux,
            ProgressReporter::new(),
        );
        let policy = StartupPolicy {
            extra_lock_patterns: vec!["resource busy".to_string()],
            ..fast_policy()
        };
        let machine = StartupProvisioner::new(Arc::new(orchestrator), policy);

        let busy = InstallError::MethodsExhausted {
            dependency: "python".to_string(),
            failures: vec!["zypper: Resource busy".to_string()],
        };
        assert!(matches!(
            machine.classify("python", busy),
            InstallError::TransientLockContention { .. }
        ));

        let full = InstallError::MethodsExhausted {
            dependency: "python".to_string(),
            failures: vec!["zypper: disk full".to_string()],
        };
        assert!(matches!(
            machine.classify("python", full),
            InstallError::MethodsExhausted { .. }
        ));
    }

    #[tokio::test]
    async fn test_state_channel_sees_transitions() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let python = Scripted::new("python", DependencyKind::Interpreter, &log);
        let machine = provisioner(vec![Arc::new(python) as Arc<dyn Dependency>]);
        let mut rx = machine.subscribe_state();

        machine.run().await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ProvisioningState::Ready);
        assert_eq!(machine.state(), ProvisioningState::Ready);
    }
}

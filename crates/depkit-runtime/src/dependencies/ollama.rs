//! Ollama model-serving descriptor.
//!
//! Ollama is both installable and a background service: `start` launches the
//! platform's usual host process and then polls the liveness probe.

use std::sync::Arc;

use async_trait::async_trait;
use depkit_core::{
    CommandExecutor, Dependency, DependencyKind, DependencyStatus, InstallError, Installable,
    InstallerFactory, LivenessProbe, OnProgress, Platform, RetryPolicy, SENTINEL_VERSION,
    ServiceControl,
};
use tracing::{debug, info, warn};

use super::probe::{VersionQuery, probe_version};
use crate::health::wait_until_live;
use crate::platform::{Elevation, OLLAMA, detect_unix_elevation};

const QUERIES: &[VersionQuery] = &[
    VersionQuery::new("ollama", "ollama --version"),
    VersionQuery::new("ollama", "ollama -v"),
    VersionQuery::new("ollama", "ollama version"),
];

const UNIX_SERVE_DETACHED: &str = "nohup ollama serve >/dev/null 2>&1 &";
const WINDOWS_SERVE_DETACHED: &str = "Start-Process -FilePath ollama -ArgumentList serve -WindowStyle Hidden";
const WINDOWS_DESKTOP_APP: &str =
    r"Start-Process -FilePath (Join-Path $env:LOCALAPPDATA 'Programs\Ollama\ollama app.exe')";

/// The Ollama binary and the service it runs.
pub struct OllamaDependency {
    executor: Arc<dyn CommandExecutor>,
    installers: InstallerFactory,
    probe: Arc<dyn LivenessProbe>,
    start_policy: RetryPolicy,
    platform: Platform,
}

impl OllamaDependency {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        installers: InstallerFactory,
        probe: Arc<dyn LivenessProbe>,
        start_policy: RetryPolicy,
    ) -> Self {
        Self {
            executor,
            installers,
            probe,
            start_policy,
            platform: Platform::current(),
        }
    }

    /// Use another platform's launch and stop commands.
    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Command launching the platform's usual host process, if any.
    async fn launch_command(&self) -> Option<String> {
        match self.platform {
            Platform::MacOs => Some("open -a Ollama".to_string()),
            Platform::Windows => Some(WINDOWS_DESKTOP_APP.to_string()),
            Platform::Linux => match detect_unix_elevation(self.executor.as_ref()).await {
                Elevation::None => None,
                elevation => Some(elevation.wrap("systemctl start ollama")),
            },
            Platform::Unsupported => None,
        }
    }

    fn serve_detached(&self) -> &'static str {
        if self.platform == Platform::Windows {
            WINDOWS_SERVE_DETACHED
        } else {
            UNIX_SERVE_DETACHED
        }
    }

    async fn launch(&self) -> bool {
        if let Some(command) = self.launch_command().await {
            match self.executor.execute(&command).await {
                Ok(_) => return true,
                Err(e) => debug!("Launching Ollama with `{}` failed: {}", command, e),
            }
        }

        match self.executor.execute(self.serve_detached()).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to run `ollama serve`: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Dependency for OllamaDependency {
    fn name(&self) -> &str {
        OLLAMA
    }

    fn display_name(&self) -> &str {
        "Ollama"
    }

    fn kind(&self) -> DependencyKind {
        DependencyKind::Service
    }

    async fn check(&self) -> DependencyStatus {
        let status = probe_version(self.executor.as_ref(), OLLAMA, QUERIES, |_| true).await;
        let running = self.probe.probe().await;

        // A reachable service counts as installed even when the binary is
        // not on PATH (app bundles, tray installs).
        if !status.installed && running {
            return DependencyStatus::installed(SENTINEL_VERSION).with_running(true);
        }
        status.with_running(running)
    }

    fn as_installable(&self) -> Option<&dyn Installable> {
        Some(self)
    }

    fn as_service(&self) -> Option<&dyn ServiceControl> {
        Some(self)
    }
}

#[async_trait]
impl Installable for OllamaDependency {
    async fn install(
        &self,
        platform: Platform,
        on_progress: OnProgress<'_>,
    ) -> Result<(), InstallError> {
        (self.installers)(platform, self.executor.clone())
            .install(OLLAMA, on_progress)
            .await
    }

    fn manual_instructions(&self, platform: Platform) -> String {
        (self.installers)(platform, self.executor.clone()).manual_instructions(OLLAMA)
    }
}

#[async_trait]
impl ServiceControl for OllamaDependency {
    async fn start(&self) -> bool {
        if self.probe.probe().await {
            debug!("Ollama is already running");
            return true;
        }

        if !self.launch().await {
            return false;
        }

        let live = wait_until_live(self.probe.as_ref(), self.start_policy).await;
        if live {
            info!(endpoint = %self.probe.endpoint(), "Ollama is running");
        } else {
            warn!(
                endpoint = %self.probe.endpoint(),
                attempts = self.start_policy.attempts,
                "Ollama did not become reachable"
            );
        }
        live
    }

    async fn stop(&self) -> bool {
        match self.platform {
            Platform::MacOs => self
                .executor
                .execute(r#"osascript -e 'tell application "Ollama" to quit'"#)
                .await
                .is_ok(),
            Platform::Linux => {
                let elevation = detect_unix_elevation(self.executor.as_ref()).await;
                let stopped_unit = elevation.is_held()
                    && self
                        .executor
                        .execute(&elevation.wrap("systemctl stop ollama"))
                        .await
                        .is_ok();
                let killed = self.executor.execute("pkill -f 'ollama serve'").await.is_ok();
                stopped_unit || killed
            }
            Platform::Windows | Platform::Unsupported => {
                debug!("Stopping Ollama is left to its tray app");
                false
            }
        }
    }

    async fn is_running(&self) -> bool {
        self.probe.probe().await
    }

    fn endpoint(&self) -> String {
        self.probe.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::default_installer_factory;
    use crate::testing::FakeExecutor;
    use mockall::{Sequence, mock};
    use std::time::Duration;

    mock! {
        Probe {}
        #[async_trait]
        impl LivenessProbe for Probe {
            async fn probe(&self) -> bool;
            fn endpoint(&self) -> String;
        }
    }

    fn ollama(executor: Arc<FakeExecutor>, probe: MockProbe, platform: Platform) -> OllamaDependency {
        OllamaDependency::new(
            executor,
            default_installer_factory(),
            Arc::new(probe),
            RetryPolicy::new(3, Duration::from_millis(1)),
        )
        .with_platform(platform)
    }

    fn probe_answering(results: &[bool]) -> MockProbe {
        let mut probe = MockProbe::new();
        let mut seq = Sequence::new();
        for &result in results {
            probe
                .expect_probe()
                .times(1)
                .in_sequence(&mut seq)
                .return_const(result);
        }
        probe
            .expect_endpoint()
            .return_const("http://127.0.0.1:11434/api/tags".to_string());
        probe
    }

    #[tokio::test]
    async fn test_check_reports_running() {
        let executor = Arc::new(
            FakeExecutor::new()
                .with_tool("ollama")
                .on("ollama --version", "ollama version 0.1.17"),
        );
        let dep = ollama(executor, probe_answering(&[true]), Platform::Linux);

        let status = dep.check().await;
        assert_eq!(status.version.as_deref(), Some("0.1.17"));
        assert_eq!(status.running, Some(true));
        assert!(status.is_ready());
    }

    #[tokio::test]
    async fn test_check_reachable_without_binary() {
        let dep = ollama(
            Arc::new(FakeExecutor::new()),
            probe_answering(&[true]),
            Platform::MacOs,
        );
        let status = dep.check().await;
        assert!(status.installed);
        assert!(status.has_sentinel_version());
    }

    #[tokio::test]
    async fn test_start_when_already_running() {
        let executor = Arc::new(FakeExecutor::new());
        let dep = ollama(executor.clone(), probe_answering(&[true]), Platform::MacOs);
        assert!(dep.start().await);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_start_launches_app_and_polls() {
        let executor = Arc::new(FakeExecutor::new().on("open -a Ollama", ""));
        let dep = ollama(
            executor.clone(),
            probe_answering(&[false, false, true]),
            Platform::MacOs,
        );
        assert!(dep.start().await);
        assert!(executor.ran("open -a Ollama"));
        assert!(!executor.ran("ollama serve"));
    }

    #[tokio::test]
    async fn test_start_falls_back_to_serve() {
        let executor = Arc::new(
            FakeExecutor::new()
                .on("id -u", "0")
                .fail("systemctl start ollama", "Unit ollama.service not found.")
                .on("ollama serve", ""),
        );
        let dep = ollama(executor.clone(), probe_answering(&[false, true]), Platform::Linux);
        assert!(dep.start().await);
        assert!(executor.ran("nohup ollama serve"));
    }

    #[tokio::test]
    async fn test_start_gives_up_after_budget() {
        let executor = Arc::new(FakeExecutor::new().on("open -a Ollama", ""));
        let dep = ollama(
            executor,
            probe_answering(&[false, false, false, false]),
            Platform::MacOs,
        );
        assert!(!dep.start().await);
    }

    #[tokio::test]
    async fn test_stop_is_noop_on_windows() {
        let executor = Arc::new(FakeExecutor::new());
        let dep = ollama(executor.clone(), MockProbe::new(), Platform::Windows);
        assert!(!dep.stop().await);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_on_linux_kills_serve() {
        let executor = Arc::new(FakeExecutor::new().on("pkill", ""));
        let dep = ollama(executor.clone(), MockProbe::new(), Platform::Linux);
        assert!(dep.stop().await);
        assert!(!executor.ran("systemctl stop"));
    }

    #[test]
    fn test_capabilities() {
        let dep = ollama(
            Arc::new(FakeExecutor::new()),
            MockProbe::new(),
            Platform::Linux,
        );
        assert_eq!(dep.kind(), DependencyKind::Service);
        assert!(dep.as_installable().is_some());
        assert!(dep.as_service().is_some());
    }
}

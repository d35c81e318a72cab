//! macOS installation strategy: Homebrew, MacPorts, then direct downloads.

use std::sync::Arc;

use async_trait::async_trait;
use depkit_core::{CommandExecutor, InstallError, OnProgress, Platform, PlatformInstaller};

use super::{
    Elevation, InstallMethod, InstallPlan, MethodKind, OLLAMA, PYTHON, detect_unix_elevation,
    manual_instructions_for, run_install_chain,
};

const PYTHON_PKG_URL: &str =
    "https://www.python.org/ftp/python/3.12.8/python-3.12.8-macos11.pkg";
const OLLAMA_ZIP_URL: &str = "https://ollama.com/download/Ollama-darwin.zip";
const HOMEBREW_INSTALL: &str = r#"NONINTERACTIVE=1 /bin/bash -c "$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)""#;

pub struct MacOsInstaller {
    executor: Arc<dyn CommandExecutor>,
}

impl MacOsInstaller {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    fn plan(dependency: &str, elevation: Elevation) -> Option<InstallPlan> {
        let methods = match dependency {
            PYTHON => vec![
                InstallMethod::new("brew", MethodKind::PackageManager, "brew install python@3.12"),
                InstallMethod::new(
                    "port",
                    MethodKind::PackageManager,
                    elevation.wrap("port -N install python312"),
                )
                .privileged(),
                InstallMethod::new(
                    "curl",
                    MethodKind::DirectDownload,
                    format!(
                        "curl -fL --progress-bar -o /tmp/python-installer.pkg {PYTHON_PKG_URL} && {}",
                        elevation.wrap("installer -pkg /tmp/python-installer.pkg -target /")
                    ),
                )
                .privileged(),
            ],
            OLLAMA => vec![
                InstallMethod::new("brew", MethodKind::PackageManager, "brew install ollama"),
                InstallMethod::new(
                    "port",
                    MethodKind::PackageManager,
                    elevation.wrap("port -N install ollama"),
                )
                .privileged(),
                InstallMethod::new(
                    "curl",
                    MethodKind::DirectDownload,
                    format!(
                        "mkdir -p \"$HOME/Applications\" && \
                         curl -fL --progress-bar -o /tmp/Ollama-darwin.zip {OLLAMA_ZIP_URL} && \
                         ditto -x -k /tmp/Ollama-darwin.zip \"$HOME/Applications\" && \
                         rm -f /tmp/Ollama-darwin.zip"
                    ),
                ),
            ],
            _ => return None,
        };

        Some(InstallPlan {
            platform: Platform::MacOs,
            dependency: dependency.to_string(),
            methods,
            bootstrap: vec![
                InstallMethod::new("brew", MethodKind::PackageManager, HOMEBREW_INSTALL)
                    .privileged(),
            ],
        })
    }
}

#[async_trait]
impl PlatformInstaller for MacOsInstaller {
    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    async fn install(
        &self,
        dependency: &str,
        on_progress: OnProgress<'_>,
    ) -> Result<(), InstallError> {
        let elevation = detect_unix_elevation(self.executor.as_ref()).await;
        let plan =
            Self::plan(dependency, elevation).ok_or_else(|| InstallError::unknown(dependency))?;
        run_install_chain(self.executor.as_ref(), &plan, elevation, on_progress).await
    }

    fn manual_instructions(&self, dependency: &str) -> String {
        manual_instructions_for(Platform::MacOs, dependency)
    }

    async fn check_privileges(&self) -> bool {
        detect_unix_elevation(self.executor.as_ref()).await.is_held()
    }
}

//! Linux installation strategy.
//!
//! Python comes from the distribution package manager, with Homebrew as the
//! unprivileged fallback. Ollama prefers the vendor script, then pacman,
//! Homebrew, and finally the release tarball unpacked into `~/.local`.

use std::sync::Arc;

use async_trait::async_trait;
use depkit_core::{CommandExecutor, InstallError, OnProgress, Platform, PlatformInstaller};

use super::{
    Elevation, InstallMethod, InstallPlan, MethodKind, OLLAMA, PYTHON, detect_unix_elevation,
    manual_instructions_for, run_install_chain,
};

const OLLAMA_INSTALL_SCRIPT: &str = "curl -fsSL https://ollama.com/install.sh | sh";
const OLLAMA_TARBALL: &str = r#"ARCH=$(uname -m | sed 's/x86_64/amd64/;s/aarch64/arm64/') && mkdir -p "$HOME/.local" && curl -fL --progress-bar "https://ollama.com/download/ollama-linux-${ARCH}.tgz" | tar -xzf - -C "$HOME/.local""#;

pub struct LinuxInstaller {
    executor: Arc<dyn CommandExecutor>,
}

impl LinuxInstaller {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    fn plan(dependency: &str, elevation: Elevation) -> Option<InstallPlan> {
        let system = |tool: &'static str, command: &str| {
            InstallMethod::new(tool, MethodKind::PackageManager, elevation.wrap(command))
                .privileged()
        };

        let methods = match dependency {
            PYTHON => vec![
                system(
                    "apt-get",
                    "DEBIAN_FRONTEND=noninteractive apt-get install -y python3 python3-pip python3-venv",
                ),
                system("dnf", "dnf install -y python3 python3-pip"),
                system("pacman", "pacman -S --noconfirm --needed python python-pip"),
                system("zypper", "zypper --non-interactive install python3 python3-pip"),
                InstallMethod::new("brew", MethodKind::PackageManager, "brew install python@3.12"),
            ],
            OLLAMA => vec![
                InstallMethod::new(
                    "curl",
                    MethodKind::OfficialScript,
                    elevation.wrap(OLLAMA_INSTALL_SCRIPT),
                )
                .privileged(),
                system("pacman", "pacman -S --noconfirm --needed ollama"),
                InstallMethod::new("brew", MethodKind::PackageManager, "brew install ollama"),
                InstallMethod::new("curl", MethodKind::DirectDownload, OLLAMA_TARBALL),
            ],
            _ => return None,
        };

        Some(InstallPlan {
            platform: Platform::Linux,
            dependency: dependency.to_string(),
            methods,
            bootstrap: Vec::new(),
        })
    }
}

#[async_trait]
impl PlatformInstaller for LinuxInstaller {
    fn platform(&self) -> Platform {
        Platform::Linux
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
        manual_instructions_for(Platform::Linux, dependency)
    }

    async fn check_privileges(&self) -> bool {
        detect_unix_elevation(self.executor.as_ref()).await.is_held()
    }
}

//! Windows installation strategy: winget, Scoop, Chocolatey, then the
//! vendor installers.
//!
//! Commands run under PowerShell.

use std::sync::Arc;

use async_trait::async_trait;
use depkit_core::{CommandExecutor, InstallError, OnProgress, Platform, PlatformInstaller};

use super::{
    InstallMethod, InstallPlan, MethodKind, OLLAMA, PYTHON, detect_windows_elevation,
    manual_instructions_for, run_install_chain,
};

const PYTHON_INSTALLER_URL: &str =
    "https://www.python.org/ftp/python/3.12.8/python-3.12.8-amd64.exe";
const OLLAMA_INSTALLER_URL: &str = "https://ollama.com/download/OllamaSetup.exe";

const WINGET_FLAGS: &str =
    "-e --silent --accept-package-agreements --accept-source-agreements --disable-interactivity";

const SCOOP_BOOTSTRAP: &str = "Set-ExecutionPolicy -ExecutionPolicy RemoteSigned -Scope CurrentUser -Force; \
     Invoke-RestMethod -Uri https://get.scoop.sh | Invoke-Expression";
const CHOCO_BOOTSTRAP: &str = "Set-ExecutionPolicy Bypass -Scope Process -Force; \
     [System.Net.ServicePointManager]::SecurityProtocol = [System.Net.ServicePointManager]::SecurityProtocol -bor 3072; \
     Invoke-Expression ((New-Object System.Net.WebClient).DownloadString('https://community.chocolatey.org/install.ps1'))";

pub struct WindowsInstaller {
    executor: Arc<dyn CommandExecutor>,
}

impl WindowsInstaller {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    fn plan(dependency: &str) -> Option<InstallPlan> {
        let methods = match dependency {
            PYTHON => vec![
                InstallMethod::new(
                    "winget",
                    MethodKind::PackageManager,
                    format!("winget install --id Python.Python.3.12 {WINGET_FLAGS}"),
                ),
                InstallMethod::new("scoop", MethodKind::PackageManager, "scoop install python"),
                InstallMethod::new(
                    "choco",
                    MethodKind::PackageManager,
                    "choco install python312 -y --no-progress",
                )
                .privileged(),
                InstallMethod::new(
                    "powershell",
                    MethodKind::DirectDownload,
                    download_and_run(
                        PYTHON_INSTALLER_URL,
                        "python-installer.exe",
                        "/quiet InstallAllUsers=0 PrependPath=1 Include_test=0",
                    ),
                ),
            ],
            OLLAMA => vec![
                InstallMethod::new(
                    "winget",
                    MethodKind::PackageManager,
                    format!("winget install --id Ollama.Ollama {WINGET_FLAGS}"),
                ),
                InstallMethod::new("scoop", MethodKind::PackageManager, "scoop install ollama"),
                InstallMethod::new(
                    "choco",
                    MethodKind::PackageManager,
                    "choco install ollama -y --no-progress",
                )
                .privileged(),
                InstallMethod::new(
                    "powershell",
                    MethodKind::DirectDownload,
                    download_and_run(
                        OLLAMA_INSTALLER_URL,
                        "OllamaSetup.exe",
                        "/VERYSILENT /SUPPRESSMSGBOXES /NORESTART",
                    ),
                ),
            ],
            _ => return None,
        };

        Some(InstallPlan {
            platform: Platform::Windows,
            dependency: dependency.to_string(),
            methods,
            bootstrap: vec![
                InstallMethod::new("scoop", MethodKind::PackageManager, SCOOP_BOOTSTRAP),
                InstallMethod::new("choco", MethodKind::PackageManager, CHOCO_BOOTSTRAP)
                    .privileged(),
            ],
        })
    }
}

/// PowerShell downloading an installer to `%TEMP%` and running it silently.
fn download_and_run(url: &str, file_name: &str, arguments: &str) -> String {
    format!(
        "$ProgressPreference = 'SilentlyContinue'; \
         $installer = Join-Path $env:TEMP '{file_name}'; \
         Invoke-WebRequest -Uri '{url}' -OutFile $installer -UseBasicParsing; \
         $proc = Start-Process -FilePath $installer -ArgumentList '{arguments}' -Wait -PassThru; \
         Remove-Item $installer -ErrorAction SilentlyContinue; \
         exit $proc.ExitCode"
    )
}

#[async_trait]
impl PlatformInstaller for WindowsInstaller {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    async fn install(
        &self,
        dependency: &str,
        on_progress: OnProgress<'_>,
    ) -> Result<(), InstallError> {
        let plan = Self::plan(dependency).ok_or_else(|| InstallError::unknown(dependency))?;
        let elevation = detect_windows_elevation(self.executor.as_ref()).await;
        run_install_chain(self.executor.as_ref(), &plan, elevation, on_progress).await
    }

    fn manual_instructions(&self, dependency: &str) -> String {
        manual_instructions_for(Platform::Windows, dependency)
    }

    async fn check_privileges(&self) -> bool {
        detect_windows_elevation(self.executor.as_ref())
            .await
            .is_held()
    }
}

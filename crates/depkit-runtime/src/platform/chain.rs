//! Ordered install-method chain shared by every strategy.

use std::sync::LazyLock;

use depkit_core::{CommandExecutor, InstallError, OnProgress, Platform, ProgressUpdate};
use regex::Regex;
use tracing::{debug, info, warn};

use super::{Elevation, InstallMethod, MethodKind};

/// `NN%` or `NN.N%` in tool output.
static PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3})(?:\.\d+)?\s*%").expect("PERCENT must compile")
});

/// Everything the chain needs to install one dependency.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub platform: Platform,
    pub dependency: String,
    /// Methods in order of preference.
    pub methods: Vec<InstallMethod>,
    /// Package managers to install when none of the plan's managers exist,
    /// user-scoped first.
    pub bootstrap: Vec<InstallMethod>,
}

/// Try each method of `plan` in order until one succeeds.
///
/// Absent tools are skipped. Privileged methods are skipped when `elevation`
/// holds no privileges. Every failure message is kept so the caller can see
/// the tools' own wording.
pub async fn run_install_chain(
    executor: &dyn CommandExecutor,
    plan: &InstallPlan,
    elevation: Elevation,
    on_progress: OnProgress<'_>,
) -> Result<(), InstallError> {
    let name = super::display_name(&plan.dependency);
    let mut failures = Vec::new();

    let managers_ready = match ensure_package_manager(executor, plan, elevation, on_progress).await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(dependency = %plan.dependency, "{}", e);
            failures.push(e.to_string());
            false
        }
    };

    for method in &plan.methods {
        let label = method.label();

        if method.kind == MethodKind::PackageManager && !managers_ready {
            debug!(method = %label, "Skipping package manager method, none available");
            continue;
        }

        if !executor.command_exists(method.tool).await {
            debug!(method = %label, "Skipping method, tool not found");
            failures.push(format!("{label}: {} not found", method.tool));
            continue;
        }

        if method.requires_privileges && !elevation.is_held() {
            let err = InstallError::PrivilegeRequired {
                method: label.clone(),
            };
            debug!("{}", err);
            failures.push(err.to_string());
            continue;
        }

        on_progress(ProgressUpdate::installing(format!(
            "Installing {name} via {label}"
        )));

        match run_method(executor, method, on_progress).await {
            Ok(()) => {
                info!(
                    dependency = %plan.dependency,
                    method = %label,
                    "Installation method succeeded"
                );
                return Ok(());
            }
            Err(e) => {
                warn!(
                    dependency = %plan.dependency,
                    method = %label,
                    "Installation method failed: {}",
                    e
                );
                failures.push(format!("{label}: {e}"));
            }
        }
    }

    if failures.is_empty() {
        failures.push(format!("no installation method is available for {name}"));
    }

    Err(InstallError::MethodsExhausted {
        dependency: plan.dependency.clone(),
        failures,
    })
}

/// Make sure at least one of the plan's package managers exists, installing
/// one from `plan.bootstrap` if needed.
async fn ensure_package_manager(
    executor: &dyn CommandExecutor,
    plan: &InstallPlan,
    elevation: Elevation,
    on_progress: OnProgress<'_>,
) -> Result<(), InstallError> {
    let managers: Vec<&InstallMethod> = plan
        .methods
        .iter()
        .filter(|m| m.kind == MethodKind::PackageManager)
        .collect();

    if managers.is_empty() {
        return Ok(());
    }
    for manager in &managers {
        if executor.command_exists(manager.tool).await {
            return Ok(());
        }
    }

    let mut reasons = Vec::new();
    for step in &plan.bootstrap {
        if step.requires_privileges && !elevation.is_held() {
            reasons.push(
                InstallError::PrivilegeRequired {
                    method: step.tool.to_string(),
                }
                .to_string(),
            );
            continue;
        }

        on_progress(ProgressUpdate::installing(format!(
            "Installing package manager {}",
            step.tool
        )));
        info!(manager = step.tool, "Bootstrapping package manager");

        match run_method(executor, step, on_progress).await {
            Ok(()) if executor.command_exists(step.tool).await => return Ok(()),
            Ok(()) => reasons.push(format!("{} installed but not found afterwards", step.tool)),
            Err(e) => {
                warn!(manager = step.tool, "Package manager bootstrap failed: {}", e);
                reasons.push(format!("{}: {e}", step.tool));
            }
        }
    }

    if reasons.is_empty() {
        reasons.push("no package manager found".to_string());
    }

    Err(InstallError::PackageManagerUnavailable {
        platform: plan.platform,
        reason: reasons.join("; "),
    })
}

async fn run_method(
    executor: &dyn CommandExecutor,
    method: &InstallMethod,
    on_progress: OnProgress<'_>,
) -> Result<(), InstallError> {
    let forward = |line: &str| {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match parse_percent(line) {
            Some(percent) => on_progress(ProgressUpdate::downloading(line, Some(percent))),
            None => on_progress(ProgressUpdate::installing(line)),
        }
    };
    executor
        .execute_streaming(&method.command, &forward)
        .await
        .map_err(InstallError::from)
}

/// Last percentage in a line of tool output, capped at 100.
pub fn parse_percent(line: &str) -> Option<u8> {
    PERCENT
        .captures_iter(line)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u16>().ok())
        .last()
        .map(|p| u8::try_from(p.min(100)).unwrap_or(100))
}

//! Terminal formatting for statuses, progress events and states.

use depkit_core::{DependencyStatus, InstallProgressEvent, InstallStatus};
use depkit_runtime::{ErrorKind, ProvisioningState};

// ANSI color codes
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const BOLD: &str = "\x1b[1m";
pub const RESET: &str = "\x1b[0m";

/// Width of the status table.
pub const TABLE_WIDTH: usize = 60;

/// Header line of the status table.
pub fn status_header() -> String {
    format!("{BOLD}{:<12} {:<22} {:<10}{RESET}", "DEPENDENCY", "STATUS", "SERVICE")
}

/// One row of the status table.
pub fn status_row(name: &str, status: &DependencyStatus) -> String {
    let installed = match (status.installed, status.version.as_deref()) {
        (true, Some(version)) if !status.has_sentinel_version() => {
            format!("{GREEN}✓ {version}{RESET}")
        }
        (true, _) => format!("{GREEN}✓ installed{RESET}"),
        (false, _) => format!("{RED}✗ missing{RESET}"),
    };
    let service = match status.running {
        Some(true) => format!("{GREEN}running{RESET}"),
        Some(false) => format!("{YELLOW}stopped{RESET}"),
        None => String::new(),
    };
    // Color codes count towards the width, so pad the plain widths.
    format!("{name:<12} {installed:<31} {service}")
}

/// Single-line rendering of a progress event.
pub fn event_line(event: &InstallProgressEvent) -> String {
    let percent = event
        .progress
        .map(|p| format!(" ({p}%)"))
        .unwrap_or_default();
    match event.status {
        InstallStatus::Error => format!(
            "{RED}✗{RESET} {}: {}",
            event.message,
            event.error.as_deref().unwrap_or("unknown error")
        ),
        InstallStatus::Completed => format!("{GREEN}✓{RESET} {}", event.message),
        _ => format!("{}{percent}", event.message),
    }
}

/// Human-readable summary of a provisioning state.
pub fn state_line(state: &ProvisioningState) -> String {
    match state {
        ProvisioningState::Ready => format!("{GREEN}✓ Ready{RESET}"),
        ProvisioningState::Error(error) => {
            let color = match error.kind {
                ErrorKind::TransientLock => YELLOW,
                ErrorKind::Terminal => RED,
            };
            format!("{color}✗ {}{RESET}", error.message)
        }
        other => format!("{BLUE}…{RESET} {other}"),
    }
}

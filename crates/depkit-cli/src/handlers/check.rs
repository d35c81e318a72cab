//! `depkit check`.

use std::collections::BTreeMap;

use anyhow::Result;
use depkit_core::DependencyStatus;
use depkit_runtime::ProvisioningContext;

use crate::presentation::{
    BLUE, BOLD, GREEN, RED, RESET, TABLE_WIDTH, status_header, status_row,
};

/// Check every dependency and print a table or JSON.
///
/// Missing dependencies are not an error: the command only reports.
pub async fn execute(ctx: &ProvisioningContext, json: bool) -> Result<()> {
    let statuses = ctx.orchestrator.check_dependencies().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        println!(
            "{BOLD}{BLUE}Checking dependencies on {}...{RESET}\n",
            ctx.orchestrator.platform()
        );
        print!("{}", render_table(&statuses));
    }
    Ok(())
}

/// Status table with a summary line.
pub fn render_table(statuses: &BTreeMap<String, DependencyStatus>) -> String {
    let mut out = String::new();
    out.push_str(&status_header());
    out.push('\n');
    out.push_str(&"=".repeat(TABLE_WIDTH));
    out.push('\n');
    for (name, status) in statuses {
        out.push_str(&status_row(name, status));
        out.push('\n');
    }
    out.push_str(&"=".repeat(TABLE_WIDTH));
    out.push('\n');

    let missing: Vec<&str> = statuses
        .iter()
        .filter(|(_, s)| !s.installed)
        .map(|(name, _)| name.as_str())
        .collect();
    if missing.is_empty() {
        out.push_str(&format!("{GREEN}✓ All dependencies are installed{RESET}\n"));
    } else {
        out.push_str(&format!(
            "{RED}✗ Missing: {}{RESET}\n  Run `depkit install <name>` or `depkit instructions <name>`.\n",
            missing.join(", ")
        ));
    }
    out
}

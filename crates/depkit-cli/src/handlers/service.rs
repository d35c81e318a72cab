//! `depkit start` and `depkit stop`.

use anyhow::{Result, bail};
use depkit_runtime::ProvisioningContext;

use crate::error::CliError;
use crate::presentation::{GREEN, RESET, YELLOW};

fn service_name(ctx: &ProvisioningContext) -> Result<String> {
    match ctx.orchestrator.service_dependency() {
        Some(name) => Ok(name),
        None => bail!("No service dependency is registered"),
    }
}

/// Start the service and wait for its liveness probe.
pub async fn start(ctx: &ProvisioningContext) -> Result<()> {
    let name = service_name(ctx)?;
    println!("Starting {name}...");
    ctx.orchestrator
        .start_service(&name)
        .await
        .map_err(CliError::from)?;
    println!("{GREEN}✓ {name} is running{RESET}");
    Ok(())
}

/// Best-effort stop; reports whether a stop mechanism succeeded.
pub async fn stop(ctx: &ProvisioningContext) -> Result<()> {
    let name = service_name(ctx)?;
    if ctx.orchestrator.stop_service(&name).await {
        println!("{GREEN}✓ Stopped {name}{RESET}");
    } else if ctx.orchestrator.is_service_running(&name).await {
        println!("{YELLOW}! Could not stop {name}; stop it from its own menu or service manager{RESET}");
    } else {
        println!("{name} is not running");
    }
    Ok(())
}

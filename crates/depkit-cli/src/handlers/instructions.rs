//! `depkit instructions <name>`.

use anyhow::Result;
use depkit_runtime::ProvisioningContext;
use tracing::debug;

pub fn execute(ctx: &ProvisioningContext, name: &str) -> Result<()> {
    if !ctx.orchestrator.dependency_names().iter().any(|n| n == name) {
        debug!(dependency = name, "Not a registered dependency, using generic instructions");
    }
    println!("{}", ctx.orchestrator.get_manual_instructions(name));
    Ok(())
}

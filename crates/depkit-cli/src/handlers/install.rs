//! `depkit install <name>`.

use std::time::Duration;

use anyhow::Result;
use depkit_core::InstallStatus;
use depkit_runtime::ProvisioningContext;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::CliError;
use crate::presentation::event_line;

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Install one dependency, rendering its progress events on a spinner.
pub async fn execute(ctx: &ProvisioningContext, name: &str) -> Result<()> {
    let (subscription, mut events) = ctx.reporter.subscribe_channel();
    let bar = create_spinner();

    let spinner = bar.clone();
    let render = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let line = event_line(&event);
            match event.status {
                InstallStatus::Completed => spinner.finish_with_message(line),
                InstallStatus::Error => spinner.abandon_with_message(line),
                _ => spinner.set_message(line),
            }
        }
    });

    let result = ctx.orchestrator.install_dependency(name).await;

    // Dropping the subscription closes the channel and ends the render task.
    ctx.reporter.unsubscribe(subscription);
    if render.await.is_err() {
        bar.abandon();
    }

    result.map_err(CliError::from)?;
    Ok(())
}

//! `depkit provision`: the startup flow from the command line.

use anyhow::Result;
use depkit_runtime::{ErrorKind, ProvisioningContext, ProvisioningState};

use crate::error::CliError;
use crate::presentation::{BOLD, RESET, event_line, state_line};

/// Run the startup state machine to completion.
///
/// Fails unless the final state is `Ready`.
pub async fn execute(ctx: &ProvisioningContext, json: bool) -> Result<()> {
    let state = if json {
        ctx.provisioner.run().await
    } else {
        run_with_output(ctx).await
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print!("{}", render_outcome(&state));
    }

    match state {
        ProvisioningState::Error(error) => Err(CliError::Provisioning(error.message).into()),
        _ => Ok(()),
    }
}

async fn run_with_output(ctx: &ProvisioningContext) -> ProvisioningState {
    let events = ctx
        .reporter
        .subscribe(|event| println!("  {}", event_line(event)));

    let mut states = ctx.provisioner.subscribe_state();
    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            if !state.is_terminal() {
                println!("{}", state_line(&state));
            }
        }
    });

    let state = ctx.provisioner.run().await;

    printer.abort();
    ctx.reporter.unsubscribe(events);
    state
}

/// Final state plus what to do next.
pub fn render_outcome(state: &ProvisioningState) -> String {
    let mut out = format!("{}\n", state_line(state));
    if let ProvisioningState::Error(error) = state {
        out.push('\n');
        out.push_str(error.guidance());
        out.push('\n');
        if error.kind == ErrorKind::TransientLock {
            out.push_str(&format!(
                "\n{BOLD}{}:{RESET} run `depkit provision` again once the other installer has finished.\n",
                error.retry_label()
            ));
        }
    }
    out
}

//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use depkit_cli::{Cli, CliError, Commands, handlers, load_settings};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref()).map_err(CliError::from)?;
    let ctx = depkit_runtime::build_default(&settings);

    match cli.command {
        Commands::Check { json } => handlers::check::execute(&ctx, json).await,
        Commands::Install { name } => handlers::install::execute(&ctx, &name).await,
        Commands::Instructions { name } => handlers::instructions::execute(&ctx, &name),
        Commands::Start => handlers::service::start(&ctx).await,
        Commands::Stop => handlers::service::stop(&ctx).await,
        Commands::Provision { json } => handlers::provision::execute(&ctx, json).await,
    }
}

//! Command-line front end for depkit.
//!
//! `main.rs` is the composition root: it loads settings, builds the
//! provisioning stack and dispatches to [`handlers`].

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by the binary target only.
use dotenvy as _;
use tracing_subscriber as _;

pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use commands::Commands;
pub use config::{load_settings, load_settings_with};
pub use error::CliError;
pub use parser::Cli;

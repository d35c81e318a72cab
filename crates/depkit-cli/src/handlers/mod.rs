//! Command handlers.
//!
//! Each handler is a thin `execute` function over the composed
//! [`ProvisioningContext`](depkit_runtime::ProvisioningContext): it calls the
//! orchestrator or the startup machine and formats the result for the
//! terminal. Failures carry a [`CliError`](crate::CliError) so `main` can
//! pick an exit code.

pub mod check;
pub mod install;
pub mod instructions;
pub mod provision;
pub mod service;

//! Error types for command execution and installation.
//!
//! Checking never fails: a missing tool or unparseable version output
//! degrades to a status value. These errors only surface from install and
//! service-start paths.

use thiserror::Error;

use crate::domain::Platform;

/// Maximum number of characters of captured output kept in error messages.
const OUTPUT_TAIL_CHARS: usize = 2000;

/// Errors raised by the command execution gateway.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The shell could not be spawned at all.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("Command `{command}` failed with exit code {code:?}: {}", failure_detail(.stdout, .stderr))]
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl CommandError {
    /// Build a `Failed` error, trimming captured output to a bounded tail.
    pub fn failed(
        command: impl Into<String>,
        code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Self {
        Self::Failed {
            command: command.into(),
            code,
            stdout: tail(stdout),
            stderr: tail(stderr),
        }
    }

    /// The command string that failed.
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. } | Self::Failed { command, .. } => command,
        }
    }

    /// Exit code, if the process ran to completion.
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { .. } => None,
            Self::Failed { code, .. } => *code,
        }
    }
}

/// Stderr and stdout tails, both kept: some installers report locks on stdout.
fn failure_detail(stdout: &str, stderr: &str) -> String {
    match (stderr.trim(), stdout.trim()) {
        (stderr, "") => stderr.to_string(),
        ("", stdout) => stdout.to_string(),
        (stderr, stdout) => format!("{stderr}\n{stdout}"),
    }
}

fn tail(output: &str) -> String {
    let count = output.chars().count();
    if count <= OUTPUT_TAIL_CHARS {
        output.to_string()
    } else {
        output.chars().skip(count - OUTPUT_TAIL_CHARS).collect()
    }
}

/// Errors raised while installing or starting a dependency.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The install path needs elevated privileges the process does not hold.
    #[error("'{method}' requires administrator privileges")]
    PrivilegeRequired { method: String },

    /// No package manager is available and none could be installed.
    #[error("No package manager available on {platform}: {reason}")]
    PackageManagerUnavailable { platform: Platform, reason: String },

    /// Another process holds a lock on the resource being installed.
    #[error("Installation of {dependency} is blocked by another process: {message}")]
    TransientLockContention { dependency: String, message: String },

    /// The service did not answer its liveness probe within the budget.
    #[error("{dependency} is not reachable at {endpoint}")]
    ServiceUnreachable { dependency: String, endpoint: String },

    /// Installation reported success but a re-check still finds nothing.
    #[error("{dependency} installation finished but the dependency was not detected afterwards")]
    VerificationFailed { dependency: String },

    /// Every installation method was tried and failed.
    #[error("All installation methods for {dependency} failed: {}", .failures.join("; "))]
    MethodsExhausted {
        dependency: String,
        failures: Vec<String>,
    },

    /// Automatic installation is not available on this platform.
    #[error("Automatic installation of {dependency} is not supported on {platform}")]
    UnsupportedPlatform {
        dependency: String,
        platform: Platform,
    },

    /// No descriptor with that name is registered.
    #[error("Unknown dependency: {name}")]
    UnknownDependency { name: String },

    /// The descriptor does not expose the install capability.
    #[error("{name} cannot be installed automatically")]
    NotInstallable { name: String },

    /// The descriptor does not expose the service-control capability.
    #[error("{name} is not a service")]
    NotServiceControllable { name: String },

    /// A command failed outside the method chain.
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl InstallError {
    /// Create an `UnknownDependency` error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownDependency { name: name.into() }
    }
}

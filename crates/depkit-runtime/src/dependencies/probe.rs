//! Version probing shared by descriptors.

use depkit_core::{CommandExecutor, DependencyStatus, SENTINEL_VERSION};
use tracing::debug;

use crate::version::parse_version_streams;

/// One way of asking a tool for its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionQuery {
    /// Executable that must exist.
    pub binary: &'static str,
    /// Full command line.
    pub command: &'static str,
}

impl VersionQuery {
    pub const fn new(binary: &'static str, command: &'static str) -> Self {
        Self { binary, command }
    }
}

/// Detect a tool by trying each query in order.
///
/// The first parsed version that `accept` allows wins. When a binary exists
/// but no query yields a parseable version (non-zero exit or unexpected
/// output), the tool is reported present with the sentinel version. A
/// rejected version (e.g. an interpreter that is too old) does not count.
/// Never fails.
pub async fn probe_version(
    executor: &dyn CommandExecutor,
    tool: &str,
    queries: &[VersionQuery],
    accept: impl Fn(&str) -> bool + Send + Sync,
) -> DependencyStatus {
    let mut unversioned_path: Option<Option<String>> = None;
    let mut rejected = false;

    for query in queries {
        if !executor.command_exists(query.binary).await {
            debug!(tool, binary = query.binary, "Binary not found");
            continue;
        }

        let path = executor.locate(query.binary).await;
        let output = match executor.execute(query.command).await {
            Ok(output) => output,
            Err(e) => {
                debug!(tool, command = query.command, "Version query failed: {}", e);
                unversioned_path.get_or_insert(path);
                continue;
            }
        };

        match parse_version_streams(tool, &output.stdout, &output.stderr) {
            Some(version) if accept(&version) => {
                debug!(tool, %version, "Detected version");
                return DependencyStatus::installed(version).with_path(path);
            }
            Some(version) => {
                debug!(tool, %version, command = query.command, "Ignoring unsupported version");
                rejected = true;
            }
            None => {
                debug!(tool, command = query.command, "Could not parse version output");
                unversioned_path.get_or_insert(path);
            }
        }
    }

    match unversioned_path {
        Some(path) if !rejected => DependencyStatus::installed(SENTINEL_VERSION).with_path(path),
        _ => DependencyStatus::missing(),
    }
}

//! Privilege detection. Never prompts.

use depkit_core::CommandExecutor;
use tracing::debug;

/// Privileges held by the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// No elevated privileges.
    None,
    /// Running as root.
    Root,
    /// Passwordless `sudo` is available.
    Sudo,
    /// Elevated Windows session.
    Administrator,
}

impl Elevation {
    /// Whether privileged methods may run.
    pub const fn is_held(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Wrap a command so it runs elevated.
    ///
    /// Only `Sudo` changes the command; root and administrator sessions
    /// already run elevated.
    pub fn wrap(self, command: &str) -> String {
        match self {
            Self::Sudo => format!("sudo -n sh -c '{}'", command.replace('\'', r"'\''")),
            _ => command.to_string(),
        }
    }
}

/// Detect privileges on Unix: `id -u`, then `sudo -n true`.
pub async fn detect_unix_elevation(executor: &dyn CommandExecutor) -> Elevation {
    if let Ok(output) = executor.execute("id -u").await {
        if output.stdout.trim() == "0" {
            return Elevation::Root;
        }
    }
    if executor.execute("sudo -n true").await.is_ok() {
        return Elevation::Sudo;
    }
    debug!("No elevated privileges available");
    Elevation::None
}

/// Detect an elevated Windows session through `net session`.
pub async fn detect_windows_elevation(executor: &dyn CommandExecutor) -> Elevation {
    if executor.execute("net session").await.is_ok() {
        Elevation::Administrator
    } else {
        debug!("Not running in an elevated session");
        Elevation::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeExecutor;

    #[test]
    fn test_wrap_quotes_for_sudo() {
        assert_eq!(Elevation::Root.wrap("apt-get install -y python3"), "apt-get install -y python3");
        assert_eq!(
            Elevation::Sudo.wrap("echo 'hi'"),
            r"sudo -n sh -c 'echo '\''hi'\'''"
        );
    }

    #[tokio::test]
    async fn test_detect_root() {
        let executor = FakeExecutor::new().on("id -u", "0\n");
        assert_eq!(detect_unix_elevation(&executor).await, Elevation::Root);
        assert!(!executor.ran("sudo -n true"));
    }

    #[tokio::test]
    async fn test_detect_sudo() {
        let executor = FakeExecutor::new().on("id -u", "1000\n").on("sudo -n true", "");
        assert_eq!(detect_unix_elevation(&executor).await, Elevation::Sudo);
    }

    #[tokio::test]
    async fn test_detect_none() {
        let executor = FakeExecutor::new()
            .on("id -u", "1000\n")
            .fail("sudo -n true", "sudo: a password is required");
        assert_eq!(detect_unix_elevation(&executor).await, Elevation::None);
        assert!(!Elevation::None.is_held());
    }

    #[tokio::test]
    async fn test_detect_windows() {
        let executor = FakeExecutor::new().on("net session", "There are no entries in the list.");
        assert_eq!(detect_windows_elevation(&executor).await, Elevation::Administrator);
        let executor = FakeExecutor::new().fail("net session", "System error 5 has occurred.");
        assert_eq!(detect_windows_elevation(&executor).await, Elevation::None);
    }
}

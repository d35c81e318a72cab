//! Command execution gateway backed by `tokio::process`.
//!
//! Commands run through the platform shell with a `PATH` extended by the
//! directories package managers install into, so a tool installed earlier in
//! the same process lifetime is found without restarting the shell.

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use depkit_core::{CommandError, CommandExecutor, CommandOutput, OnLine, Platform};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Lines of streamed output kept for error messages.
const STREAM_TAIL_LINES: usize = 200;

/// Package managers that are probed at fixed locations when `PATH` misses them.
const PROBED_MANAGERS: &[&str] = &["brew", "winget", "scoop", "choco"];

/// [`CommandExecutor`] running commands through the system shell.
#[derive(Debug, Clone)]
pub struct SystemCommandExecutor {
    platform: Platform,
    home: Option<PathBuf>,
    search_path: OsString,
}

impl SystemCommandExecutor {
    /// Executor for the current platform and user profile.
    pub fn new() -> Self {
        let platform = Platform::current();
        let home = dirs::home_dir();
        let current = std::env::var_os("PATH").unwrap_or_default();
        let search_path = augment_path(&current, &known_locations(platform, home.as_deref()));
        Self {
            platform,
            home,
            search_path,
        }
    }

    /// Executor with an explicit search path and no profile probing.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            platform: Platform::current(),
            home: None,
            search_path: search_path.into(),
        }
    }

    /// `PATH` given to child processes.
    pub fn search_path(&self) -> &OsStr {
        &self.search_path
    }

    fn shell(&self, command: &str) -> Command {
        let mut cmd = if self.platform == Platform::Windows {
            let mut cmd = Command::new("powershell");
            cmd.args([
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                command,
            ]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };
        cmd.env("PATH", &self.search_path).stdin(Stdio::null());
        cmd
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        if let Ok(path) = which::which_in(name, Some(&self.search_path), cwd) {
            return Some(path);
        }

        if !PROBED_MANAGERS.contains(&name) {
            return None;
        }
        manager_locations(name, self.platform, self.home.as_deref())
            .into_iter()
            .find(|candidate| candidate.is_file())
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn execute(&self, command: &str) -> Result<CommandOutput, CommandError> {
        debug!(command, "Executing command");
        let output = self
            .shell(command)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            Ok(CommandOutput::new(stdout, stderr))
        } else {
            debug!(command, code = ?output.status.code(), "Command failed");
            Err(CommandError::failed(
                command,
                output.status.code(),
                &stdout,
                &stderr,
            ))
        }
    }

    async fn execute_streaming(
        &self,
        command: &str,
        on_line: OnLine<'_>,
    ) -> Result<(), CommandError> {
        debug!(command, "Executing streaming command");
        let spawn_error = |source| CommandError::Spawn {
            command: command.to_string(),
            source,
        };

        let mut child = self
            .shell(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(spawn_error(std::io::Error::other(
                "child output was not captured",
            )));
        };

        // Byte-based reads: `lines()` stops at the first invalid UTF-8 byte,
        // and an undrained pipe blocks the child.
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let mut stdout_buf = Vec::with_capacity(1024);
        let mut stderr_buf = Vec::with_capacity(1024);
        let mut stdout_tail = LineTail::default();
        let mut stderr_tail = LineTail::default();
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                line = read_lossy_line(&mut stdout, &mut stdout_buf), if stdout_open => match line {
                    Some(line) => {
                        on_line(&line);
                        stdout_tail.push(line);
                    }
                    None => stdout_open = false,
                },
                line = read_lossy_line(&mut stderr, &mut stderr_buf), if stderr_open => match line {
                    Some(line) => {
                        on_line(&line);
                        stderr_tail.push(line);
                    }
                    None => stderr_open = false,
                },
            }
        }

        let status = child.wait().await.map_err(spawn_error)?;
        if status.success() {
            Ok(())
        } else {
            debug!(command, code = ?status.code(), "Streaming command failed");
            Err(CommandError::failed(
                command,
                status.code(),
                &stdout_tail.joined(),
                &stderr_tail.joined(),
            ))
        }
    }

    async fn command_exists(&self, name: &str) -> bool {
        let found = self.resolve(name).is_some();
        debug!(name, found, "Command lookup");
        found
    }

    async fn locate(&self, name: &str) -> Option<String> {
        self.resolve(name)
            .map(|path| path.to_string_lossy().into_owned())
    }
}

/// Next line of `reader`, decoded lossily. `None` at EOF or on a read error.
///
/// Partial bytes stay in `buf` when the future is dropped mid-line, so this
/// can be polled from `tokio::select!` without losing output.
async fn read_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match reader.read_until(b'\n', buf).await {
        Ok(0) if buf.is_empty() => None,
        Ok(_) => {
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            Some(line)
        }
        Err(e) => {
            debug!(error = %e, "Output stream reader exiting due to read error");
            None
        }
    }
}

/// Bounded tail of streamed output lines.
#[derive(Default)]
struct LineTail {
    lines: VecDeque<String>,
}

impl LineTail {
    fn push(&mut self, line: String) {
        if self.lines.len() == STREAM_TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn joined(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Append `extra` directories to a `PATH` value, skipping ones already present.
///
/// Existing entries keep their order and precedence. If the result cannot be
/// joined (an entry contains the separator), `current` is returned unchanged.
pub fn augment_path(current: &OsStr, extra: &[PathBuf]) -> OsString {
    let mut entries: Vec<PathBuf> = std::env::split_paths(current).collect();
    for dir in extra {
        if !entries.iter().any(|existing| existing == dir) {
            entries.push(dir.clone());
        }
    }
    std::env::join_paths(entries).unwrap_or_else(|_| current.to_os_string())
}

/// Directories tools are commonly installed into outside the default `PATH`.
pub fn known_locations(platform: Platform, home: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    match platform {
        Platform::MacOs | Platform::Linux => {
            dirs.push(PathBuf::from("/opt/homebrew/bin"));
            dirs.push(PathBuf::from("/usr/local/bin"));
            dirs.push(PathBuf::from("/home/linuxbrew/.linuxbrew/bin"));
            if let Some(home) = home {
                dirs.push(home.join(".linuxbrew/bin"));
                dirs.push(home.join(".local/bin"));
            }
            if platform == Platform::MacOs {
                dirs.push(PathBuf::from("/opt/local/bin"));
                dirs.push(PathBuf::from("/Applications/Ollama.app/Contents/Resources"));
                if let Some(home) = home {
                    dirs.push(home.join("Applications/Ollama.app/Contents/Resources"));
                }
            }
        }
        Platform::Windows => {
            if let Some(home) = home {
                let local = home.join("AppData").join("Local");
                dirs.push(local.join("Microsoft").join("WindowsApps"));
                dirs.push(home.join("scoop").join("shims"));
                dirs.push(local.join("Programs").join("Ollama"));
                dirs.push(local.join("Programs").join("Python").join("Python312"));
                dirs.push(
                    local
                        .join("Programs")
                        .join("Python")
                        .join("Python312")
                        .join("Scripts"),
                );
            }
            dirs.push(PathBuf::from(r"C:\ProgramData\chocolatey\bin"));
        }
        Platform::Unsupported => {}
    }
    dirs
}

/// Fixed install locations of a package manager executable.
pub fn manager_locations(name: &str, platform: Platform, home: Option<&Path>) -> Vec<PathBuf> {
    match (name, platform) {
        ("brew", Platform::MacOs | Platform::Linux) => {
            let mut paths = vec![
                PathBuf::from("/opt/homebrew/bin/brew"),
                PathBuf::from("/usr/local/bin/brew"),
                PathBuf::from("/home/linuxbrew/.linuxbrew/bin/brew"),
            ];
            if let Some(home) = home {
                paths.push(home.join(".linuxbrew/bin/brew"));
            }
            paths
        }
        ("winget", Platform::Windows) => home
            .map(|h| {
                vec![
                    h.join("AppData")
                        .join("Local")
                        .join("Microsoft")
                        .join("WindowsApps")
                        .join("winget.exe"),
                ]
            })
            .unwrap_or_default(),
        ("scoop", Platform::Windows) => home
            .map(|h| {
                let shims = h.join("scoop").join("shims");
                vec![shims.join("scoop.cmd"), shims.join("scoop.ps1")]
            })
            .unwrap_or_default(),
        ("choco", Platform::Windows) => {
            vec![PathBuf::from(r"C:\ProgramData\chocolatey\bin\choco.exe")]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_augment_path_appends_missing_dirs() {
        let current = std::env::join_paths([PathBuf::from("/usr/bin"), PathBuf::from("/bin")])
            .unwrap();
        let extra = vec![PathBuf::from("/bin"), PathBuf::from("/opt/homebrew/bin")];

        let result = augment_path(&current, &extra);
        let entries: Vec<PathBuf> = std::env::split_paths(&result).collect();

        assert_eq!(
            entries,
            vec![
                PathBuf::from("/usr/bin"),
                PathBuf::from("/bin"),
                PathBuf::from("/opt/homebrew/bin"),
            ]
        );
    }

    #[test]
    fn test_augment_path_from_empty() {
        let result = augment_path(OsStr::new(""), &[PathBuf::from("/x")]);
        assert!(std::env::split_paths(&result).any(|p| p == Path::new("/x")));
    }

    #[test]
    fn test_known_locations_include_profile_dirs() {
        let home = Path::new("/home/alex");
        let linux = known_locations(Platform::Linux, Some(home));
        assert!(linux.contains(&home.join(".local/bin")));
        assert!(linux.contains(&PathBuf::from("/opt/homebrew/bin")));

        let mac = known_locations(Platform::MacOs, Some(home));
        assert!(mac.iter().any(|p| p.to_string_lossy().contains("Ollama.app")));

        let windows = known_locations(Platform::Windows, Some(home));
        assert!(windows.contains(&home.join("scoop").join("shims")));

        assert!(known_locations(Platform::Unsupported, Some(home)).is_empty());
    }

    #[test]
    fn test_manager_locations_are_platform_specific() {
        let home = Path::new("/home/alex");
        assert!(!manager_locations("brew", Platform::MacOs, Some(home)).is_empty());
        assert!(manager_locations("brew", Platform::Windows, Some(home)).is_empty());
        assert!(!manager_locations("scoop", Platform::Windows, Some(home)).is_empty());
        assert!(manager_locations("scoop", Platform::Windows, None).is_empty());
        assert!(manager_locations("apt-get", Platform::Linux, Some(home)).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_captures_output() {
        let executor = SystemCommandExecutor::new();
        let output = executor.execute("echo hello; echo oops 1>&2").await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_reports_exit_code() {
        let executor = SystemCommandExecutor::new();
        let err = executor
            .execute("echo 'could not get lock' 1>&2; exit 3")
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert!(err.to_string().contains("could not get lock"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_streaming_forwards_every_line() {
        let executor = SystemCommandExecutor::new();
        let lines = Mutex::new(Vec::new());
        let on_line = |line: &str| lines.lock().unwrap().push(line.to_string());

        executor
            .execute_streaming("echo one; echo two 1>&2; echo three", &on_line)
            .await
            .unwrap();

        let mut seen = lines.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec!["one", "three", "two"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_streaming_survives_invalid_utf8() {
        let executor = SystemCommandExecutor::new();
        let count = Mutex::new(0usize);
        let lossy = Mutex::new(None);
        let on_line = |line: &str| {
            *count.lock().unwrap() += 1;
            if line.ends_with(" progress") {
                *lossy.lock().unwrap() = Some(line.to_string());
            }
        };

        // Enough trailing output to fill the pipe if the reader stopped early.
        let command = "printf '\\377\\376 progress\\n'; \
                       i=0; while [ $i -lt 3000 ]; do echo \"line $i\"; i=$((i+1)); done";
        tokio::time::timeout(
            std::time::Duration::from_secs(30),
            executor.execute_streaming(command, &on_line),
        )
        .await
        .expect("streaming must not hang on invalid UTF-8")
        .unwrap();

        assert_eq!(count.into_inner().unwrap(), 3001);
        let lossy = lossy.into_inner().unwrap().unwrap();
        assert!(lossy.starts_with('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_read_lossy_line_handles_crlf_and_partial_tail() {
        let mut reader = BufReader::new(&b"first\r\n\xffsecond\nlast"[..]);
        let mut buf = Vec::new();
        assert_eq!(read_lossy_line(&mut reader, &mut buf).await.as_deref(), Some("first"));
        assert_eq!(
            read_lossy_line(&mut reader, &mut buf).await.as_deref(),
            Some("\u{FFFD}second")
        );
        assert_eq!(read_lossy_line(&mut reader, &mut buf).await.as_deref(), Some("last"));
        assert_eq!(read_lossy_line(&mut reader, &mut buf).await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_streaming_error_keeps_tail() {
        let executor = SystemCommandExecutor::new();
        let err = executor
            .execute_streaming("echo 'Error: has already locked' 1>&2; exit 1", &|_| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("has already locked"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_exists() {
        let executor = SystemCommandExecutor::new();
        assert!(executor.command_exists("sh").await);
        assert!(!executor.command_exists("definitely-not-a-real-tool-xyz").await);
        assert!(executor.locate("sh").await.is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_custom_search_path_is_used_for_resolution() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("ollama");
        std::fs::write(&tool, "#!/bin/sh\necho 'ollama version is 0.5.7'\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let executor = SystemCommandExecutor::with_search_path(dir.path().as_os_str());

        assert!(executor.command_exists("ollama").await);
        let located = executor.locate("ollama").await.unwrap();
        assert!(Path::new(&located).ends_with("ollama"));
        assert!(!executor.command_exists("python3-not-here").await);
    }
}

//! Scripted shell and liveness probe.
//!
//! The shell simulates a machine: installing a package makes its binaries
//! appear, and starting the service makes the probe answer.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use depkit_core::{CommandError, CommandExecutor, CommandOutput, LivenessProbe, OnLine};

#[derive(Default)]
struct Script {
    /// Command substring -> stdout.
    responses: Vec<(String, String)>,
    /// Command substring -> remaining failures with this stderr.
    failures: Vec<(String, String, u32)>,
    /// Command substring -> tool that exists afterwards.
    provides: Vec<(String, String)>,
}

/// In-memory machine answering shell commands.
#[derive(Default)]
pub struct FakeShell {
    script: Mutex<Script>,
    tools: Mutex<HashSet<String>>,
    versions: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    service_up: Arc<AtomicBool>,
    start_command: Mutex<Option<String>>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(self, name: &str) -> Self {
        self.tools.lock().unwrap().insert(name.to_string());
        self
    }

    /// `<binary> ...version...` prints `output` once `binary` exists.
    pub fn version(self, binary: &str, output: &str) -> Self {
        self.versions
            .lock()
            .unwrap()
            .insert(binary.to_string(), output.to_string());
        self
    }

    pub fn respond(self, pattern: &str, stdout: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .responses
            .push((pattern.to_string(), stdout.to_string()));
        self
    }

    /// Fail the next `times` commands matching `pattern`.
    pub fn fail_times(self, pattern: &str, stderr: &str, times: u32) -> Self {
        self.script
            .lock()
            .unwrap()
            .failures
            .push((pattern.to_string(), stderr.to_string(), times));
        self
    }

    /// A successful command matching `pattern` installs `tool`.
    pub fn provides(self, pattern: &str, tool: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .provides
            .push((pattern.to_string(), tool.to_string()));
        self
    }

    /// Running a command matching `pattern` brings the service up.
    pub fn starts_service_on(self, pattern: &str) -> Self {
        *self.start_command.lock().unwrap() = Some(pattern.to_string());
        self
    }

    pub fn service_flag(&self) -> Arc<AtomicBool> {
        self.service_up.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.calls().iter().any(|c| c.contains(pattern))
    }

    fn run(&self, command: &str) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(command.to_string());

        {
            let mut script = self.script.lock().unwrap();
            if let Some(failure) = script
                .failures
                .iter_mut()
                .find(|(pattern, _, remaining)| *remaining > 0 && command.contains(pattern.as_str()))
            {
                failure.2 -= 1;
                return Err(CommandError::failed(command, Some(1), "", &failure.1));
            }
        }

        if let Some(binary) = command.split_whitespace().next() {
            if command.contains("version") || command.ends_with(" -v") {
                if self.tools.lock().unwrap().contains(binary) {
                    if let Some(output) = self.versions.lock().unwrap().get(binary) {
                        return Ok(CommandOutput::new(output.clone(), ""));
                    }
                }
                return Err(CommandError::failed(command, Some(127), "", "not found"));
            }
        }

        if let Some(pattern) = self.start_command.lock().unwrap().as_deref() {
            if command.contains(pattern) {
                self.service_up.store(true, Ordering::SeqCst);
                return Ok(CommandOutput::default());
            }
        }

        let script = self.script.lock().unwrap();
        let Some((_, stdout)) = script
            .responses
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
        else {
            return Err(CommandError::failed(command, Some(127), "", "command not found"));
        };

        for (pattern, tool) in &script.provides {
            if command.contains(pattern.as_str()) {
                self.tools.lock().unwrap().insert(tool.clone());
            }
        }
        Ok(CommandOutput::new(stdout.clone(), ""))
    }
}

#[async_trait]
impl CommandExecutor for FakeShell {
    async fn execute(&self, command: &str) -> Result<CommandOutput, CommandError> {
        self.run(command)
    }

    async fn execute_streaming(
        &self,
        command: &str,
        on_line: OnLine<'_>,
    ) -> Result<(), CommandError> {
        let output = self.run(command)?;
        output.stdout.lines().for_each(on_line);
        Ok(())
    }

    async fn command_exists(&self, name: &str) -> bool {
        self.tools.lock().unwrap().contains(name)
    }

    async fn locate(&self, name: &str) -> Option<String> {
        self.command_exists(name)
            .await
            .then(|| format!("/usr/local/bin/{name}"))
    }
}

/// Probe following a shared "service is up" flag, optionally failing the
/// first few probes regardless.
pub struct FlagProbe {
    up: Arc<AtomicBool>,
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl FlagProbe {
    pub fn new(up: Arc<AtomicBool>) -> Self {
        Self {
            up,
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing_first(self, count: u32) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for FlagProbe {
    async fn probe(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let forced_failure = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        !forced_failure && self.up.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> String {
        "http://127.0.0.1:11434/api/tags".to_string()
    }
}

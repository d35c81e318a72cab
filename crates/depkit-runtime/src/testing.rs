//! Scripted command executor for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use depkit_core::{CommandError, CommandExecutor, CommandOutput, OnLine};

enum Outcome {
    Succeed { stdout: String, installs: Option<String> },
    Fail { stderr: String },
}

struct Rule {
    pattern: String,
    outcome: Outcome,
}

/// Executor answering commands from substring rules.
///
/// Unmatched commands fail with exit code 127. Every command is recorded.
pub struct FakeExecutor {
    rules: Vec<Rule>,
    tools: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            tools: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tool(self, tool: &str) -> Self {
        self.tools.lock().unwrap().insert(tool.to_string());
        self
    }

    pub fn on(mut self, pattern: &str, stdout: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            outcome: Outcome::Succeed {
                stdout: stdout.to_string(),
                installs: None,
            },
        });
        self
    }

    /// Succeed and make `tool` available afterwards.
    pub fn on_installing(mut self, pattern: &str, stdout: &str, tool: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            outcome: Outcome::Succeed {
                stdout: stdout.to_string(),
                installs: Some(tool.to_string()),
            },
        });
        self
    }

    pub fn fail(mut self, pattern: &str, stderr: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            outcome: Outcome::Fail {
                stderr: stderr.to_string(),
            },
        });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.calls().iter().any(|c| c.contains(pattern))
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }

    fn run(&self, command: &str) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(command.to_string());
        match self.rules.iter().find(|r| command.contains(&r.pattern)) {
            Some(Rule {
                outcome: Outcome::Succeed { stdout, installs },
                ..
            }) => {
                if let Some(tool) = installs {
                    self.tools.lock().unwrap().insert(tool.clone());
                }
                Ok(CommandOutput::new(stdout.clone(), ""))
            }
            Some(Rule {
                outcome: Outcome::Fail { stderr },
                ..
            }) => Err(CommandError::failed(command, Some(1), "", stderr)),
            None => Err(CommandError::failed(
                command,
                Some(127),
                "",
                "command not found",
            )),
        }
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(&self, command: &str) -> Result<CommandOutput, CommandError> {
        self.run(command)
    }

    async fn execute_streaming(
        &self,
        command: &str,
        on_line: OnLine<'_>,
    ) -> Result<(), CommandError> {
        let output = self.run(command)?;
        for line in output.stdout.lines() {
            on_line(line);
        }
        Ok(())
    }

    async fn command_exists(&self, name: &str) -> bool {
        self.tools.lock().unwrap().contains(name)
    }

    async fn locate(&self, name: &str) -> Option<String> {
        self.command_exists(name)
            .await
            .then(|| format!("/usr/bin/{name}"))
    }
}

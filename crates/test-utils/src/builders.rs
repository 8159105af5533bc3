use std::collections::BTreeMap;
use std::path::Path;

use tfwrap::exec::{CommandLine, CommandSpec, ExecutionAttempt};

/// Builder for `CommandSpec` with test-friendly defaults: output is not
/// echoed to the harness's stdout.
pub struct CommandSpecBuilder {
    spec: CommandSpec,
}

impl CommandSpecBuilder {
    pub fn argv(args: &[&str]) -> Self {
        let command = CommandLine::argv(args.iter().copied()).expect("non-empty argv");
        Self::from_command(command)
    }

    pub fn shell(cmd: &str) -> Self {
        Self::from_command(CommandLine::shell(cmd))
    }

    fn from_command(command: CommandLine) -> Self {
        let mut spec = CommandSpec::new(command);
        spec.print_output = false;
        Self { spec }
    }

    pub fn retry(mut self, val: bool) -> Self {
        self.spec.retry_enabled = val;
        self
    }

    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.spec.timeout_seconds = secs;
        self
    }

    pub fn print_output(mut self, val: bool) -> Self {
        self.spec.print_output = val;
        self
    }

    pub fn capture_stderr(mut self, val: bool) -> Self {
        self.spec.capture_stderr = val;
        self
    }

    pub fn print_command(mut self, val: bool) -> Self {
        self.spec.print_command = val;
        self
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.spec.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn audit_url(mut self, url: &str) -> Self {
        self.spec.audit_url = Some(url.to_string());
        self
    }

    /// Set one environment entry; `None` marks it unset.
    pub fn env(mut self, key: &str, value: Option<&str>) -> Self {
        self.spec
            .env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.map(str::to_string));
        self
    }

    pub fn build(self) -> CommandSpec {
        self.spec
    }
}

/// Shorthand for an attempt with the given exit code and output lines.
pub fn attempt(exit_code: i32, lines: &[&str]) -> ExecutionAttempt {
    ExecutionAttempt::new(exit_code, lines.iter().map(|s| s.to_string()).collect())
}

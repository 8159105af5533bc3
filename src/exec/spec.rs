// src/exec/spec.rs

//! What to run, and what one run produced.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::process::Command;

use crate::errors::{Result, WrapperError};

/// Default retry budget: 15 minutes of cumulative backoff.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15 * 60;

/// The command to execute.
///
/// - `Argv`: program plus arguments, spawned directly (never empty).
/// - `Shell`: a single command string handed to the platform shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    Argv(Vec<String>),
    Shell(String),
}

impl CommandLine {
    /// Build an argument vector. Fails if `args` is empty.
    pub fn argv<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(WrapperError::ConfigError(
                "command line must contain at least the program name".to_string(),
            ));
        }
        Ok(CommandLine::Argv(args))
    }

    pub fn shell(cmd: impl Into<String>) -> Self {
        CommandLine::Shell(cmd.into())
    }

    /// Human-readable form, arguments joined by single spaces.
    pub fn display(&self) -> String {
        match self {
            CommandLine::Argv(args) => args.join(" "),
            CommandLine::Shell(cmd) => cmd.clone(),
        }
    }
}

/// Everything needed for one logical invocation. All retries reuse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: CommandLine,
    pub working_dir: Option<PathBuf>,

    /// Replacement environment for the child.
    ///
    /// `None` means "inherit the caller's environment". Entries whose value
    /// is `None` are dropped before spawning.
    pub env: Option<BTreeMap<String, Option<String>>>,

    pub print_output: bool,
    pub capture_stderr: bool,
    pub print_command: bool,
    pub retry_enabled: bool,
    pub timeout_seconds: u64,
    pub audit_url: Option<String>,
}

impl CommandSpec {
    pub fn new(command: CommandLine) -> Self {
        Self {
            command,
            working_dir: None,
            env: None,
            print_output: true,
            capture_stderr: true,
            print_command: false,
            retry_enabled: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            audit_url: None,
        }
    }

    /// The environment actually handed to the child, with unset entries removed.
    pub fn effective_env(&self) -> Option<BTreeMap<String, String>> {
        self.env.as_ref().map(|env| {
            env.iter()
                .filter_map(|(key, value)| value.as_ref().map(|v| (key.clone(), v.clone())))
                .collect()
        })
    }

    /// Build the `tokio` command for this spec, without any stdio wiring.
    pub(crate) fn to_command(&self) -> Result<Command> {
        let mut cmd = match &self.command {
            CommandLine::Argv(args) => {
                let Some((program, rest)) = args.split_first() else {
                    return Err(WrapperError::Spawn {
                        command: String::new(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "empty argument vector",
                        ),
                    });
                };
                let mut c = Command::new(program);
                c.args(rest);
                c
            }
            CommandLine::Shell(line) => {
                if cfg!(windows) {
                    let mut c = Command::new("cmd");
                    c.arg("/C").arg(line);
                    c
                } else {
                    let mut c = Command::new("sh");
                    c.arg("-c").arg(line);
                    c
                }
            }
        };

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        if let Some(env) = self.effective_env() {
            cmd.env_clear();
            cmd.envs(env);
        }

        Ok(cmd)
    }
}

/// Result of one subprocess run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionAttempt {
    pub exit_code: i32,
    /// Captured output lines in the order they were written, each with its
    /// original line terminator.
    pub output: Vec<String>,
}

impl ExecutionAttempt {
    pub fn new(exit_code: i32, output: Vec<String>) -> Self {
        Self { exit_code, output }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_argv_is_rejected() {
        let err = CommandLine::argv(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, WrapperError::ConfigError(_)));
    }

    #[test]
    fn display_joins_arguments() {
        let cmd = CommandLine::argv(["terraform", "plan", "-input=false"]).unwrap();
        assert_eq!(cmd.display(), "terraform plan -input=false");
        assert_eq!(CommandLine::shell("echo hi && false").display(), "echo hi && false");
    }

    #[test]
    fn defaults_match_documented_values() {
        let spec = CommandSpec::new(CommandLine::shell("true"));
        assert!(spec.print_output);
        assert!(spec.capture_stderr);
        assert!(!spec.print_command);
        assert!(!spec.retry_enabled);
        assert_eq!(spec.timeout_seconds, 900);
        assert!(spec.audit_url.is_none());
    }

    #[test]
    fn unset_env_entries_are_dropped() {
        let mut spec = CommandSpec::new(CommandLine::shell("true"));
        assert!(spec.effective_env().is_none());

        spec.env = Some(BTreeMap::from([
            ("KEEP".to_string(), Some("1".to_string())),
            ("DROP".to_string(), None),
            ("EMPTY".to_string(), Some(String::new())),
        ]));

        let env = spec.effective_env().unwrap();
        assert_eq!(env.get("KEEP").map(String::as_str), Some("1"));
        assert_eq!(env.get("EMPTY").map(String::as_str), Some(""));
        assert!(!env.contains_key("DROP"));
    }
}

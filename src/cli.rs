// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tfwrap`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tfwrap",
    version,
    about = "Run an infrastructure tool, retrying transient failures and reporting the outcome.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to run the command in.
    ///
    /// Default: the current working directory.
    #[arg(short = 'C', long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Path to the wrapper config (TOML).
    ///
    /// Default: `.tf_wrapper` inside `--dir`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Retry when the output shows a transient network or throttling error.
    #[arg(long)]
    pub retry: bool,

    /// Maximum cumulative backoff, in seconds, before giving up on retries.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not stream the command's output while it runs.
    #[arg(long)]
    pub no_print_output: bool,

    /// Discard the command's stderr instead of capturing it with stdout.
    #[arg(long)]
    pub no_capture_stderr: bool,

    /// Print the command line before running it.
    #[arg(long)]
    pub print_command: bool,

    /// Post the final outcome to this audit API URL.
    #[arg(long, value_name = "URL")]
    pub audit_url: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TFWRAP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load config, print what would run, and exit. SSM values are not fetched.
    #[arg(long)]
    pub dry_run: bool,

    /// The command to run. A single argument containing whitespace is run
    /// through the shell.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_command_keeps_its_flags() {
        let args = CliArgs::try_parse_from([
            "tfwrap", "--retry", "-C", "/infra/prod", "--", "terraform", "plan", "-lock=false",
        ])
        .unwrap();
        assert!(args.retry);
        assert_eq!(args.dir, Some(PathBuf::from("/infra/prod")));
        assert_eq!(args.command, vec!["terraform", "plan", "-lock=false"]);
    }

    #[test]
    fn command_is_required() {
        assert!(CliArgs::try_parse_from(["tfwrap", "--retry"]).is_err());
    }
}

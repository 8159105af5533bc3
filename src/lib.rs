// src/lib.rs

pub mod audit;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::audit::AuditReporter;
use crate::cli::CliArgs;
use crate::config::{
    default_config_path, load_or_default, merge_environment, resolve_envvars, utf8_environment,
    AwsCliParameterStore, EnvVarSource, WrapperConfig,
};
use crate::engine::Engine;
use crate::exec::{
    CommandLine, CommandSpec, RealProcessRunner, RetryScheduler, TransientErrorCatalog,
    DEFAULT_TIMEOUT_SECS,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - environment resolution
/// - the execution engine (retry scheduler, process runner, audit reporter)
///
/// Returns the exit code `tfwrap` itself should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&dir));
    let cfg = load_or_default(&config_path)?;

    let mut spec = build_command_spec(&args, &cfg, dir)?;
    let catalog = Arc::new(
        TransientErrorCatalog::default()
            .with_extra(cfg.execution.extra_retriable_errors.iter().cloned()),
    );

    if args.dry_run {
        print_dry_run(&spec, &cfg, &config_path, &catalog);
        return Ok(0);
    }

    let resolved = resolve_envvars(&cfg.envvars, &AwsCliParameterStore).await?;
    spec.env = Some(merge_environment(inherited_env(), resolved));

    let engine = Engine::new(
        RealProcessRunner::new(),
        RetryScheduler::new(catalog),
        AuditReporter::new()?,
    );

    let attempt = engine.execute(&spec).await?;
    info!(
        exit_code = attempt.exit_code,
        lines = attempt.output.len(),
        "command finished"
    );

    Ok(process_exit_code(attempt.exit_code))
}

/// Combine CLI flags with the `[execution]` config section.
///
/// CLI flags win; `--no-*` flags can only turn behaviour off.
pub fn build_command_spec(
    args: &CliArgs,
    cfg: &WrapperConfig,
    dir: PathBuf,
) -> errors::Result<CommandSpec> {
    let exec = &cfg.execution;
    let mut spec = CommandSpec::new(command_line_from_args(&args.command)?);

    spec.working_dir = Some(dir);
    spec.retry_enabled = args.retry || exec.retry.unwrap_or(false);
    spec.timeout_seconds = args
        .timeout
        .or(exec.timeout_seconds)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    spec.print_output = !args.no_print_output && exec.print_output.unwrap_or(true);
    spec.capture_stderr = !args.no_capture_stderr && exec.capture_stderr.unwrap_or(true);
    spec.print_command = args.print_command || exec.print_command.unwrap_or(false);
    spec.audit_url = args.audit_url.clone().or_else(|| exec.audit_url.clone());

    Ok(spec)
}

/// A single argument with whitespace in it is a shell command string;
/// anything else is an argument vector.
pub fn command_line_from_args(args: &[String]) -> errors::Result<CommandLine> {
    match args {
        [single] if single.chars().any(char::is_whitespace) => Ok(CommandLine::shell(single)),
        _ => CommandLine::argv(args.iter().cloned()),
    }
}

/// Map a child's exit code onto something a process can exit with.
///
/// Codes in `0..=255` pass through; a signal death (`-n`) becomes `128 + n`
/// as a shell would report it; anything else becomes `1`.
pub fn process_exit_code(code: i32) -> i32 {
    match code {
        0..=255 => code,
        -127..=-1 => 128 - code,
        _ => 1,
    }
}

/// The current process environment. Non-UTF-8 entries are logged and skipped.
fn inherited_env() -> Vec<(String, String)> {
    let (kept, _dropped) = utf8_environment(std::env::vars_os());
    kept
}

/// Print the resolved plan without running anything. Secret values are never
/// printed, only their sources.
fn print_dry_run(
    spec: &CommandSpec,
    cfg: &WrapperConfig,
    config_path: &Path,
    catalog: &TransientErrorCatalog,
) {
    println!("tfwrap dry-run");
    println!("  config: {}", config_path.display());
    if let Some(dir) = &spec.working_dir {
        println!("  dir: {}", dir.display());
    }
    println!("  command: {}", spec.command.display());
    println!("  retry: {}", spec.retry_enabled);
    println!("  timeout_seconds: {}", spec.timeout_seconds);
    println!("  print_output: {}", spec.print_output);
    println!("  capture_stderr: {}", spec.capture_stderr);
    println!("  print_command: {}", spec.print_command);
    if let Some(url) = &spec.audit_url {
        println!("  audit_url: {url}");
    }
    println!("  retriable phrases: {}", catalog.phrases().len());
    println!();

    println!("  configure_backend: {}", cfg.configure_backend);
    println!("  pipeline_check: {}", cfg.pipeline_check);
    if let Some(backend) = &cfg.backend {
        println!("  backend: {}", backend.kind());
    }
    if !cfg.depends_on.is_empty() {
        println!("  depends_on: {:?}", cfg.depends_on);
    }

    println!("envvars ({}):", cfg.envvars.len());
    for (name, source) in cfg.envvars.iter() {
        match source {
            EnvVarSource::Ssm { path } => println!("  - {name} <- ssm:{path}"),
            EnvVarSource::Text { .. } => println!("  - {name} <- text"),
            EnvVarSource::Unset => println!("  - {name} (unset)"),
        }
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(raw: &[&str]) -> CliArgs {
        let mut argv = vec!["tfwrap"];
        argv.extend_from_slice(raw);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn whitespace_argument_runs_through_shell() {
        let cmd =
            command_line_from_args(&["terraform init && terraform plan".to_string()]).unwrap();
        assert_eq!(cmd, CommandLine::shell("terraform init && terraform plan"));

        let cmd = command_line_from_args(&["terraform".to_string(), "plan".to_string()]).unwrap();
        assert!(matches!(cmd, CommandLine::Argv(v) if v.len() == 2));
    }

    #[test]
    fn exit_codes_are_mapped_for_the_shell() {
        assert_eq!(process_exit_code(0), 0);
        assert_eq!(process_exit_code(255), 255);
        assert_eq!(process_exit_code(-9), 137);
        assert_eq!(process_exit_code(-1000), 1);
        assert_eq!(process_exit_code(4096), 1);
    }

    #[test]
    fn defaults_without_flags_or_config() {
        let spec = build_command_spec(
            &args(&["--", "terraform", "plan"]),
            &WrapperConfig::default(),
            PathBuf::from("/infra"),
        )
        .unwrap();
        assert!(!spec.retry_enabled);
        assert!(spec.print_output);
        assert!(spec.capture_stderr);
        assert!(!spec.print_command);
        assert_eq!(spec.timeout_seconds, DEFAULT_TIMEOUT_SECS);
        assert_eq!(spec.working_dir, Some(PathBuf::from("/infra")));
        assert!(spec.audit_url.is_none());
    }

    #[test]
    fn cli_flags_override_config() {
        let mut cfg = WrapperConfig::default();
        cfg.execution.retry = Some(false);
        cfg.execution.timeout_seconds = Some(60);
        cfg.execution.audit_url = Some("https://from-config".to_string());
        cfg.execution.print_output = Some(true);

        let spec = build_command_spec(
            &args(&[
                "--retry",
                "--timeout",
                "5",
                "--no-print-output",
                "--audit-url",
                "https://from-cli",
                "--",
                "terraform",
                "apply",
            ]),
            &cfg,
            PathBuf::from("/infra"),
        )
        .unwrap();

        assert!(spec.retry_enabled);
        assert_eq!(spec.timeout_seconds, 5);
        assert!(!spec.print_output);
        assert_eq!(spec.audit_url.as_deref(), Some("https://from-cli"));
    }

    #[test]
    fn config_fills_in_missing_flags() {
        let mut cfg = WrapperConfig::default();
        cfg.execution.retry = Some(true);
        cfg.execution.timeout_seconds = Some(120);
        cfg.execution.capture_stderr = Some(false);
        cfg.execution.print_command = Some(true);

        let spec =
            build_command_spec(&args(&["--", "terraform", "plan"]), &cfg, PathBuf::from("/infra"))
                .unwrap();
        assert!(spec.retry_enabled);
        assert_eq!(spec.timeout_seconds, 120);
        assert!(!spec.capture_stderr);
        assert!(spec.print_command);
    }
}

// src/logging.rs

//! Logging setup for `tfwrap`.
//!
//! The subscriber filter comes from, in order:
//! 1. `--log-level`, applied as one global level
//! 2. `TFWRAP_LOG`, parsed as `EnvFilter` directives, e.g.
//!    `info,tfwrap::exec=debug,reqwest=warn`
//! 3. `info`
//!
//! Logs go to STDERR. STDOUT belongs to the wrapped command's streamed output.

use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "TFWRAP_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Where the active filter came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FilterSource {
    Cli,
    Env,
    Default,
    /// `TFWRAP_LOG` was set but could not be parsed.
    RejectedEnv(String),
}

/// Initialise the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let (directives, source) = filter_directives(cli_level, env_value.as_deref());

    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter '{directives}'"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    if let FilterSource::RejectedEnv(value) = source {
        warn!(
            value = %value,
            "ignoring unparsable {LOG_ENV_VAR}; logging at {DEFAULT_DIRECTIVES}"
        );
    }

    Ok(())
}

/// Pick the filter directives for this run.
pub(crate) fn filter_directives(
    cli_level: Option<LogLevel>,
    env_value: Option<&str>,
) -> (String, FilterSource) {
    if let Some(level) = cli_level {
        return (level_directive(level).to_string(), FilterSource::Cli);
    }

    match env_value.map(str::trim) {
        None | Some("") => (DEFAULT_DIRECTIVES.to_string(), FilterSource::Default),
        Some(value) if EnvFilter::try_new(value).is_ok() => {
            (value.to_string(), FilterSource::Env)
        }
        Some(value) => (
            DEFAULT_DIRECTIVES.to_string(),
            FilterSource::RejectedEnv(value.to_string()),
        ),
    }
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only two variants are ever raised by the execution engine itself:
//! [`WrapperError::Spawn`] and [`WrapperError::RetryTimeout`]. A command that
//! runs and exits non-zero is *not* an error; callers inspect the exit code of
//! the returned attempt instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WrapperError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "timed out retrying `{command}` after {attempts} attempt(s) and {waited_secs:.1}s of backoff"
    )]
    RetryTimeout {
        command: String,
        attempts: u32,
        waited_secs: f64,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("failed to resolve environment variable {name}: {message}")]
    EnvResolution { name: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WrapperError>;

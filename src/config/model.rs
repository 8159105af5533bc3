// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Wrapper configuration as read from a `.tf_wrapper` TOML file.
///
/// ```toml
/// configure_backend = true
/// depends_on = ["../vpc"]
///
/// [envvars.TF_VAR_token]
/// source = "ssm"
/// path = "/team/token"
///
/// [backend]
/// type = "s3"
/// bucket = "state"
/// region = "us-east-1"
///
/// [execution]
/// retry = true
/// ```
///
/// All keys are optional. Use [`crate::config::load_and_validate`] to obtain
/// a validated [`WrapperConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawWrapperConfig {
    #[serde(default = "default_true")]
    pub configure_backend: bool,

    #[serde(default = "default_true")]
    pub pipeline_check: bool,

    /// Directories this one depends on. Informational only.
    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default)]
    pub envvars: BTreeMap<String, EnvVarSource>,

    #[serde(default)]
    pub backend: Option<BackendConfig>,

    #[serde(default)]
    pub execution: ExecutionSection,
}

fn default_true() -> bool {
    true
}

impl Default for RawWrapperConfig {
    fn default() -> Self {
        Self {
            configure_backend: true,
            pipeline_check: true,
            depends_on: Vec::new(),
            envvars: BTreeMap::new(),
            backend: None,
            execution: ExecutionSection::default(),
        }
    }
}

/// Where an environment variable's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum EnvVarSource {
    /// Looked up in the SSM parameter store.
    Ssm { path: String },
    /// Literal value.
    Text { value: String },
    /// Removed from the child's environment.
    Unset,
}

/// Remote state backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    S3 {
        bucket: String,
        region: String,
        #[serde(default)]
        dynamodb_table: Option<String>,
        #[serde(default)]
        role_arn: Option<String>,
    },
    Gcs {
        bucket: String,
        #[serde(default)]
        prefix: Option<String>,
    },
    Http {
        address: String,
        #[serde(default)]
        lock_address: Option<String>,
        #[serde(default)]
        unlock_address: Option<String>,
    },
}

impl BackendConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::S3 { .. } => "s3",
            BackendConfig::Gcs { .. } => "gcs",
            BackendConfig::Http { .. } => "http",
        }
    }
}

/// `[execution]` section. Unset keys fall back to CLI flags or built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecutionSection {
    #[serde(default)]
    pub retry: Option<bool>,

    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    #[serde(default)]
    pub print_output: Option<bool>,

    #[serde(default)]
    pub capture_stderr: Option<bool>,

    #[serde(default)]
    pub print_command: Option<bool>,

    #[serde(default)]
    pub audit_url: Option<String>,

    /// Appended to the built-in transient-error catalog.
    #[serde(default)]
    pub extra_retriable_errors: Vec<String>,
}

/// Validated wrapper configuration.
#[derive(Debug, Clone)]
pub struct WrapperConfig {
    pub configure_backend: bool,
    pub pipeline_check: bool,
    pub depends_on: Vec<String>,
    pub envvars: BTreeMap<String, EnvVarSource>,
    pub backend: Option<BackendConfig>,
    pub execution: ExecutionSection,
}

impl WrapperConfig {
    pub(crate) fn new_unchecked(raw: RawWrapperConfig) -> Self {
        Self {
            configure_backend: raw.configure_backend,
            pipeline_check: raw.pipeline_check,
            depends_on: raw.depends_on,
            envvars: raw.envvars,
            backend: raw.backend,
            execution: raw.execution,
        }
    }
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self::new_unchecked(RawWrapperConfig::default())
    }
}

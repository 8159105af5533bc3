// src/config/validate.rs

use crate::config::model::{BackendConfig, EnvVarSource, RawWrapperConfig, WrapperConfig};
use crate::errors::{Result, WrapperError};

impl TryFrom<RawWrapperConfig> for WrapperConfig {
    type Error = WrapperError;

    fn try_from(raw: RawWrapperConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(WrapperConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawWrapperConfig) -> Result<()> {
    validate_envvars(cfg)?;
    validate_backend(cfg)?;
    validate_execution(cfg)?;
    Ok(())
}

fn validate_envvars(cfg: &RawWrapperConfig) -> Result<()> {
    for (name, source) in cfg.envvars.iter() {
        if name.is_empty() || name.contains('=') || name.contains('\0') {
            return Err(WrapperError::ConfigError(format!(
                "invalid environment variable name '{}'",
                name
            )));
        }
        if let EnvVarSource::Ssm { path } = source {
            if path.trim().is_empty() {
                return Err(WrapperError::ConfigError(format!(
                    "envvar '{}' uses source = \"ssm\" but has an empty path",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_backend(cfg: &RawWrapperConfig) -> Result<()> {
    let Some(backend) = &cfg.backend else {
        return Ok(());
    };

    let (field, value) = match backend {
        BackendConfig::S3 { bucket, .. } | BackendConfig::Gcs { bucket, .. } => ("bucket", bucket),
        BackendConfig::Http { address, .. } => ("address", address),
    };

    if value.trim().is_empty() {
        return Err(WrapperError::ConfigError(format!(
            "[backend] of type \"{}\" requires a non-empty `{}`",
            backend.kind(),
            field
        )));
    }

    if let BackendConfig::S3 { region, .. } = backend {
        if region.trim().is_empty() {
            return Err(WrapperError::ConfigError(
                "[backend] of type \"s3\" requires a non-empty `region`".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_execution(cfg: &RawWrapperConfig) -> Result<()> {
    if cfg
        .execution
        .extra_retriable_errors
        .iter()
        .any(|phrase| phrase.is_empty())
    {
        return Err(WrapperError::ConfigError(
            "[execution].extra_retriable_errors must not contain empty strings".to_string(),
        ));
    }

    if let Some(url) = &cfg.execution.audit_url {
        if url.trim().is_empty() {
            return Err(WrapperError::ConfigError(
                "[execution].audit_url must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<WrapperConfig> {
        let raw: RawWrapperConfig = toml::from_str(toml_src)?;
        WrapperConfig::try_from(raw)
    }

    #[test]
    fn empty_file_is_valid() {
        let cfg = parse("").unwrap();
        assert!(cfg.configure_backend);
        assert!(cfg.pipeline_check);
        assert!(cfg.envvars.is_empty());
        assert!(cfg.backend.is_none());
    }

    #[test]
    fn empty_ssm_path_is_rejected() {
        let err = parse(
            r#"
[envvars.TOKEN]
source = "ssm"
path = " "
"#,
        )
        .unwrap_err();
        assert!(matches!(err, WrapperError::ConfigError(msg) if msg.contains("TOKEN")));
    }

    #[test]
    fn envvar_name_with_equals_is_rejected() {
        let err = parse(
            r#"
[envvars."A=B"]
source = "unset"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, WrapperError::ConfigError(_)));
    }

    #[test]
    fn backend_requires_bucket() {
        let err = parse(
            r#"
[backend]
type = "gcs"
bucket = ""
"#,
        )
        .unwrap_err();
        assert!(matches!(err, WrapperError::ConfigError(msg) if msg.contains("bucket")));
    }

    #[test]
    fn empty_extra_phrase_is_rejected() {
        let err = parse(
            r#"
[execution]
extra_retriable_errors = ["Rate exceeded", ""]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, WrapperError::ConfigError(_)));
    }
}

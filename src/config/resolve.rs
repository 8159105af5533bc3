// src/config/resolve.rs

//! Turns configured environment-variable sources into concrete values.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{bail, Context};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::model::EnvVarSource;
use crate::errors::{Result, WrapperError};

/// Source of secret parameters referenced by `source = "ssm"` entries.
pub trait ParameterStore: Send + Sync + Debug {
    fn get_parameter<'a>(
        &'a self,
        path: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

/// Parameter store that shells out to the AWS CLI.
#[derive(Debug, Clone, Default)]
pub struct AwsCliParameterStore;

impl ParameterStore for AwsCliParameterStore {
    fn get_parameter<'a>(
        &'a self,
        path: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let output = Command::new("aws")
                .args(["ssm", "get-parameter", "--with-decryption", "--name", path])
                .args(["--output", "json"])
                .stdin(Stdio::null())
                .output()
                .await
                .context("running `aws ssm get-parameter`")?;

            if !output.status.success() {
                bail!(
                    "aws ssm get-parameter exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }

            let reply: serde_json::Value = serde_json::from_slice(&output.stdout)
                .context("parsing `aws ssm get-parameter` output")?;
            match reply.pointer("/Parameter/Value").and_then(serde_json::Value::as_str) {
                Some(value) => Ok(value.to_string()),
                None => bail!("`aws ssm get-parameter` reply has no Parameter.Value"),
            }
        })
    }
}

/// Resolve every configured variable. `Unset` entries resolve to `None`.
pub async fn resolve_envvars(
    envvars: &BTreeMap<String, EnvVarSource>,
    store: &dyn ParameterStore,
) -> Result<BTreeMap<String, Option<String>>> {
    let mut resolved = BTreeMap::new();

    for (name, source) in envvars.iter() {
        let value = match source {
            EnvVarSource::Text { value } => Some(value.clone()),
            EnvVarSource::Unset => None,
            EnvVarSource::Ssm { path } => {
                debug!(envvar = %name, path = %path, "resolving envvar from SSM");
                let value = store.get_parameter(path).await.map_err(|err| {
                    WrapperError::EnvResolution {
                        name: name.clone(),
                        message: format!("{err:#}"),
                    }
                })?;
                Some(value)
            }
        };
        resolved.insert(name.clone(), value);
    }

    Ok(resolved)
}

/// Overlay `resolved` on top of `base`. A `None` in `resolved` hides the
/// base value so the variable is removed from the child environment.
pub fn merge_environment<I>(
    base: I,
    resolved: BTreeMap<String, Option<String>>,
) -> BTreeMap<String, Option<String>>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: BTreeMap<String, Option<String>> =
        base.into_iter().map(|(k, v)| (k, Some(v))).collect();
    env.extend(resolved);
    env
}

/// Keep the UTF-8 entries of an inherited environment.
///
/// The child receives a replacement environment of `String`s, so entries whose
/// name or value is not valid UTF-8 cannot be passed on. Each one is logged
/// at warn level and its (lossily decoded) name is returned alongside.
pub fn utf8_environment<I>(vars: I) -> (Vec<(String, String)>, Vec<String>)
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut kept = Vec::new();
    let mut dropped = Vec::new();

    for (key, value) in vars {
        match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => kept.push((key, value)),
            (Ok(key), Err(_)) => dropped.push(key),
            (Err(key), _) => dropped.push(key.to_string_lossy().into_owned()),
        }
    }

    for name in &dropped {
        warn!(
            envvar = %name,
            "not passing inherited environment variable with non-UTF-8 name or value"
        );
    }

    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct MapStore(HashMap<String, String>);

    impl ParameterStore for MapStore {
        fn get_parameter<'a>(
            &'a self,
            path: &'a str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            Box::pin(async move {
                match self.0.get(path) {
                    Some(v) => Ok(v.clone()),
                    None => bail!("ParameterNotFound: {path}"),
                }
            })
        }
    }

    fn store() -> MapStore {
        MapStore(HashMap::from([(
            "/team/token".to_string(),
            "s3cr3t".to_string(),
        )]))
    }

    #[tokio::test]
    async fn resolves_every_variant() {
        let envvars = BTreeMap::from([
            (
                "TOKEN".to_string(),
                EnvVarSource::Ssm {
                    path: "/team/token".to_string(),
                },
            ),
            (
                "REGION".to_string(),
                EnvVarSource::Text {
                    value: "us-east-1".to_string(),
                },
            ),
            ("TF_LOG".to_string(), EnvVarSource::Unset),
        ]);

        let resolved = resolve_envvars(&envvars, &store()).await.unwrap();
        assert_eq!(resolved["TOKEN"].as_deref(), Some("s3cr3t"));
        assert_eq!(resolved["REGION"].as_deref(), Some("us-east-1"));
        assert_eq!(resolved["TF_LOG"], None);
    }

    #[tokio::test]
    async fn missing_parameter_names_the_variable() {
        let envvars = BTreeMap::from([(
            "DB_PASSWORD".to_string(),
            EnvVarSource::Ssm {
                path: "/missing".to_string(),
            },
        )]);

        let err = resolve_envvars(&envvars, &store()).await.unwrap_err();
        match err {
            WrapperError::EnvResolution { name, message } => {
                assert_eq!(name, "DB_PASSWORD");
                assert!(message.contains("ParameterNotFound"));
            }
            other => panic!("expected EnvResolution, got {other:?}"),
        }
    }

    #[test]
    fn unset_hides_inherited_value() {
        let base = vec![
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("TF_LOG".to_string(), "DEBUG".to_string()),
        ];
        let resolved = BTreeMap::from([
            ("TF_LOG".to_string(), None),
            ("REGION".to_string(), Some("eu-west-1".to_string())),
        ]);

        let env = merge_environment(base, resolved);
        assert_eq!(env["PATH"].as_deref(), Some("/usr/bin"));
        assert_eq!(env["TF_LOG"], None);
        assert_eq!(env["REGION"].as_deref(), Some("eu-west-1"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_inherited_entries_are_reported() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("PATH"), OsString::from("/usr/bin")),
            (OsString::from("BINARY"), OsString::from_vec(vec![b'a', 0xFF])),
            (OsString::from_vec(vec![b'K', 0xFE]), OsString::from("v")),
        ];

        let (kept, dropped) = utf8_environment(vars);
        assert_eq!(kept, vec![("PATH".to_string(), "/usr/bin".to_string())]);
        assert_eq!(dropped, vec!["BINARY".to_string(), "K\u{FFFD}".to_string()]);
    }
}

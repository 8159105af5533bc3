// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawWrapperConfig, WrapperConfig};
use crate::errors::Result;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".tf_wrapper";

/// Load a configuration file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWrapperConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawWrapperConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WrapperConfig> {
    let raw_config = load_from_path(&path)?;
    let config = WrapperConfig::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing file yields the default config.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<WrapperConfig> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = ?path, "no wrapper config found; using defaults");
        return Ok(WrapperConfig::default());
    }
    load_and_validate(path)
}

/// `<dir>/.tf_wrapper`
pub fn default_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

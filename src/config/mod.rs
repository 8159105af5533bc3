// src/config/mod.rs

//! Wrapper configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a `.tf_wrapper` file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//! - Resolve environment-variable sources into values (`resolve.rs`).

pub mod loader;
pub mod model;
pub mod resolve;
pub mod validate;

pub use loader::{
    default_config_path, load_and_validate, load_from_path, load_or_default, CONFIG_FILE_NAME,
};
pub use model::{BackendConfig, EnvVarSource, ExecutionSection, RawWrapperConfig, WrapperConfig};
pub use resolve::{
    merge_environment, resolve_envvars, utf8_environment, AwsCliParameterStore, ParameterStore,
};

//! Materializer configuration.
//!
//! Parsed from TOML; every table and key is optional and unknown keys are
//! rejected.
//!
//! ```toml
//! debug = true
//! merge_option = "no_tracking"
//! mode = "records"
//!
//! [plan_cache]
//! enabled = false
//! ```

use crate::{
    element::MergeOption,
    error::{ErrorClass, ErrorOrigin, InternalError},
    plan::MaterializeMode,
};
use serde::Deserialize;
use thiserror::Error as ThisError;

///
/// MaterializerConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MaterializerConfig {
    pub debug: bool,
    pub merge_option: MergeOption,
    pub mode: MaterializeMode,
    pub plan_cache: PlanCacheConfig,
}

impl MaterializerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

///
/// PlanCacheConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlanCacheConfig {
    /// When false every `compile` call builds a fresh plan.
    pub enabled: bool,
}

impl Default for PlanCacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("invalid materializer config: {0}")]
    Parse(String),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Config, err.to_string())
    }
}

///
/// TESTS
///

//! `[reference]` section configuration.
//!
//! Names the generated script whose source-map reference must be repaired
//! after fingerprinting, and its companion map file.
//!
//! # Example
//!
//! ```toml
//! [reference]
//! artifact = "js/out/main.js"
//! map = "js/out/main.js.map"
//! separator = "\\"            # Rewritten to "/" inside the map's `sources`
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::utils::path::logical_file_name;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Logical path of the generated script.
    pub artifact: String,

    /// Logical path of its debug map file.
    pub map: String,

    /// Separator artifact replaced by `/` in the map's `sources`.
    pub separator: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            artifact: "js/out/main.js".into(),
            map: "js/out/main.js.map".into(),
            separator: "\\".into(),
        }
    }
}

impl ReferenceConfig {
    /// Literal map reference embedded in the artifact (the map's file name).
    pub fn map_reference(&self) -> &str {
        logical_file_name(&self.map)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.artifact.trim().is_empty() || self.map.trim().is_empty() {
            return Err(ConfigError::Validation(
                "`reference.artifact` and `reference.map` must both be set".into(),
            ));
        }
        if self.artifact == self.map {
            return Err(ConfigError::Validation(
                "`reference.artifact` and `reference.map` name the same file".into(),
            ));
        }
        if self.separator.is_empty() {
            return Err(ConfigError::Validation(
                "`reference.separator` must not be empty".into(),
            ));
        }
        Ok(())
    }
}

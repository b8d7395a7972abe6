//! `[compress]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compress]
//! enable = true
//! level = 19      # zstd level, 1..=22
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Extension appended to compressed siblings.
pub const COMPRESSED_EXTENSION: &str = "zst";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Write a compressed sibling for every published file.
    pub enable: bool,

    /// zstd compression level.
    pub level: i32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            enable: true,
            level: 19,
        }
    }
}

impl CompressConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=22).contains(&self.level) {
            return Err(ConfigError::InvalidCompressLevel(self.level));
        }
        Ok(())
    }
}

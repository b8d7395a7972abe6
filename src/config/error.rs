//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
///
/// Always detected before the pipeline mutates anything on disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("missing destination host (pass --host or set `publish.host`)")]
    MissingHost,

    #[error("invalid destination host `{0}`: {1}")]
    InvalidHost(String, String),

    #[error("invalid glob pattern `{pattern}` in `{field}`")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("`publish.hash_length` must be between {min} and {max}, got {value}")]
    InvalidHashLength { value: usize, min: usize, max: usize },

    #[error("`compress.level` must be between 1 and 22, got {0}")]
    InvalidCompressLevel(i32),

    #[error("config validation error: {0}")]
    Validation(String),
}

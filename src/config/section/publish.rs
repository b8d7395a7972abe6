//! `[publish]` section configuration.
//!
//! Controls which assets are published and how they are renamed.
//!
//! # Example
//!
//! ```toml
//! [publish]
//! host = "cdn.example.com"      # Required (or --host)
//! cdn_path = "cdn"              # → //cdn.example.com/cdn/<published>
//! hash_length = 8
//! include = ["js/**", "css/**", "images/**", "fonts/**"]
//! ignore = ["*.map"]
//! extra = ["js/out/main.js.map"]
//! dont_rename = ["robots.txt"]
//! dont_search = ["*.js"]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, PatternSet};
use crate::utils::hash::{MAX_FINGERPRINT_LEN, MIN_FINGERPRINT_LEN};

/// Asset selection and naming settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSection {
    /// Destination host the published assets are served from.
    pub host: Option<String>,

    /// URL path segment between the host and the published path.
    pub cdn_path: String,

    /// Hex characters of the content hash used in file names.
    pub hash_length: usize,

    /// Globs (relative to `paths.root`) selecting assets to publish.
    pub include: Vec<String>,

    /// Globs removing files from the `include` selection.
    pub ignore: Vec<String>,

    /// Individual files published even if `ignore` matches them.
    pub extra: Vec<String>,

    /// Globs for assets copied under their unchanged name.
    pub dont_rename: Vec<String>,

    /// Globs for text assets never searched for references.
    pub dont_search: Vec<String>,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            host: None,
            cdn_path: "cdn".into(),
            hash_length: MIN_FINGERPRINT_LEN,
            include: ["js/**", "css/**", "images/**", "fonts/**"]
                .map(String::from)
                .to_vec(),
            ignore: vec!["*.map".into()],
            extra: vec!["js/out/main.js.map".into()],
            dont_rename: vec![],
            dont_search: vec!["*.js".into()],
        }
    }
}

/// Compiled glob sets of the `[publish]` section.
#[derive(Debug, Clone)]
pub struct PublishPatterns {
    pub include: PatternSet,
    pub ignore: PatternSet,
    pub dont_rename: PatternSet,
    pub dont_search: PatternSet,
}

impl PublishSection {
    /// Compile every glob list, failing on the first malformed pattern.
    pub fn patterns(&self) -> Result<PublishPatterns, ConfigError> {
        Ok(PublishPatterns {
            include: PatternSet::compile("publish.include", &self.include)?,
            ignore: PatternSet::compile("publish.ignore", &self.ignore)?,
            dont_rename: PatternSet::compile("publish.dont_rename", &self.dont_rename)?,
            dont_search: PatternSet::compile("publish.dont_search", &self.dont_search)?,
        })
    }

    /// Check numeric ranges and pattern syntax.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_FINGERPRINT_LEN..=MAX_FINGERPRINT_LEN).contains(&self.hash_length) {
            return Err(ConfigError::InvalidHashLength {
                value: self.hash_length,
                min: MIN_FINGERPRINT_LEN,
                max: MAX_FINGERPRINT_LEN,
            });
        }
        if self.include.is_empty() && self.extra.is_empty() {
            return Err(ConfigError::Validation(
                "`publish.include` and `publish.extra` are both empty, nothing to publish".into(),
            ));
        }
        self.patterns().map(|_| ())
    }

    /// URL prefix for references rewritten inside text assets.
    ///
    /// `//cdn.example.com/cdn/`, or `//cdn.example.com/` with an empty `cdn_path`.
    pub fn url_prefix(&self, host: &str) -> String {
        let path = self.cdn_path.trim_matches('/');
        if path.is_empty() {
            format!("//{host}/")
        } else {
            format!("//{host}/{path}/")
        }
    }
}

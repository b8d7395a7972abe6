//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! root = "resources/public"                 # Built assets (source of the publish)
//! output = "resources/public/cdn"           # Publish root, wiped on every run
//! manifest = "resources/rev-manifest.json"  # Logical → published name mapping
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path::resolve_path;

/// Filesystem locations used by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the already-built asset tree. Manifest keys are relative to it.
    pub root: PathBuf,

    /// Publish root receiving the fingerprinted copies.
    pub output: PathBuf,

    /// Location of the manifest document.
    pub manifest: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: "resources/public".into(),
            output: "resources/public/cdn".into(),
            manifest: "resources/rev-manifest.json".into(),
        }
    }
}

impl PathsConfig {
    /// Anchor all relative paths at `base` (the config file's directory).
    pub fn normalize(&mut self, base: &Path) {
        self.root = resolve_path(&self.root, base);
        self.output = resolve_path(&self.output, base);
        self.manifest = resolve_path(&self.manifest, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_absolute() {
        let mut paths = PathsConfig {
            root: "/srv/public".into(),
            ..Default::default()
        };
        paths.normalize(Path::new("/project"));
        assert_eq!(paths.root, PathBuf::from("/srv/public"));
        assert_eq!(paths.output, PathBuf::from("/project/resources/public/cdn"));
        assert_eq!(
            paths.manifest,
            PathBuf::from("/project/resources/rev-manifest.json")
        );
    }

    #[test]
    fn test_default_output_is_nested() {
        let mut paths = PathsConfig::default();
        paths.normalize(Path::new("/project"));
        assert!(paths.output.starts_with(&paths.root));
    }
}

//! Logical → published name mapping.
//!
//! The manifest is the only state passed between stages: the fingerprint
//! stage returns it, the repair stage takes it as an argument, and it is
//! persisted as one flat JSON object:
//!
//! ```json
//! {
//!   "css/site.css": "css/site-3f2a91c0.css",
//!   "js/out/main.js": "js/out/main-8be1d2aa.js",
//!   "js/out/main.js.map": "js/out/main-07c4e5f9.js.map"
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::error::{PublishError, PublishResult, Stage};

/// One fingerprinted (or kept) asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub logical: String,
    pub published: String,
}

impl ManifestEntry {
    pub fn new(logical: impl Into<String>, published: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            published: published.into(),
        }
    }

    /// Whether the asset kept its logical name (excluded from renaming).
    pub fn is_kept(&self) -> bool {
        self.logical == self.published
    }
}

/// Accumulates entries emitted by parallel workers, validated once in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    entries: Vec<ManifestEntry>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Build the manifest, rejecting duplicate keys and colliding published paths.
    pub fn build(self) -> PublishResult<Manifest> {
        let stage = Stage::Fingerprint;
        let mut entries = BTreeMap::new();
        let mut owners: FxHashMap<String, String> = FxHashMap::default();

        for ManifestEntry { logical, published } in self.entries {
            if let Some(prev) = owners.get(&published) {
                return Err(PublishError::integrity(
                    stage,
                    format!("`{prev}` and `{logical}` would both publish to `{published}`"),
                ));
            }
            owners.insert(published.clone(), logical.clone());

            if entries.insert(logical.clone(), published).is_some() {
                return Err(PublishError::integrity(
                    stage,
                    format!("asset `{logical}` was fingerprinted twice"),
                ));
            }
        }

        Ok(Manifest { entries })
    }
}

impl Extend<ManifestEntry> for ManifestBuilder {
    fn extend<I: IntoIterator<Item = ManifestEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

/// Flat, key-sorted mapping from logical path to published path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    /// Look up an entry the caller cannot proceed without.
    pub fn resolve(&self, logical: &str, stage: Stage) -> PublishResult<&str> {
        self.get(logical).ok_or_else(|| {
            PublishError::integrity(stage, format!("manifest has no entry for `{logical}`"))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> String {
        // BTreeMap<String, String> serialization cannot fail
        serde_json::to_string_pretty(&self.entries).unwrap_or_default()
    }

    /// Persist atomically: write a sibling temp file, then rename over `path`.
    ///
    /// A reader sees either the previous manifest, no manifest, or the
    /// complete new one.
    pub fn write(&self, path: &Path, stage: Stage) -> PublishResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(PublishError::io(stage, parent))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(parent).map_err(PublishError::io(stage, parent))?;
        let tmp_path = tmp.path().to_path_buf();

        let mut json = self.to_json();
        json.push('\n');
        tmp.write_all(json.as_bytes())
            .map_err(PublishError::io(stage, &tmp_path))?;
        tmp.as_file()
            .sync_all()
            .map_err(PublishError::io(stage, &tmp_path))?;

        tmp.persist(path)
            .map_err(|e| PublishError::io(stage, path)(e.error))?;

        crate::debug!("manifest"; "wrote {} entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Load a persisted manifest, requiring a flat string → string object.
    pub fn load(path: &Path, stage: Stage) -> PublishResult<Self> {
        let json = fs::read_to_string(path).map_err(PublishError::io(stage, path))?;
        serde_json::from_str(&json).map_err(|e| {
            PublishError::integrity(
                stage,
                format!("`{}` is not a flat manifest object: {e}", path.display()),
            )
        })
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::ErrorKind;
    use tempfile::TempDir;

    fn sample() -> Manifest {
        let mut builder = ManifestBuilder::new();
        builder.push(ManifestEntry::new("js/app.js", "js/app-aaaaaaaa.js"));
        builder.push(ManifestEntry::new("css/site.css", "css/site-bbbbbbbb.css"));
        builder.push(ManifestEntry::new("robots.txt", "robots.txt"));
        builder.build().unwrap()
    }

    #[test]
    fn test_build_and_lookup() {
        let manifest = sample();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.get("js/app.js"), Some("js/app-aaaaaaaa.js"));
        assert_eq!(manifest.get("robots.txt"), Some("robots.txt"));
        assert_eq!(manifest.get("missing.js"), None);

        // sorted keys
        let keys: Vec<_> = manifest.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["css/site.css", "js/app.js", "robots.txt"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut builder = ManifestBuilder::new();
        builder.push(ManifestEntry::new("a.js", "a-11111111.js"));
        builder.push(ManifestEntry::new("a.js", "a-22222222.js"));
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_published_collision_rejected() {
        // a kept file whose literal name equals another asset's hashed name
        let mut builder = ManifestBuilder::new();
        builder.push(ManifestEntry::new("a.js", "a-11111111.js"));
        builder.push(ManifestEntry::new("a-11111111.js", "a-11111111.js"));
        let err = builder.build().unwrap_err();
        assert!(format!("{err}").contains("would both publish"));
    }

    #[test]
    fn test_resolve_miss_is_integrity_error() {
        let err = Manifest::default()
            .resolve("js/out/main.js", Stage::RepairArtifactReference)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert_eq!(err.stage(), Some(Stage::RepairArtifactReference));
    }

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resources/rev-manifest.json");
        let manifest = sample();

        manifest.write(&path, Stage::Fingerprint).unwrap();
        let loaded = Manifest::load(&path, Stage::Verify).unwrap();
        assert_eq!(loaded, manifest);

        // no temp files left next to the manifest
        let siblings = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(siblings, 1);
    }

    #[test]
    fn test_write_replaces_previous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rev-manifest.json");
        fs::write(&path, "{\"stale.js\": \"stale-00000000.js\"}").unwrap();

        sample().write(&path, Stage::Fingerprint).unwrap();
        let loaded = Manifest::load(&path, Stage::Verify).unwrap();
        assert_eq!(loaded.get("stale.js"), None);
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_load_rejects_nested_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rev-manifest.json");
        fs::write(&path, r#"{"a.js": {"nested": true}}"#).unwrap();

        let err = Manifest::load(&path, Stage::Verify).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }
}

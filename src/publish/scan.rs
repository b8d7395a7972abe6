//! Asset selection (read-only).
//!
//! Walks the source root and picks the files to publish:
//!
//! ```text
//! resources/public/
//! ├── css/site.css          include "css/**"         → published
//! ├── js/out/main.js        include "js/**"          → published
//! ├── js/out/main.js.map    ignore "*.map", extra    → published
//! ├── js/out/goog/base.js.map  ignore "*.map"        → skipped
//! └── cdn/...               output root              → always skipped
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::error::{PublishError, PublishResult, Stage};
use crate::config::PatternSet;
use crate::utils::path::{is_file_following_links, logical_path, normalize_logical};

/// Media category, only used for inclusion and search rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Script,
    Style,
    Image,
    Font,
    Map,
    Other,
}

impl AssetCategory {
    /// Classify by the final extension of a file name.
    pub fn from_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "js" | "mjs" | "cjs" => Self::Script,
            "css" => Self::Style,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" | "bmp" => {
                Self::Image
            }
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Self::Font,
            "map" => Self::Map,
            _ => Self::Other,
        }
    }
}

/// A file under the source root selected for publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Forward-slashed path relative to the source root (manifest key).
    pub logical: String,
    /// Absolute path of the built file.
    pub source: PathBuf,
    pub category: AssetCategory,
}

impl Asset {
    pub fn new(logical: String, source: PathBuf) -> Self {
        let category = AssetCategory::from_name(&logical);
        Self {
            logical,
            source,
            category,
        }
    }
}

/// Selection rules for [`select_assets`].
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub root: &'a Path,
    /// Publish root; never selected even when nested inside `root`.
    pub output: &'a Path,
    pub include: &'a PatternSet,
    pub ignore: &'a PatternSet,
    /// Files published regardless of `ignore` (must exist).
    pub extra: &'a [String],
}

/// Collect the assets to publish, sorted by logical path.
///
/// Walk failures and missing `extra` files are IO errors of the
/// fingerprint stage.
pub fn select_assets(selection: &Selection<'_>) -> PublishResult<Vec<Asset>> {
    let stage = Stage::Fingerprint;
    let root = selection.root;

    let meta = std::fs::metadata(root).map_err(PublishError::io(stage, root))?;
    if !meta.is_dir() {
        return Err(PublishError::io(stage, root)(io::Error::new(
            io::ErrorKind::NotADirectory,
            "source root is not a directory",
        )));
    }

    let mut selected: BTreeMap<String, Asset> = BTreeMap::new();

    for entry in WalkDir::new(root).sort(true).skip_hidden(false) {
        let entry = entry.map_err(|e| PublishError::io(stage, root)(io::Error::other(e.to_string())))?;
        let path = entry.path();
        if path.starts_with(selection.output) {
            continue;
        }

        // symlinked files are published with their target's content
        let is_file = is_file_following_links(&path, entry.file_type())
            .map_err(PublishError::io(stage, &path))?;
        if !is_file {
            continue;
        }

        let logical = logical_path(&path, root).ok_or_else(|| {
            PublishError::integrity(
                stage,
                format!("cannot derive a logical path for `{}`", path.display()),
            )
        })?;

        if selection.include.matches(&logical) && !selection.ignore.matches(&logical) {
            selected.insert(logical.clone(), Asset::new(logical, path));
        }
    }

    for extra in selection.extra {
        let logical = normalize_logical(extra).filter(|l| !l.is_empty()).ok_or_else(|| {
            PublishError::integrity(stage, format!("extra asset `{extra}` escapes the source root"))
        })?;
        let source = root.join(&logical);
        if !source.is_file() {
            return Err(PublishError::io(stage, &source)(io::Error::new(
                io::ErrorKind::NotFound,
                "extra asset not found",
            )));
        }
        selected
            .entry(logical.clone())
            .or_insert_with(|| Asset::new(logical, source));
    }

    Ok(selected.into_values().collect())
}

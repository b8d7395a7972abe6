//! Literal reference rewriting in text assets.
//!
//! - [`normalize_map`] canonicalizes separators inside the map file's
//!   `sources` before fingerprinting.
//! - [`repair_artifact`] points the published generated script at the
//!   fingerprinted map file, resolved through the manifest.
//! - [`rewrite_stylesheet`] replaces `url(...)` / `@import` targets in a
//!   stylesheet with CDN-prefixed fingerprinted URLs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use super::error::{PublishError, PublishResult, Stage};
use super::manifest::Manifest;
use crate::config::ReferenceConfig;
use crate::utils::path::{
    logical_file_name, logical_parent, normalize_logical,
    route::{is_external_link, split_path_suffix},
};

// ============================================================================
// Map normalization
// ============================================================================

/// Replace `separator` with `/` in every `sources` entry of the map at `path`.
///
/// Returns whether the file was rewritten. The file is left untouched when
/// nothing needed normalizing.
pub fn normalize_map(path: &Path, separator: &str) -> PublishResult<bool> {
    let stage = Stage::NormalizeMapReference;
    let text = fs::read_to_string(path).map_err(PublishError::io(stage, path))?;

    let mut map: Value = serde_json::from_str(&text).map_err(|e| {
        PublishError::integrity(stage, format!("`{}` is not valid JSON: {e}", path.display()))
    })?;

    let sources = map
        .get_mut("sources")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| {
            PublishError::integrity(
                stage,
                format!("`{}` has no `sources` array", path.display()),
            )
        })?;

    let mut changed = 0usize;
    for source in sources.iter_mut() {
        if let Value::String(s) = source
            && s.contains(separator)
        {
            *s = s.replace(separator, "/");
            changed += 1;
        }
    }

    if changed == 0 {
        crate::debug!("normalize"; "{} already canonical", path.display());
        return Ok(false);
    }

    let json = serde_json::to_string(&map).map_err(|e| {
        PublishError::integrity(stage, format!("cannot serialize `{}`: {e}", path.display()))
    })?;
    fs::write(path, json).map_err(PublishError::io(stage, path))?;

    crate::debug!("normalize"; "rewrote {} source path(s) in {}", changed, path.display());
    Ok(true)
}

// ============================================================================
// Artifact repair
// ============================================================================

/// Result of a successful artifact repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Published artifact that was rewritten.
    pub artifact: PathBuf,
    /// Reference text before repair (original map file name).
    pub from: String,
    /// Reference text after repair (fingerprinted map file name).
    pub to: String,
}

/// Rewrite the published artifact's map reference using the manifest.
///
/// Fails when the manifest lacks the artifact or the map, and when the
/// original map name does not occur exactly once in the artifact.
pub fn repair_artifact(
    manifest: &Manifest,
    output: &Path,
    reference: &ReferenceConfig,
) -> PublishResult<RepairOutcome> {
    let stage = Stage::RepairArtifactReference;

    let published_artifact = manifest.resolve(&reference.artifact, stage)?;
    let published_map = manifest.resolve(&reference.map, stage)?;

    let from = reference.map_reference().to_string();
    let to = logical_file_name(published_map).to_string();

    let artifact = output.join(published_artifact);
    let text = fs::read_to_string(&artifact).map_err(PublishError::io(stage, &artifact))?;

    let occurrences = text.matches(from.as_str()).count();
    if occurrences != 1 {
        return Err(PublishError::integrity(
            stage,
            format!(
                "expected exactly one reference to `{from}` in `{published_artifact}`, found {occurrences}"
            ),
        ));
    }

    if from != to {
        fs::write(&artifact, text.replacen(from.as_str(), &to, 1))
            .map_err(PublishError::io(stage, &artifact))?;
    }

    crate::debug!("repair"; "{}: {} -> {}", published_artifact, from, to);
    Ok(RepairOutcome { artifact, from, to })
}

// ============================================================================
// Stylesheet references
// ============================================================================

/// `url(...)` with optional quotes.
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(['"]?)([^'")\s]+)(['"]?)\s*\)"#).expect("valid url() regex")
});

/// `@import "..."` without `url(...)`.
static CSS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(['"])([^'"]+)(['"])"#).expect("valid @import regex")
});

/// Resolve a stylesheet reference to the logical path of its target.
///
/// Root-relative references (`/images/a.png`) resolve from the source root,
/// others from the stylesheet's directory. External and `data:` references
/// resolve to `None`.
pub fn resolve_reference(stylesheet: &str, target: &str) -> Option<String> {
    if target.is_empty() || target.starts_with('#') || is_external_link(target) {
        return None;
    }
    let joined = if target.starts_with('/') {
        target.to_string()
    } else {
        format!("{}/{}", logical_parent(stylesheet), target)
    };
    normalize_logical(&joined).filter(|p| !p.is_empty())
}

/// Logical paths of every local asset `css` references, in order of appearance.
pub fn stylesheet_references(css: &str, stylesheet: &str) -> Vec<String> {
    CSS_URL
        .captures_iter(css)
        .chain(CSS_IMPORT.captures_iter(css))
        .filter_map(|caps| {
            let (path, _) = split_path_suffix(&caps[2]);
            resolve_reference(stylesheet, path)
        })
        .collect()
}

/// Rewrite references in `css` to `<prefix><published>`.
///
/// `lookup` maps a logical path to its published path; unknown targets are
/// left as written. Returns the new text and the number of rewritten references.
pub fn rewrite_stylesheet<'a>(
    css: &str,
    stylesheet: &str,
    prefix: &str,
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> (String, usize) {
    let mut count = 0usize;

    let mut replace = |caps: &Captures<'_>, open: &str, close: &str, wrap: fn(&str) -> String| {
        let target = &caps[2];
        let (path, suffix) = split_path_suffix(target);
        match resolve_reference(stylesheet, path).and_then(|logical| lookup(&logical)) {
            Some(published) => {
                count += 1;
                wrap(&format!("{open}{prefix}{published}{suffix}{close}"))
            }
            None => caps[0].to_string(),
        }
    };

    let css = CSS_URL.replace_all(css, |caps: &Captures<'_>| {
        let (open, close) = (caps[1].to_string(), caps[3].to_string());
        replace(caps, &open, &close, |inner| format!("url({inner})"))
    });
    let css = CSS_IMPORT
        .replace_all(&css, |caps: &Captures<'_>| {
            let (open, close) = (caps[1].to_string(), caps[3].to_string());
            replace(caps, &open, &close, |inner| format!("@import {inner}"))
        })
        .into_owned();

    (css, count)
}

//! Filesystem path utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `resolve_path` - anchor a configured path at a base directory
//! - `logical_path` - forward-slashed path relative to a root (manifest keys)
//! - `normalize_logical` - collapse `.` and `..` segments in a logical path

use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve a configured path against a base directory.
///
/// Absolute paths are returned as-is.
///
/// # Example
/// ```ignore
/// let out = resolve_path(Path::new("resources/public/cdn"), project_root);
/// ```
#[inline]
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Convert `path` into a forward-slashed path relative to `root`.
///
/// Returns `None` when `path` is not inside `root` or is not valid UTF-8.
///
/// # Example
/// ```ignore
/// logical_path(Path::new("/site/public/js/app.js"), Path::new("/site/public"))
///     -> Some("js/app.js")
/// ```
pub fn logical_path(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Collapse `.` and `..` segments of a forward-slashed logical path.
///
/// Returns `None` when the path climbs above its root.
///
/// # Example
/// ```ignore
/// normalize_logical("css/../images/./logo.png") -> Some("images/logo.png")
/// normalize_logical("../secret")                -> None
/// ```
pub fn normalize_logical(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Whether a walked entry is a regular file, following a symlink to its target.
///
/// A dangling symlink is an error rather than a skipped entry.
pub fn is_file_following_links(path: &Path, file_type: std::fs::FileType) -> io::Result<bool> {
    if file_type.is_symlink() {
        Ok(std::fs::metadata(path)?.is_file())
    } else {
        Ok(file_type.is_file())
    }
}

/// Parent directory of a logical path (`""` for top-level files).
#[inline]
pub fn logical_parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// File name part of a logical path.
#[inline]
pub fn logical_file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

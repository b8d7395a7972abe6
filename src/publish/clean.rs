//! Removal of the previous publish.

use std::fs;
use std::io;
use std::path::Path;

use super::error::{PublishError, PublishResult, Stage};

/// What the clean stage found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cleaned {
    pub output_removed: bool,
    pub manifest_removed: bool,
}

/// Delete the publish root and the manifest. Absence is not an error.
pub fn clean(output: &Path, manifest: &Path) -> PublishResult<Cleaned> {
    let stage = Stage::Clean;

    let output_removed = ignore_missing(fs::remove_dir_all(output))
        .map_err(PublishError::io(stage, output))?;
    let manifest_removed = ignore_missing(fs::remove_file(manifest))
        .map_err(PublishError::io(stage, manifest))?;

    crate::debug!(
        "clean";
        "output removed: {}, manifest removed: {}",
        output_removed,
        manifest_removed
    );
    Ok(Cleaned {
        output_removed,
        manifest_removed,
    })
}

fn ignore_missing(result: io::Result<()>) -> io::Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_both() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("cdn");
        let manifest = dir.path().join("rev-manifest.json");
        fs::create_dir_all(output.join("js")).unwrap();
        fs::write(output.join("js/app-0011aabb.js"), "x").unwrap();
        fs::write(&manifest, "{}").unwrap();

        let cleaned = clean(&output, &manifest).unwrap();
        assert!(cleaned.output_removed && cleaned.manifest_removed);
        assert!(!output.exists());
        assert!(!manifest.exists());
    }

    #[test]
    fn test_clean_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let cleaned = clean(&dir.path().join("cdn"), &dir.path().join("m.json")).unwrap();
        assert_eq!(cleaned, Cleaned::default());
    }

    #[test]
    fn test_clean_leaves_siblings() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("cdn");
        fs::create_dir_all(&output).unwrap();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();

        clean(&output, &dir.path().join("m.json")).unwrap();
        assert!(dir.path().join("index.html").exists());
    }
}

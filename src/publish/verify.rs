//! Consistency check of a finished publish.
//!
//! Reads the persisted manifest and checks the publish root against it
//! without modifying anything.

use std::path::Path;

use super::compress::sibling_path;
use super::error::{PublishResult, Stage};
use super::manifest::Manifest;
use crate::config::{PublishConfig, ReferenceConfig};
use crate::utils::path::logical_file_name;

/// Outcome of [`verify`]. An empty `problems` list means the publish is sound.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Manifest entries examined.
    pub checked: usize,
    pub problems: Vec<String>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check the manifest at `paths.manifest` against `paths.output`.
///
/// A missing or malformed manifest is an error. Missing files and a stale
/// artifact reference are reported as problems.
pub fn verify(config: &PublishConfig) -> PublishResult<VerifyReport> {
    let manifest = Manifest::load(&config.paths.manifest, Stage::Verify)?;
    Ok(check(
        &manifest,
        &config.paths.output,
        &config.reference,
        config.compress.enable,
    ))
}

fn check(
    manifest: &Manifest,
    output: &Path,
    reference: &ReferenceConfig,
    compressed: bool,
) -> VerifyReport {
    let mut report = VerifyReport {
        checked: manifest.len(),
        ..Default::default()
    };

    for (logical, published) in manifest.iter() {
        let path = output.join(published);
        if !path.is_file() {
            report
                .problems
                .push(format!("`{logical}`: published file `{published}` is missing"));
            continue;
        }
        if compressed && !sibling_path(&path).is_file() {
            report
                .problems
                .push(format!("`{logical}`: compressed sibling of `{published}` is missing"));
        }
    }

    if let (Some(artifact), Some(map)) = (
        manifest.get(&reference.artifact),
        manifest.get(&reference.map),
    ) {
        let expected = logical_file_name(map);
        match std::fs::read_to_string(output.join(artifact)) {
            Ok(text) if text.contains(expected) => {}
            Ok(_) => report
                .problems
                .push(format!("`{artifact}` does not reference `{expected}`")),
            // already reported as missing above
            Err(_) => {}
        }
    }

    crate::debug!("verify"; "{} entries, {} problem(s)", report.checked, report.problems.len());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn reference() -> ReferenceConfig {
        ReferenceConfig {
            artifact: "app.js".into(),
            map: "app.js.map".into(),
            ..Default::default()
        }
    }

    fn manifest() -> Manifest {
        [
            ("app.js", "app-11111111.js"),
            ("app.js.map", "app-22222222.js.map"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_sound_publish() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app-11111111.js"),
            "x\n//# sourceMappingURL=app-22222222.js.map",
        )
        .unwrap();
        fs::write(dir.path().join("app-22222222.js.map"), "{}").unwrap();

        let report = check(&manifest(), dir.path(), &reference(), false);
        assert_eq!(report.checked, 2);
        assert!(report.is_ok(), "{:?}", report.problems);
    }

    #[test]
    fn test_reports_missing_and_stale() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app-11111111.js"),
            "x\n//# sourceMappingURL=app.js.map",
        )
        .unwrap();

        let report = check(&manifest(), dir.path(), &reference(), false);
        assert_eq!(report.problems.len(), 2);
        assert!(report.problems.iter().any(|p| p.contains("is missing")));
        assert!(report.problems.iter().any(|p| p.contains("does not reference")));
    }

    #[test]
    fn test_reports_missing_compressed_sibling() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a-11111111.png"), "png").unwrap();
        let manifest: Manifest = [("a.png".to_string(), "a-11111111.png".to_string())]
            .into_iter()
            .collect();

        let report = check(&manifest, dir.path(), &reference(), true);
        assert_eq!(report.problems.len(), 1);
        assert!(report.problems[0].contains("compressed sibling"));
    }

    #[test]
    fn test_missing_manifest_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut config = PublishConfig::default();
        config.finalize(dir.path());

        let err = verify(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.stage(), Some(Stage::Verify));
    }
}

//! `revpub publish`: run the full pipeline.

use anyhow::{Context, Result};

use crate::config::PublishConfig;
use crate::log;
use crate::publish::{ErrorKind, PublishError, PublishReport, Publisher, Stage};
use crate::utils::plural_count;

/// Publish the built asset tree described by `config`.
pub fn publish_assets(config: &PublishConfig, quiet: bool) -> Result<PublishReport> {
    let publisher = Publisher::new(config)
        .context("cannot start publish")?
        .quiet(quiet);

    if !quiet {
        log!(
            "publish";
            "{} -> {} (serving from {})",
            config.display_path(&config.paths.root),
            config.display_path(&config.paths.output),
            publisher.url_prefix()
        );
    }

    let report = match publisher.run() {
        Ok(report) => report,
        Err(err) => {
            log!("error"; "{}", recovery_hint(&err));
            return Err(err).context("publish failed");
        }
    };
    log_summary(config, &report);
    Ok(report)
}

/// What the user should do about a failed run.
fn recovery_hint(err: &PublishError) -> String {
    let stage = err.stage().map_or("startup", Stage::name);
    match err.kind() {
        ErrorKind::Config => "check revpub.toml and the command-line options".to_string(),
        ErrorKind::Io => format!("{stage} stopped on a filesystem error, re-run once it is fixed"),
        ErrorKind::Integrity => {
            format!("{stage} found inconsistent assets, the publish root is incomplete")
        }
    }
}

fn log_summary(config: &PublishConfig, report: &PublishReport) {
    crate::debug!(
        "publish";
        "map normalized: {}, {} -> {}, {} stylesheet reference(s) rewritten",
        report.map_normalized,
        report.repair.artifact.display(),
        report.repair.to,
        report.references
    );

    let compressed = report
        .compressed
        .map_or_else(|| "compression off".to_string(), |c| {
            format!("{} compressed", plural_count(c.files, "file"))
        });
    log!(
        "done";
        "{} published ({} renamed, {} kept), {}, manifest {} in {:.2?}",
        plural_count(report.assets(), "asset"),
        report.renamed,
        report.kept,
        compressed,
        config.display_path(&report.manifest_path),
        report.elapsed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_recovery_hint_names_stage() {
        let io = PublishError::io(Stage::Compress, "cdn/a.js")(io::Error::other("disk full"));
        assert!(recovery_hint(&io).starts_with("compress"));

        let integrity = PublishError::integrity(Stage::RepairArtifactReference, "found 0");
        assert!(recovery_hint(&integrity).contains("repair-reference"));

        let config: PublishError = crate::config::ConfigError::MissingHost.into();
        assert!(recovery_hint(&config).contains("revpub.toml"));
    }
}

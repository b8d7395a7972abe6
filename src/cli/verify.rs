//! `revpub verify`: check a previous publish against its manifest.

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;

use crate::config::PublishConfig;
use crate::log;
use crate::publish::verify;
use crate::utils::plural_count;

/// Verify the publish root, printing every problem found.
pub fn verify_publish(config: &PublishConfig, verbose: bool) -> Result<()> {
    crate::logger::set_verbose(verbose);

    let report = verify(config).with_context(|| {
        format!(
            "cannot read manifest {}",
            config.display_path(&config.paths.manifest)
        )
    })?;

    if report.is_ok() {
        log!("verify"; "{} consistent", plural_count(report.checked, "asset"));
        return Ok(());
    }

    eprintln!();
    for problem in &report.problems {
        eprintln!("  {} {}", "-".red(), problem);
    }
    eprintln!();

    bail!(
        "{} found in {}",
        plural_count(report.problems.len(), "problem"),
        plural_count(report.checked, "asset")
    )
}

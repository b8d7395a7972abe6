//! The publish pipeline.
//!
//! # Module Structure
//!
//! ```text
//! publish/
//! ├── error        # PublishError, Stage, ErrorKind
//! ├── scan         # Asset selection from the source root
//! ├── clean        # Stage 1: remove previous output + manifest
//! ├── rewrite      # Stage 2 (map normalization) + stage 4 (artifact repair)
//! ├── fingerprint  # Stage 3: content-addressed copies
//! ├── manifest     # Manifest value + atomic persistence
//! ├── compress     # Stage 5: zstd siblings
//! └── verify       # `revpub verify`
//! ```
//!
//! Stages are plain method calls on [`Publisher`], each taking what the
//! previous one produced. The manifest returned by [`Publisher::fingerprint`]
//! is the only thing [`Publisher::repair`] can work from.

mod clean;
mod compress;
mod error;
mod fingerprint;
mod manifest;
mod rewrite;
mod scan;
mod verify;


pub use clean::Cleaned;
pub use compress::Compressed;
pub use error::{ErrorKind, PublishError, PublishResult, Stage};
pub use fingerprint::Fingerprinted;
pub use manifest::Manifest;
pub use rewrite::RepairOutcome;
pub use verify::verify;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{PublishConfig, PublishPatterns};
use crate::log;
use crate::utils::plural_count;
use fingerprint::FingerprintPlan;
use scan::{Selection, select_assets};

/// Summary of a completed publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    /// Assets published under a content-addressed name.
    pub renamed: usize,
    /// Assets published under their logical name.
    pub kept: usize,
    /// Stylesheet references rewritten to CDN URLs.
    pub references: usize,
    /// Whether the map file needed separator normalization.
    pub map_normalized: bool,
    pub repair: RepairOutcome,
    /// `None` when compression is disabled.
    pub compressed: Option<Compressed>,
    pub elapsed: Duration,
}

impl PublishReport {
    pub fn assets(&self) -> usize {
        self.manifest.len()
    }
}

/// Runs the publish stages against one configuration.
pub struct Publisher<'a> {
    config: &'a PublishConfig,
    url_prefix: String,
    patterns: PublishPatterns,
    quiet: bool,
}

impl<'a> Publisher<'a> {
    /// Check everything a publish needs before anything is touched.
    ///
    /// A missing or invalid destination host and malformed patterns are
    /// reported here, so a failed `new` leaves the filesystem unchanged.
    pub fn new(config: &'a PublishConfig) -> PublishResult<Self> {
        let url_prefix = config.url_prefix()?;
        let patterns = config.publish.patterns()?;
        Ok(Self {
            config,
            url_prefix,
            patterns,
            quiet: false,
        })
    }

    /// Suppress per-stage log lines and progress display.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self) -> PublishResult<PublishReport> {
        let started = Instant::now();

        self.clean()?;
        let map_normalized = self.normalize_map()?;
        let fingerprinted = self.fingerprint()?;
        let repair = self.repair(&fingerprinted.manifest)?;
        let compressed = self.compress()?;

        Ok(PublishReport {
            manifest: fingerprinted.manifest,
            manifest_path: self.config.paths.manifest.clone(),
            renamed: fingerprinted.renamed,
            kept: fingerprinted.kept,
            references: fingerprinted.references,
            map_normalized,
            repair,
            compressed,
            elapsed: started.elapsed(),
        })
    }

    /// Stage 1: remove the previous publish root and manifest.
    pub fn clean(&self) -> PublishResult<Cleaned> {
        let paths = &self.config.paths;
        let cleaned = clean::clean(&paths.output, &paths.manifest)?;
        if !self.quiet && cleaned.output_removed {
            log!("clean"; "removed {}", self.config.display_path(&paths.output));
        }
        Ok(cleaned)
    }

    /// Stage 2: canonicalize separators in the map file's `sources`.
    pub fn normalize_map(&self) -> PublishResult<bool> {
        let reference = &self.config.reference;
        let map = self.config.paths.root.join(&reference.map);
        let changed = rewrite::normalize_map(&map, &reference.separator)?;
        if !self.quiet && changed {
            log!("normalize"; "canonicalized source paths in {}", reference.map);
        }
        Ok(changed)
    }

    /// Stage 3: copy assets to content-addressed names and persist the manifest.
    pub fn fingerprint(&self) -> PublishResult<Fingerprinted> {
        let config = self.config;
        let paths = &config.paths;

        let assets = select_assets(&Selection {
            root: &paths.root,
            output: &paths.output,
            include: &self.patterns.include,
            ignore: &self.patterns.ignore,
            extra: &config.publish.extra,
        })?;

        let plan = FingerprintPlan {
            output: &paths.output,
            hash_length: config.publish.hash_length,
            dont_rename: &self.patterns.dont_rename,
            dont_search: &self.patterns.dont_search,
            url_prefix: &self.url_prefix,
            quiet: self.quiet,
        };
        let fingerprinted = plan.run(&assets)?;
        fingerprinted.manifest.write(&paths.manifest, Stage::Fingerprint)?;

        if !self.quiet {
            log!(
                "fingerprint";
                "{} renamed, {} kept, manifest at {}",
                plural_count(fingerprinted.renamed, "asset"),
                fingerprinted.kept,
                config.display_path(&paths.manifest)
            );
        }
        Ok(fingerprinted)
    }

    /// Stage 4: point the published artifact at the fingerprinted map.
    pub fn repair(&self, manifest: &Manifest) -> PublishResult<RepairOutcome> {
        let outcome =
            rewrite::repair_artifact(manifest, &self.config.paths.output, &self.config.reference)?;
        if !self.quiet {
            log!("repair"; "{} -> {}", outcome.from, outcome.to);
        }
        Ok(outcome)
    }

    /// Stage 5: compressed siblings, unless disabled.
    pub fn compress(&self) -> PublishResult<Option<Compressed>> {
        let compress = &self.config.compress;
        if !compress.enable {
            crate::debug!("compress"; "disabled");
            return Ok(None);
        }

        let result = compress::compress_tree(&self.config.paths.output, compress.level, self.quiet)?;
        if !self.quiet {
            log!(
                "compress";
                "{} ({:.0}% of original size)",
                plural_count(result.files, "file"),
                result.ratio() * 100.0
            );
        }
        Ok(Some(result))
    }
}

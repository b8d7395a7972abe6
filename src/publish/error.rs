//! Publish error taxonomy.
//!
//! Every failure is fatal to the run. Errors carry the stage they occurred in
//! so the caller can report where the pipeline stopped.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Remove the previous publish root and manifest.
    Clean,
    /// Canonicalize separators in the map file's `sources`.
    NormalizeMapReference,
    /// Copy assets to content-addressed names and build the manifest.
    Fingerprint,
    /// Point the published artifact at the fingerprinted map file.
    RepairArtifactReference,
    /// Write compressed siblings of every published file.
    Compress,
    /// Post-run consistency check (`revpub verify`), not part of a publish.
    Verify,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::NormalizeMapReference => "normalize-map",
            Self::Fingerprint => "fingerprint",
            Self::RepairArtifactReference => "repair-reference",
            Self::Compress => "compress",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse error classification for callers that branch on the failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed configuration, detected before any mutation.
    Config,
    /// Filesystem failure (missing source, unwritable destination).
    Io,
    /// Manifest or reference inconsistency that would ship a broken artifact.
    Integrity,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("[{stage}] IO error at `{}`", .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("[{stage}] {message}")]
    Integrity { stage: Stage, message: String },
}

pub type PublishResult<T> = Result<T, PublishError>;

impl PublishError {
    /// Build a `map_err` adapter attaching stage and path to an IO error.
    ///
    /// ```ignore
    /// fs::read(&path).map_err(PublishError::io(Stage::Fingerprint, &path))?;
    /// ```
    pub fn io(stage: Stage, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            stage,
            path,
            source,
        }
    }

    pub fn integrity(stage: Stage, message: impl Into<String>) -> Self {
        Self::Integrity {
            stage,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
            Self::Integrity { .. } => ErrorKind::Integrity,
        }
    }

    /// Stage the failure happened in (`None` for configuration errors).
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Config(_) => None,
            Self::Io { stage, .. } | Self::Integrity { stage, .. } => Some(*stage),
        }
    }
}

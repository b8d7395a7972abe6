//! Publish configuration management for `revpub.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths]
//! │   ├── publish    # [publish]
//! │   ├── reference  # [reference]
//! │   └── compress   # [compress]
//! ├── error          # ConfigError
//! ├── pattern        # PatternSet (compiled globs)
//! └── mod.rs         # PublishConfig (this file)
//! ```
//!
//! The config file is optional. Without one every section uses its defaults,
//! which describe the conventional `resources/public` layout, and only the
//! destination host has to be supplied on the command line.

mod error;
mod pattern;
pub mod section;
mod util;

pub use error::ConfigError;
pub use pattern::PatternSet;
pub use section::{
    COMPRESSED_EXTENSION, CompressConfig, PathsConfig, PublishPatterns, PublishSection,
    ReferenceConfig,
};

use crate::{
    cli::{Cli, Commands, PublishArgs},
    log,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::{find_config_file, validate_host};

/// Config file searched for when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "revpub.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing revpub.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub base: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub publish: PublishSection,

    #[serde(default)]
    pub reference: ReferenceConfig,

    #[serde(default)]
    pub compress: CompressConfig,
}

impl PublishConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file unless `--config` names
    /// one explicitly (which then must exist).
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;
        Self::load_from(cli, &cwd)
    }

    /// Load configuration as if invoked from `cwd`.
    pub fn load_from(cli: &Cli, cwd: &Path) -> Result<Self, ConfigError> {
        let config_path = match &cli.config {
            Some(explicit) => {
                let path = crate::utils::path::resolve_path(explicit, cwd);
                if !path.is_file() {
                    return Err(ConfigError::Io(
                        path,
                        std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                    ));
                }
                Some(path)
            }
            None => find_config_file(Path::new(DEFAULT_CONFIG_FILE), cwd),
        };

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let base = config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);

        config.config_path = config_path;
        config.finalize(&base);

        if let Commands::Publish { args } = &cli.command {
            config.apply_publish_args(args, cwd);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string (paths left unresolved).
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Resolve all configured paths against `base`.
    pub fn finalize(&mut self, base: &Path) {
        self.base = base.to_path_buf();
        self.paths.normalize(base);
    }

    /// Apply `publish` command options. CLI paths are relative to cwd.
    fn apply_publish_args(&mut self, args: &PublishArgs, cwd: &Path) {
        crate::logger::set_verbose(args.verbose);

        if let Some(host) = &args.host {
            self.publish.host = Some(host.clone());
        }
        self.publish.dont_rename.extend(args.exclude.iter().cloned());

        let resolve = |p: &PathBuf| crate::utils::path::resolve_path(p, cwd);
        if let Some(root) = &args.root {
            self.paths.root = resolve(root);
        }
        if let Some(output) = &args.output {
            self.paths.output = resolve(output);
        }
        if let Some(manifest) = &args.manifest {
            self.paths.manifest = resolve(manifest);
        }
        if args.no_compress {
            self.compress.enable = false;
        }
    }

    /// Validate everything except the destination host.
    ///
    /// The host is only required for publishing; see [`Self::host`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.publish.validate()?;
        self.reference.validate()?;
        self.compress.validate()?;

        if self.paths.output == self.paths.root || self.paths.root.starts_with(&self.paths.output)
        {
            return Err(ConfigError::Validation(format!(
                "`paths.output` ({}) must not contain `paths.root`",
                self.paths.output.display()
            )));
        }
        if self.paths.manifest.starts_with(&self.paths.output) {
            return Err(ConfigError::Validation(
                "`paths.manifest` must not live inside `paths.output` (it is wiped on every run)"
                    .into(),
            ));
        }
        Ok(())
    }

    /// The destination host, required before any publish stage runs.
    pub fn host(&self) -> Result<&str, ConfigError> {
        let host = self
            .publish
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::MissingHost)?;
        validate_host(host).map_err(|reason| ConfigError::InvalidHost(host.to_string(), reason))?;
        Ok(host)
    }

    /// URL prefix used for rewritten references, e.g. `//cdn.example.com/cdn/`.
    pub fn url_prefix(&self) -> Result<String, ConfigError> {
        Ok(self.publish.url_prefix(self.host()?))
    }

    /// Show a path relative to the config base (for log lines).
    pub fn display_path(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        path.strip_prefix(&self.base)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["revpub"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_parse_sections() {
        let config = PublishConfig::from_str(
            r#"
            [paths]
            root = "public"
            output = "public/static"

            [publish]
            host = "cdn.example.com"
            hash_length = 12
            dont_rename = ["robots.txt"]

            [compress]
            enable = false
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.root, PathBuf::from("public"));
        assert_eq!(config.publish.hash_length, 12);
        assert_eq!(config.publish.dont_rename, vec!["robots.txt".to_string()]);
        assert!(!config.compress.enable);
        // untouched sections keep defaults
        assert_eq!(config.reference.artifact, "js/out/main.js");
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) = PublishConfig::parse_with_ignored(
            r#"
            [publish]
            hots = "typo.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(ignored, vec!["publish.hots".to_string()]);
    }

    #[test]
    fn test_load_without_config_uses_cwd() {
        let dir = TempDir::new().unwrap();
        let config = PublishConfig::load_from(&cli(&["publish", "--host", "h.example"]), dir.path())
            .unwrap();

        assert!(config.config_path.is_none());
        assert_eq!(config.paths.root, dir.path().join("resources/public"));
        assert_eq!(config.host().unwrap(), "h.example");
    }

    #[test]
    fn test_load_found_config_and_cli_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[publish]\nhost = \"from-config.example\"\n",
        )
        .unwrap();
        let sub = dir.path().join("resources");
        fs::create_dir_all(&sub).unwrap();

        let config = PublishConfig::load_from(
            &cli(&["publish", "--exclude", "*.txt", "--no-compress"]),
            &sub,
        )
        .unwrap();

        assert_eq!(config.base, dir.path());
        assert_eq!(config.host().unwrap(), "from-config.example");
        assert!(config.publish.dont_rename.contains(&"*.txt".to_string()));
        assert!(!config.compress.enable);

        let overridden =
            PublishConfig::load_from(&cli(&["publish", "--host", "cli.example"]), &sub).unwrap();
        assert_eq!(overridden.host().unwrap(), "cli.example");
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = PublishConfig::load_from(&cli(&["-C", "missing.toml", "verify"]), dir.path())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_missing_host() {
        let config = PublishConfig::default();
        assert!(matches!(config.host(), Err(ConfigError::MissingHost)));

        let mut blank = PublishConfig::default();
        blank.publish.host = Some("  ".into());
        assert!(matches!(blank.host(), Err(ConfigError::MissingHost)));

        let mut bad = PublishConfig::default();
        bad.publish.host = Some("https://x.example".into());
        assert!(matches!(bad.host(), Err(ConfigError::InvalidHost(..))));
    }

    #[test]
    fn test_manifest_inside_output_rejected() {
        let mut config = PublishConfig::default();
        config.paths.manifest = "resources/public/cdn/rev-manifest.json".into();
        config.finalize(Path::new("/project"));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_output_containing_root_rejected() {
        let mut config = PublishConfig::default();
        config.paths.output = "resources".into();
        config.finalize(Path::new("/project"));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_url_prefix_requires_host() {
        let mut config = PublishConfig::default();
        assert!(config.url_prefix().is_err());
        config.publish.host = Some("cdn.example.com".into());
        assert_eq!(config.url_prefix().unwrap(), "//cdn.example.com/cdn/");
    }
}

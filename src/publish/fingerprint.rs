//! Content-addressed copying.
//!
//! Every selected asset is copied to `<output>/<dir>/<stem>-<hash>.<ext>`.
//! Assets matching `dont_rename` are copied under their own name.
//!
//! Two phases, each parallel across files:
//!
//! 1. **Plain assets** (everything not searched for references) are hashed
//!    and copied byte-for-byte.
//! 2. **Searched stylesheets** get their references rewritten to CDN URLs,
//!    then the rewritten bytes are hashed and written. A stylesheet is only
//!    written after every stylesheet it references, so `@import "theme.css"`
//!    already knows `theme-<hash>.css`. Stylesheets referencing each other in
//!    a cycle cannot be named and abort the stage.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use super::error::{PublishError, PublishResult, Stage};
use super::manifest::{Manifest, ManifestBuilder, ManifestEntry};
use super::rewrite::{rewrite_stylesheet, stylesheet_references};
use super::scan::{Asset, AssetCategory};
use crate::config::PatternSet;
use crate::logger::ProgressLine;
use crate::utils::hash::ContentHash;
use crate::utils::path::{logical_file_name, logical_parent};

/// Inputs of the fingerprint stage.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintPlan<'a> {
    /// Publish root receiving the copies.
    pub output: &'a Path,
    pub hash_length: usize,
    pub dont_rename: &'a PatternSet,
    pub dont_search: &'a PatternSet,
    /// Prefix for rewritten stylesheet references, e.g. `//cdn.example.com/cdn/`.
    pub url_prefix: &'a str,
    pub quiet: bool,
}

/// Output of the fingerprint stage.
#[derive(Debug, Clone)]
pub struct Fingerprinted {
    pub manifest: Manifest,
    /// Assets published under a content-addressed name.
    pub renamed: usize,
    /// Assets published under their logical name.
    pub kept: usize,
    /// Stylesheet references rewritten to fingerprinted URLs.
    pub references: usize,
}

/// Split a file name into stem and extension at the first dot.
///
/// A leading dot belongs to the stem (`.htaccess` has no extension).
///
/// ```ignore
/// split_file_name("app.js.map") -> ("app", "js.map")
/// split_file_name("LICENSE")    -> ("LICENSE", "")
/// ```
pub fn split_file_name(name: &str) -> (&str, &str) {
    let search_from = usize::from(name.starts_with('.'));
    match name[search_from..].find('.') {
        Some(pos) => {
            let pos = pos + search_from;
            (&name[..pos], &name[pos + 1..])
        }
        None => (name, ""),
    }
}

/// Content-addressed name for a logical path: `<dir>/<stem>-<hash>.<ext>`.
pub fn fingerprinted_path(logical: &str, hash: &str) -> String {
    let dir = logical_parent(logical);
    let (stem, ext) = split_file_name(logical_file_name(logical));

    let mut name = format!("{stem}-{hash}");
    if !ext.is_empty() {
        name.push('.');
        name.push_str(ext);
    }
    if dir.is_empty() {
        name
    } else {
        format!("{dir}/{name}")
    }
}

impl FingerprintPlan<'_> {
    /// Whether the asset's text is searched for references to other assets.
    fn is_searched(&self, asset: &Asset) -> bool {
        asset.category == AssetCategory::Style && !self.dont_search.matches(&asset.logical)
    }

    fn published_path(&self, logical: &str, hash: ContentHash) -> String {
        if self.dont_rename.matches(logical) {
            logical.to_string()
        } else {
            fingerprinted_path(logical, &hash.fingerprint(self.hash_length))
        }
    }

    /// Run both phases and build the manifest.
    ///
    /// Nothing is returned (and so no manifest is written) unless every
    /// asset was copied.
    pub fn run(&self, assets: &[Asset]) -> PublishResult<Fingerprinted> {
        let stage = Stage::Fingerprint;
        fs::create_dir_all(self.output).map_err(PublishError::io(stage, self.output))?;

        let (searched, plain): (Vec<&Asset>, Vec<&Asset>) =
            assets.iter().partition(|a| self.is_searched(a));

        let kept_total = assets
            .iter()
            .filter(|a| self.dont_rename.matches(&a.logical))
            .count();
        let progress_items = [("renamed", assets.len() - kept_total), ("kept", kept_total)];
        let progress = if self.quiet {
            ProgressLine::quiet("fingerprint", &progress_items)
        } else {
            ProgressLine::new("fingerprint", &progress_items)
        };

        // Phase 1: byte-for-byte copies
        let plain_entries = plain
            .par_iter()
            .map(|asset| {
                let entry = self.copy_plain(asset)?;
                progress.inc(if entry.is_kept() { "kept" } else { "renamed" });
                Ok(entry)
            })
            .collect::<PublishResult<Vec<_>>>()?;

        let mut lookup: FxHashMap<String, String> = plain_entries
            .iter()
            .map(|e| (e.logical.clone(), e.published.clone()))
            .collect();
        let mut builder = ManifestBuilder::new();
        builder.extend(plain_entries);

        // Phase 2: stylesheets, each one after the stylesheets it references
        let searched_names: FxHashSet<&str> = searched.iter().map(|a| a.logical.as_str()).collect();
        let mut pending = searched
            .iter()
            .map(|&asset| Stylesheet::read(asset, &searched_names))
            .collect::<PublishResult<Vec<_>>>()?;

        let mut references = 0;
        while !pending.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|sheet| sheet.imports.iter().all(|i| lookup.contains_key(i)));

            if ready.is_empty() {
                let names: Vec<_> = blocked.iter().map(|s| s.asset.logical.as_str()).collect();
                return Err(PublishError::integrity(
                    stage,
                    format!("stylesheets reference each other in a cycle: {}", names.join(", ")),
                ));
            }

            let written = ready
                .par_iter()
                .map(|sheet| {
                    let (entry, refs) = self.write_stylesheet(sheet, &lookup)?;
                    progress.inc(if entry.is_kept() { "kept" } else { "renamed" });
                    Ok((entry, refs))
                })
                .collect::<PublishResult<Vec<_>>>()?;

            for (entry, refs) in written {
                references += refs;
                lookup.insert(entry.logical.clone(), entry.published.clone());
                builder.push(entry);
            }
            pending = blocked;
        }

        progress.finish();

        let total = builder.len();
        let manifest = builder.build()?;
        let kept = manifest.iter().filter(|(l, p)| l == p).count();

        Ok(Fingerprinted {
            manifest,
            renamed: total - kept,
            kept,
            references,
        })
    }

    fn copy_plain(&self, asset: &Asset) -> PublishResult<ManifestEntry> {
        let stage = Stage::Fingerprint;
        let hash = ContentHash::of_file(&asset.source).map_err(PublishError::io(stage, &asset.source))?;
        let published = self.published_path(&asset.logical, hash);

        let dest = self.output.join(&published);
        ensure_parent(&dest)?;
        fs::copy(&asset.source, &dest).map_err(PublishError::io(stage, &dest))?;

        crate::debug!("fingerprint"; "{} -> {}", asset.logical, published);
        Ok(ManifestEntry::new(asset.logical.clone(), published))
    }

    fn write_stylesheet(
        &self,
        sheet: &Stylesheet<'_>,
        lookup: &FxHashMap<String, String>,
    ) -> PublishResult<(ManifestEntry, usize)> {
        let stage = Stage::Fingerprint;
        let asset = sheet.asset;

        let (bytes, refs) = match &sheet.content {
            Content::Text(css) => {
                let (rewritten, refs) =
                    rewrite_stylesheet(css, &asset.logical, self.url_prefix, |logical| {
                        lookup.get(logical).map(String::as_str)
                    });
                (rewritten.into_bytes(), refs)
            }
            Content::Binary(bytes) => (bytes.clone(), 0),
        };

        let published = self.published_path(&asset.logical, ContentHash::of(&bytes));
        let dest = self.output.join(&published);
        ensure_parent(&dest)?;
        fs::write(&dest, &bytes).map_err(PublishError::io(stage, &dest))?;

        crate::debug!("fingerprint"; "{} -> {} ({} references)", asset.logical, published, refs);
        Ok((ManifestEntry::new(asset.logical.clone(), published), refs))
    }
}

/// A searched stylesheet and the other searched stylesheets it references.
struct Stylesheet<'a> {
    asset: &'a Asset,
    content: Content,
    imports: Vec<String>,
}

enum Content {
    Text(String),
    /// Not UTF-8, published untouched
    Binary(Vec<u8>),
}

impl<'a> Stylesheet<'a> {
    fn read(asset: &'a Asset, searched: &FxHashSet<&str>) -> PublishResult<Self> {
        let bytes = fs::read(&asset.source)
            .map_err(PublishError::io(Stage::Fingerprint, &asset.source))?;

        let (content, imports) = match String::from_utf8(bytes) {
            Ok(css) => {
                let mut imports = stylesheet_references(&css, &asset.logical);
                imports.retain(|logical| searched.contains(logical.as_str()));
                imports.sort_unstable();
                imports.dedup();
                (Content::Text(css), imports)
            }
            Err(e) => (Content::Binary(e.into_bytes()), Vec::new()),
        };

        Ok(Self {
            asset,
            content,
            imports,
        })
    }
}

fn ensure_parent(path: &Path) -> PublishResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(PublishError::io(Stage::Fingerprint, parent))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::error::ErrorKind;
    use tempfile::TempDir;

    fn patterns(list: &[&str]) -> PatternSet {
        let owned: Vec<String> = list.iter().map(|s| s.to_string()).collect();
        PatternSet::compile("test", &owned).unwrap()
    }

    fn asset(root: &Path, logical: &str, content: &str) -> Asset {
        let path = root.join(logical);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        Asset::new(logical.to_string(), path)
    }

    struct Fixture {
        dont_rename: PatternSet,
        dont_search: PatternSet,
    }

    impl Fixture {
        fn new(dont_rename: &[&str]) -> Self {
            Self {
                dont_rename: patterns(dont_rename),
                dont_search: patterns(&["*.js"]),
            }
        }

        fn plan<'a>(&'a self, output: &'a Path) -> FingerprintPlan<'a> {
            FingerprintPlan {
                output,
                hash_length: 8,
                dont_rename: &self.dont_rename,
                dont_search: &self.dont_search,
                url_prefix: "//cdn.example.com/cdn/",
                quiet: true,
            }
        }
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("app.js"), ("app", "js"));
        assert_eq!(split_file_name("app.js.map"), ("app", "js.map"));
        assert_eq!(split_file_name("jquery.min.js"), ("jquery", "min.js"));
        assert_eq!(split_file_name("LICENSE"), ("LICENSE", ""));
        assert_eq!(split_file_name(".htaccess"), (".htaccess", ""));
        assert_eq!(split_file_name(".env.local"), (".env", "local"));
    }

    #[test]
    fn test_fingerprinted_path() {
        assert_eq!(fingerprinted_path("style.css", "0123abcd"), "style-0123abcd.css");
        assert_eq!(
            fingerprinted_path("js/out/main.js.map", "0123abcd"),
            "js/out/main-0123abcd.js.map"
        );
        assert_eq!(fingerprinted_path("fonts/LICENSE", "0123abcd"), "fonts/LICENSE-0123abcd");
    }

    #[test]
    fn test_copies_and_keeps_originals() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let assets = vec![
            asset(src.path(), "js/app.js", "var a = 1;"),
            asset(src.path(), "images/logo.png", "png-bytes"),
        ];
        let fixture = Fixture::new(&[]);

        let result = fixture.plan(out.path()).run(&assets).unwrap();

        assert_eq!(result.manifest.len(), 2);
        assert_eq!(result.renamed, 2);
        let published = result.manifest.get("js/app.js").unwrap();
        assert!(published.starts_with("js/app-") && published.ends_with(".js"));
        assert_eq!(
            fs::read_to_string(out.path().join(published)).unwrap(),
            "var a = 1;"
        );
        // original untouched
        assert!(src.path().join("js/app.js").exists());
    }

    #[test]
    fn test_deterministic_and_sensitive() {
        let src = TempDir::new().unwrap();
        let fixture = Fixture::new(&[]);

        let assets = vec![asset(src.path(), "app.js", "console.log(1)")];
        let out1 = TempDir::new().unwrap();
        let out2 = TempDir::new().unwrap();
        let first = fixture.plan(out1.path()).run(&assets).unwrap();
        let second = fixture.plan(out2.path()).run(&assets).unwrap();
        assert_eq!(first.manifest, second.manifest);

        let changed = vec![asset(src.path(), "app.js", "console.log(2)")];
        let out3 = TempDir::new().unwrap();
        let third = fixture.plan(out3.path()).run(&changed).unwrap();
        assert_ne!(first.manifest.get("app.js"), third.manifest.get("app.js"));
    }

    #[test]
    fn test_identical_content_same_hash() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let assets = vec![
            asset(src.path(), "a/x.png", "same"),
            asset(src.path(), "b/x.png", "same"),
        ];
        let result = Fixture::new(&[]).plan(out.path()).run(&assets).unwrap();

        let a = result.manifest.get("a/x.png").unwrap();
        let b = result.manifest.get("b/x.png").unwrap();
        assert_eq!(logical_file_name(a), logical_file_name(b));
    }

    #[test]
    fn test_excluded_asset_keeps_name() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let assets = vec![
            asset(src.path(), "robots.txt", "User-agent: *"),
            asset(src.path(), "app.js", "x"),
        ];
        let result = Fixture::new(&["robots.txt"]).plan(out.path()).run(&assets).unwrap();

        assert_eq!(result.manifest.get("robots.txt"), Some("robots.txt"));
        assert_eq!(result.kept, 1);
        assert_eq!(result.renamed, 1);
        assert!(out.path().join("robots.txt").is_file());
    }

    #[test]
    fn test_stylesheet_references_rewritten_before_hashing() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let assets = vec![
            asset(src.path(), "css/site.css", ".a{background:url(../images/bg.png)}"),
            asset(src.path(), "images/bg.png", "png"),
        ];
        let result = Fixture::new(&[]).plan(out.path()).run(&assets).unwrap();

        assert_eq!(result.references, 1);
        let bg = result.manifest.get("images/bg.png").unwrap();
        let css_path = result.manifest.get("css/site.css").unwrap();
        let css = fs::read_to_string(out.path().join(css_path)).unwrap();
        assert_eq!(css, format!(".a{{background:url(//cdn.example.com/cdn/{bg})}}"));

        // published name reflects the rewritten bytes
        let expected = fingerprinted_path("css/site.css", &ContentHash::of(&css).fingerprint(8));
        assert_eq!(css_path, expected);
    }

    #[test]
    fn test_dont_search_leaves_stylesheet_alone() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let original = ".a{background:url(bg.png)}";
        let assets = vec![
            asset(src.path(), "vendor.css", original),
            asset(src.path(), "bg.png", "png"),
        ];
        let fixture = Fixture {
            dont_rename: PatternSet::default(),
            dont_search: patterns(&["vendor.css"]),
        };
        let result = fixture.plan(out.path()).run(&assets).unwrap();

        assert_eq!(result.references, 0);
        let css_path = result.manifest.get("vendor.css").unwrap();
        assert_eq!(fs::read_to_string(out.path().join(css_path)).unwrap(), original);
    }

    #[test]
    fn test_missing_source_aborts() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let assets = vec![Asset::new("gone.js".into(), src.path().join("gone.js"))];

        let err = Fixture::new(&[]).plan(out.path()).run(&assets).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Fingerprint));
    }

    #[test]
    fn test_imported_stylesheets_written_first() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let assets = vec![
            asset(src.path(), "css/base.css", "b{}"),
            asset(src.path(), "css/site.css", "@import \"theme.css\";"),
            asset(src.path(), "css/theme.css", "@import url(base.css);"),
        ];
        let result = Fixture::new(&[]).plan(out.path()).run(&assets).unwrap();

        let base = result.manifest.get("css/base.css").unwrap();
        let theme = result.manifest.get("css/theme.css").unwrap();
        let site = result.manifest.get("css/site.css").unwrap();

        assert_eq!(result.references, 2);
        assert_eq!(
            fs::read_to_string(out.path().join(theme)).unwrap(),
            format!("@import url(//cdn.example.com/cdn/{base});")
        );
        assert_eq!(
            fs::read_to_string(out.path().join(site)).unwrap(),
            format!("@import \"//cdn.example.com/cdn/{theme}\";")
        );
    }

    #[test]
    fn test_stylesheet_cycle_rejected() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let assets = vec![
            asset(src.path(), "a.css", "@import \"b.css\";"),
            asset(src.path(), "b.css", "@import \"a.css\";"),
            asset(src.path(), "c.css", "c{}"),
        ];
        let err = Fixture::new(&[]).plan(out.path()).run(&assets).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Integrity);
        let message = format!("{err}");
        assert!(message.contains("a.css") && message.contains("b.css"));
        assert!(!message.contains("c.css"));
    }
}

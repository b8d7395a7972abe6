//! Compressed siblings for every published file.
//!
//! `cdn/js/app-3f2a91c0.js` gets `cdn/js/app-3f2a91c0.js.zst` next to it.
//! The originals stay in place and a sibling left by an earlier run is
//! overwritten. A `.zst` file is only treated as a sibling when the file it
//! would compress is also present, so a published `data.zst` asset still
//! gets its own `data.zst.zst`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use super::error::{PublishError, PublishResult, Stage};
use crate::config::COMPRESSED_EXTENSION;
use crate::logger::ProgressLine;
use crate::utils::path::is_file_following_links;

/// Totals of one compression pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compressed {
    pub files: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl Compressed {
    /// Output size as a fraction of input size (1.0 for an empty tree).
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            1.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64
        }
    }
}

/// Path of the compressed sibling of `path`.
pub fn sibling_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(COMPRESSED_EXTENSION);
    PathBuf::from(name)
}

/// `path` is the compressed sibling of another file in `files`.
fn is_sibling(path: &Path, files: &FxHashSet<PathBuf>) -> bool {
    path.extension().is_some_and(|ext| ext == COMPRESSED_EXTENSION)
        && files.contains(&path.with_extension(""))
}

/// Compress every regular file under `output` with zstd at `level`.
pub fn compress_tree(output: &Path, level: i32, quiet: bool) -> PublishResult<Compressed> {
    let stage = Stage::Compress;

    let mut walked = Vec::new();
    for entry in WalkDir::new(output).sort(true).skip_hidden(false) {
        let entry =
            entry.map_err(|e| PublishError::io(stage, output)(io::Error::other(e.to_string())))?;
        let path = entry.path();
        let is_file = is_file_following_links(&path, entry.file_type())
            .map_err(PublishError::io(stage, &path))?;
        if is_file {
            walked.push(path);
        }
    }

    let all: FxHashSet<PathBuf> = walked.iter().cloned().collect();
    let files: Vec<PathBuf> = walked
        .into_iter()
        .filter(|path| !is_sibling(path, &all))
        .collect();

    let items = [("files", files.len())];
    let progress = if quiet {
        ProgressLine::quiet("compress", &items)
    } else {
        ProgressLine::new("compress", &items)
    };

    let sizes = files
        .par_iter()
        .map(|path| {
            let sizes = compress_file(path, level)?;
            progress.inc("files");
            Ok(sizes)
        })
        .collect::<PublishResult<Vec<_>>>()?;

    progress.finish();

    Ok(sizes
        .into_iter()
        .fold(Compressed::default(), |acc, (bytes_in, bytes_out)| Compressed {
            files: acc.files + 1,
            bytes_in: acc.bytes_in + bytes_in,
            bytes_out: acc.bytes_out + bytes_out,
        }))
}

fn compress_file(path: &Path, level: i32) -> PublishResult<(u64, u64)> {
    let stage = Stage::Compress;
    let data = fs::read(path).map_err(PublishError::io(stage, path))?;
    let encoded = zstd::encode_all(data.as_slice(), level).map_err(PublishError::io(stage, path))?;

    let dest = sibling_path(path);
    fs::write(&dest, &encoded).map_err(PublishError::io(stage, &dest))?;

    crate::debug!("compress"; "{} ({} -> {} bytes)", dest.display(), data.len(), encoded.len());
    Ok((data.len() as u64, encoded.len() as u64))
}

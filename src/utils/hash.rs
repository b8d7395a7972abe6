//! Content hashing for content-addressed file names.
//!
//! Uses blake3 for:
//! - Fast, deterministic hashing of whole files
//! - Collision resistance (a changed byte yields a new name)
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash::ContentHash;
//!
//! let h = ContentHash::of(b"body {}");
//! let fp = h.fingerprint(8); // -> "a1b2c3d4"
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Shortest fingerprint accepted in file names.
pub const MIN_FINGERPRINT_LEN: usize = 8;

/// Longest fingerprint (full blake3 hex digest).
pub const MAX_FINGERPRINT_LEN: usize = 64;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash an in-memory buffer.
    #[inline]
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Hash a file by streaming its contents.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = [0u8; 64 * 1024];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// Convert to full hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Leading `len` hex chars, clamped to the valid fingerprint range.
    pub fn fingerprint(self, len: usize) -> String {
        let len = len.clamp(MIN_FINGERPRINT_LEN, MAX_FINGERPRINT_LEN);
        let mut hex = self.to_hex();
        hex.truncate(len);
        hex
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

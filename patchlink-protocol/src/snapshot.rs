//! Patch snapshot blobs
//!
//! A snapshot is one self-consistent patch state as a single byte blob, in
//! one of two forms:
//!
//! - **archive**: the whole autosave directory tree, bincode-encoded and
//!   zstd-compressed, carrying the [`ARCHIVE_MAGIC`] prefix. Used over the
//!   network.
//! - **raw description**: the top-level `patch.json` verbatim. Used by the
//!   in-process direct-access transport.
//!
//! The magic prefix distinguishes the two without out-of-band signaling.
//! Unpacking clears and refills the target scratch directory before the
//! engine reloads from it; any failure surfaces before the reload, so the
//! previously-loaded patch is never partially overwritten.

use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use patchlink_utils::{PatchlinkError, Result};

/// Magic prefix marking the compressed-archive snapshot form
pub const ARCHIVE_MAGIC: [u8; 4] = *b"PLA1";

/// Top-level patch description file inside the autosave directory
pub const DESCRIPTION_FILE: &str = "patch.json";

/// Compression level for archive snapshots. The link is local and the blobs
/// travel in single datagrams, so favor speed.
const ZSTD_LEVEL: i32 = 1;

/// One file inside an archive snapshot
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveEntry {
    /// Path relative to the autosave directory, `/`-separated
    path: String,
    data: Vec<u8>,
}

/// An immutable byte blob representing one self-consistent patch state
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSnapshot {
    bytes: Vec<u8>,
}

impl PatchSnapshot {
    /// Pack a directory tree into an archive-form snapshot.
    ///
    /// Entries are sorted by path, so packing the same tree twice yields
    /// identical blobs.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();

        for item in WalkDir::new(dir).sort_by_file_name() {
            let item = item.map_err(|e| {
                PatchlinkError::engine(format!("failed to walk {}: {}", dir.display(), e))
            })?;
            if !item.file_type().is_file() {
                continue;
            }
            let rel = item
                .path()
                .strip_prefix(dir)
                .map_err(|e| PatchlinkError::internal(e.to_string()))?;
            let data = fs::read(item.path()).map_err(|e| PatchlinkError::FileRead {
                path: item.path().to_path_buf(),
                source: e,
            })?;
            entries.push(ArchiveEntry {
                path: rel.to_string_lossy().replace('\\', "/"),
                data,
            });
        }

        let manifest = bincode::serialize(&entries)
            .map_err(|e| PatchlinkError::internal(format!("archive encode: {}", e)))?;
        let compressed = zstd::encode_all(manifest.as_slice(), ZSTD_LEVEL)
            .map_err(|e| PatchlinkError::internal(format!("archive compress: {}", e)))?;

        let mut bytes = Vec::with_capacity(4 + compressed.len());
        bytes.extend_from_slice(&ARCHIVE_MAGIC);
        bytes.extend_from_slice(&compressed);
        Ok(Self { bytes })
    }

    /// Read only the top-level description file as a raw-form snapshot
    pub fn from_description_file(dir: &Path) -> Result<Self> {
        let path = dir.join(DESCRIPTION_FILE);
        let bytes = fs::read(&path).map_err(|e| PatchlinkError::FileRead { path, source: e })?;
        Ok(Self { bytes })
    }

    /// Wrap received bytes; the form is determined by the magic prefix
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// True when the blob carries the archive magic prefix
    pub fn is_archive(&self) -> bool {
        self.bytes.len() > ARCHIVE_MAGIC.len() && self.bytes[..4] == ARCHIVE_MAGIC
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Raw description text, when this is a raw-form snapshot of valid UTF-8
    pub fn as_description_text(&self) -> Option<&str> {
        if self.is_archive() {
            return None;
        }
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Clear and recreate `dir`, then fill it from this snapshot.
    ///
    /// Archive form extracts every entry; raw form writes the blob verbatim
    /// as the description file. Errors are recoverable: the caller has not
    /// yet told the engine to reload, so the live patch is untouched.
    pub fn unpack_into(&self, dir: &Path) -> Result<()> {
        if self.is_archive() {
            // Validate fully before touching the directory.
            let entries = self.decode_entries()?;
            recreate_dir(dir)?;
            for entry in &entries {
                let target = dir.join(&entry.path);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, &entry.data).map_err(|e| PatchlinkError::FileWrite {
                    path: target.clone(),
                    source: e,
                })?;
            }
        } else {
            recreate_dir(dir)?;
            let target = dir.join(DESCRIPTION_FILE);
            fs::write(&target, &self.bytes).map_err(|e| PatchlinkError::FileWrite {
                path: target.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    fn decode_entries(&self) -> Result<Vec<ArchiveEntry>> {
        let compressed = &self.bytes[ARCHIVE_MAGIC.len()..];
        let manifest = zstd::decode_all(compressed)
            .map_err(|e| PatchlinkError::corrupt_archive(e.to_string()))?;
        let entries: Vec<ArchiveEntry> = bincode::deserialize(&manifest)
            .map_err(|e| PatchlinkError::corrupt_archive(e.to_string()))?;

        for entry in &entries {
            if !is_safe_relative(&entry.path) {
                return Err(PatchlinkError::UnsafeArchivePath(entry.path.clone()));
            }
        }
        Ok(entries)
    }
}

/// Reject absolute paths and any parent-directory traversal
fn is_safe_relative(path: &str) -> bool {
    let p = Path::new(path);
    !path.is_empty()
        && p.components().all(|c| matches!(c, Component::Normal(_)))
}

fn recreate_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

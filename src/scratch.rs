//! Per-request scratch files.
//!
//! Uploaded videos and intermediate transcripts live in the configured temp
//! directory only for the duration of one request. Their names combine a
//! per-request id with a sanitized form of the caller's file name, and each
//! file is owned by a [`ScratchFile`] guard that deletes it when dropped.

use crate::error::{OmslagError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Extension forced onto every stored upload.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Extension of the intermediate transcript file.
pub const TRANSCRIPT_EXTENSION: &str = "txt";

/// Stem used when nothing alphanumeric survives sanitization.
const FALLBACK_STEM: &str = "upload";

/// Reduce an untrusted file name to its alphanumeric stem.
///
/// Directory components, dots, separators and any other punctuation are
/// removed, so the result can never escape the scratch directory. The
/// function is idempotent.
pub fn sanitize_stem(filename: &str) -> String {
    let name = filename.rsplit(&['/', '\\'][..]).next().unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    let sanitized: String = stem.chars().filter(|c| c.is_alphanumeric()).collect();
    if sanitized.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        sanitized
    }
}

/// Sanitized upload name with the forced video extension.
pub fn sanitize_filename(filename: &str) -> String {
    format!("{}.{}", sanitize_stem(filename), VIDEO_EXTENSION)
}

/// Fail with `NotFound` unless `path` is an existing regular file.
pub fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(OmslagError::NotFound(path.to_path_buf()))
    }
}

/// Scratch file locations for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchPaths {
    pub video: PathBuf,
    pub transcript: PathBuf,
}

impl ScratchPaths {
    /// Derive scratch paths from the request id and the uploaded file name.
    pub fn new(temp_dir: &Path, request_id: Uuid, filename: &str) -> Self {
        let stem = sanitize_stem(filename);
        Self {
            video: temp_dir.join(format!("{}_{}.{}", request_id, stem, VIDEO_EXTENSION)),
            transcript: temp_dir.join(format!("{}_{}.{}", request_id, stem, TRANSCRIPT_EXTENSION)),
        }
    }
}

/// A file that is removed from disk when the guard is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Write `contents` to `path` and verify the result before taking ownership.
    ///
    /// The file only counts as stored when it exists as a regular file with the
    /// expected length; anything else is a `StorageFailure`.
    pub async fn write(path: PathBuf, contents: &[u8]) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OmslagError::storage(&path, e))?;
        }

        // Own the path before writing so a partial file is cleaned up too
        let file = Self { path };

        tokio::fs::write(&file.path, contents)
            .await
            .map_err(|e| OmslagError::storage(&file.path, e))?;

        let metadata = tokio::fs::metadata(&file.path)
            .await
            .map_err(|e| OmslagError::storage(&file.path, e))?;

        if !metadata.is_file() || metadata.len() != contents.len() as u64 {
            return Err(OmslagError::storage(
                &file.path,
                format!(
                    "expected {} bytes on disk, found {}",
                    contents.len(),
                    metadata.len()
                ),
            ));
        }

        debug!("Stored {} bytes at {}", contents.len(), file.path.display());
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove scratch file {}: {}", self.path.display(), e),
        }
    }
}

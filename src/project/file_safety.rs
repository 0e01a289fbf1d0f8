//! Atomic file writes.
//!
//! A rewritten unit is written to a temp file next to the target, synced to
//! disk and renamed over the original. If any step fails the original file
//! is untouched and the temp file is removed.
//!
//! ```rust,ignore
//! use brrr_paramfix::project::file_safety::AtomicWriter;
//!
//! AtomicWriter::new().write(&path, &rendered).await?;
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Errors that can occur during atomic file operations.
#[derive(Error, Debug)]
pub enum AtomicWriteError {
    #[error("failed to create temporary file at {path}: {source}")]
    TempFileCreation { path: PathBuf, source: io::Error },

    #[error("failed to write to temporary file {path}: {source}")]
    TempFileWrite { path: PathBuf, source: io::Error },

    #[error("failed to sync temporary file {path}: {source}")]
    TempFileSync { path: PathBuf, source: io::Error },

    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("failed to read back {path}: {source}")]
    ReadBack { path: PathBuf, source: io::Error },

    #[error("content validation failed for {path}: expected {expected_len} bytes, got {actual_len}")]
    ValidationFailed {
        path: PathBuf,
        expected_len: usize,
        actual_len: usize,
    },

    #[error("parent directory does not exist for {path}")]
    ParentDirMissing { path: PathBuf },
}

/// Result type for atomic write operations.
pub type AtomicWriteResult<T> = Result<T, AtomicWriteError>;

/// Temp-file-and-rename writer.
#[derive(Debug, Clone)]
pub struct AtomicWriter {
    /// Read the file back after the rename and compare.
    validate_writes: bool,
}

impl Default for AtomicWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicWriter {
    pub fn new() -> Self {
        Self {
            validate_writes: true,
        }
    }

    /// Skip the read-back comparison.
    pub fn without_validation(mut self) -> Self {
        self.validate_writes = false;
        self
    }

    /// Atomically replace `path` with `content`.
    ///
    /// 1. Create a temp file in the target's directory (same filesystem)
    /// 2. Write and fsync it
    /// 3. Copy the original file's permissions, if it exists
    /// 4. Rename over the target
    pub async fn write(&self, path: &Path, content: &str) -> AtomicWriteResult<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        if !fs::try_exists(parent).await.unwrap_or(false) {
            return Err(AtomicWriteError::ParentDirMissing {
                path: path.to_path_buf(),
            });
        }

        let temp_path = generate_temp_path(parent, path);
        debug!("Creating temp file: {}", temp_path.display());

        if let Err(e) = write_synced(&temp_path, content).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Ok(metadata) = fs::metadata(path).await {
            if let Err(e) = fs::set_permissions(&temp_path, metadata.permissions()).await {
                warn!("Could not copy permissions to {}: {}", temp_path.display(), e);
            }
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AtomicWriteError::Rename {
                from: temp_path,
                to: path.to_path_buf(),
                source: e,
            });
        }

        if self.validate_writes {
            validate_content(path, content).await?;
        }

        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }
}

async fn write_synced(temp_path: &Path, content: &str) -> AtomicWriteResult<()> {
    let mut file = fs::File::create(temp_path)
        .await
        .map_err(|e| AtomicWriteError::TempFileCreation {
            path: temp_path.to_path_buf(),
            source: e,
        })?;

    file.write_all(content.as_bytes())
        .await
        .map_err(|e| AtomicWriteError::TempFileWrite {
            path: temp_path.to_path_buf(),
            source: e,
        })?;

    file.sync_all()
        .await
        .map_err(|e| AtomicWriteError::TempFileSync {
            path: temp_path.to_path_buf(),
            source: e,
        })
}

async fn validate_content(path: &Path, expected: &str) -> AtomicWriteResult<()> {
    let actual = fs::read(path).await.map_err(|e| AtomicWriteError::ReadBack {
        path: path.to_path_buf(),
        source: e,
    })?;

    if actual != expected.as_bytes() {
        return Err(AtomicWriteError::ValidationFailed {
            path: path.to_path_buf(),
            expected_len: expected.len(),
            actual_len: actual.len(),
        });
    }
    Ok(())
}

/// `.<name>.<nanos>.tmp` next to the target.
fn generate_temp_path(parent: &Path, path: &Path) -> PathBuf {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());

    let nanos = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_nanos(),
        Err(e) => {
            warn!("System clock is behind UNIX epoch ({}); using 0 for timestamp", e);
            0
        }
    };

    parent.join(format!(".{}.{}.tmp", filename, nanos))
}

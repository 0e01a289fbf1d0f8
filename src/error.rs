//! Error types for brrr-paramfix.
//!
//! Uses `thiserror` for `Display` and `From` implementations. The repair
//! algorithm itself is total, so every variant here describes a failure at
//! an I/O boundary: loading, manifest resolution, validation or saving.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;
use crate::project::file_safety::AtomicWriteError;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Process exit codes for the brrr-paramfix CLI.
pub mod exit_code {
    /// Run completed, whether or not anything was fixed.
    pub const SUCCESS: i32 = 0;
    /// Loading, validation or saving failed.
    pub const FAILURE: i32 = 1;
    /// Invalid command line (clap uses the same code).
    pub const USAGE: i32 = 2;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum ParamFixError {
    /// The invocation target does not exist.
    #[error("target not found: {0}")]
    TargetNotFound(PathBuf),

    /// The invocation target exists but is neither a manifest, a directory
    /// nor a TypeScript file.
    #[error("unsupported target {path}: {reason}")]
    UnsupportedTarget { path: PathBuf, reason: String },

    /// IO operation failed with path context.
    #[error("IO error at {path}: {error}")]
    IoWithPath {
        error: std::io::Error,
        path: PathBuf,
    },

    /// Directory traversal failed.
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: ignore::Error,
    },

    /// Source file is not valid UTF-8.
    #[error("file is not valid UTF-8: {0}")]
    Encoding(PathBuf),

    /// The `tsconfig.json` could not be parsed.
    #[error("invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// `extends` chain is broken or cyclic.
    #[error("cannot resolve `extends` in {path}: {reason}")]
    ManifestExtends { path: PathBuf, reason: String },

    /// Tree-sitter language setup or parse failure.
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// Configuration error (bad config file, invalid glob).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A rendered unit parsed with more syntax errors than the original.
    #[error("refusing to write {path}: fix introduced syntax errors ({before} -> {after} error nodes)")]
    Validation {
        path: PathBuf,
        before: usize,
        after: usize,
    },

    /// Writing progress output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// Atomic write failed.
    #[error("failed to save: {0}")]
    Persist(#[from] AtomicWriteError),
}

/// Convenience type alias for Results using ParamFixError.
pub type Result<T> = std::result::Result<T, ParamFixError>;

impl ParamFixError {
    /// Create an IO error with path context.
    #[inline]
    pub fn io_with_path(error: std::io::Error, path: impl AsRef<Path>) -> Self {
        ParamFixError::IoWithPath {
            error,
            path: path.as_ref().to_path_buf(),
        }
    }
}

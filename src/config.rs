//! `.brrr-paramfix.toml` configuration file support.
//!
//! Provides deserialization, discovery (walk up to `.git` root), and merging
//! with CLI flags. CLI flags always take precedence over file config.
//!
//! # Example config
//!
//! ```toml
//! [files]
//! include = ["src/**/*.ts", "src/**/*.tsx"]
//! exclude = ["generated/**", "**/*.d.ts"]
//!
//! [fix]
//! dry_run = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the config file.
pub const CONFIG_FILE_NAME: &str = ".brrr-paramfix.toml";

/// Top-level `.brrr-paramfix.toml` configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FixFileConfig {
    /// File include/exclude patterns for directory targets.
    #[serde(default)]
    pub files: FilesConfig,

    /// Fix behavior settings.
    #[serde(default)]
    pub fix: FixConfig,
}

/// File include/exclude glob patterns, relative to the target directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    /// If empty, every TypeScript file is included.
    /// Example: `["src/**/*.ts"]`
    #[serde(default)]
    pub include: Vec<String>,

    /// Example: `["generated/**"]`
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Fix application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FixConfig {
    /// Report and preview without writing (equivalent to `--dry-run`).
    #[serde(default)]
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl FixFileConfig {
    /// Parse a config file from a string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Parse)
    }

    /// Load and validate a config file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Every glob pattern must compile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in self.files.include.iter().chain(&self.files.exclude) {
            globset::Glob::new(pattern)
                .map_err(|e| ConfigError::InvalidGlob(pattern.clone(), e.to_string()))?;
        }
        Ok(())
    }

    pub fn build_file_matcher(&self) -> Result<FileMatcher, ConfigError> {
        FileMatcher::new(&self.files)
    }
}

// ---------------------------------------------------------------------------
// File matching
// ---------------------------------------------------------------------------

/// Compiled glob matcher for file include/exclude patterns.
///
/// The default matcher includes everything.
#[derive(Debug, Clone, Default)]
pub struct FileMatcher {
    include: Option<globset::GlobSet>,
    exclude: Option<globset::GlobSet>,
}

impl FileMatcher {
    pub fn new(files: &FilesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            include: build_glob_set(&files.include)?,
            exclude: build_glob_set(&files.exclude)?,
        })
    }

    /// Check whether a path (relative to the target directory) is loaded.
    ///
    /// Exclusion wins over inclusion; no include patterns means include all.
    pub fn is_included(&self, path: &Path) -> bool {
        if let Some(ref exclude) = self.exclude {
            if exclude.is_match(path) {
                return false;
            }
        }
        if let Some(ref include) = self.include {
            return include.is_match(path);
        }
        true
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<globset::GlobSet>, ConfigError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            globset::Glob::new(pattern)
                .map_err(|e| ConfigError::InvalidGlob(pattern.clone(), e.to_string()))?,
        );
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| ConfigError::InvalidGlob("(build)".into(), e.to_string()))
}

// ---------------------------------------------------------------------------
// Config file discovery
// ---------------------------------------------------------------------------

/// Discover a config file by walking up from `start` to the repository
/// root (directory containing `.git`).
///
/// Returns `None` if no config file is found before reaching the filesystem
/// root or the `.git` boundary.
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    let start = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());
    let mut current = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        if current.join(".git").exists() {
            return None;
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => return None,
        }
    }
}

/// Discover and load the config file. Returns `Ok(None)` if none is found.
pub fn discover_and_load_config(
    start: &Path,
) -> Result<Option<(FixFileConfig, PathBuf)>, ConfigError> {
    match discover_config(start) {
        Some(path) => {
            let config = FixFileConfig::load(&path)?;
            Ok(Some((config, path)))
        }
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from config file operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(toml::de::Error),

    #[error("invalid glob pattern '{0}': {1}")]
    InvalidGlob(String, String),
}

//! TS1016 repair for TypeScript projects.
//!
//! Loads a `tsconfig.json`, a directory or a single file with tree-sitter,
//! makes every required parameter that follows an optional one optional,
//! and saves the project once at the end.

pub mod cli;
pub mod config;
pub mod error;
pub mod fix;
pub mod lang;
pub mod project;

pub use cli::{validate_cli_semantics, Cli};
pub use config::{
    discover_and_load_config, discover_config, ConfigError, FileMatcher, FixFileConfig,
    CONFIG_FILE_NAME,
};
pub use error::{exit_code, ParamFixError, Result};
pub use fix::{FixEngine, FixOptions, FixSummary};
pub use project::{Project, ProjectOrigin, SourceUnit};

//! CLI argument definitions for brrr-paramfix.
//!
//! Kept in the library so integration tests can use [`Cli::try_parse_from`]
//! to verify argument handling without spawning a subprocess.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

/// brrr-paramfix: repair TS1016 parameter ordering errors.
///
/// Every required parameter that follows an optional one is made optional
/// by adding `?`. Nothing is reordered, retyped or removed.
#[derive(Parser, Debug)]
#[command(name = "brrr-paramfix")]
#[command(author)]
#[command(version)]
#[command(about = "Fix \"a required parameter cannot follow an optional parameter\" (TS1016)", long_about = None)]
#[command(after_help = "\
CONFIGURATION:\n\
  brrr-paramfix looks for a .brrr-paramfix.toml config file, searching from\n\
  the target up to the nearest .git root. CLI flags override the file.\n\
\n\
EXAMPLES:\n\
  brrr-paramfix tsconfig.json          Fix every file the project includes\n\
  brrr-paramfix src/                   Fix every .ts/.tsx file under src/\n\
  brrr-paramfix src/api.ts             Fix a single file\n\
  brrr-paramfix src/ --dry-run         Preview without writing")]
pub struct Cli {
    /// A tsconfig.json, a directory, or a single .ts/.tsx file.
    pub target: PathBuf,

    /// Report and preview the changes without writing any file.
    #[arg(long)]
    pub dry_run: bool,

    /// Path to a .brrr-paramfix.toml config file.
    ///
    /// By default the config is discovered from the target up to the
    /// nearest .git root. This flag overrides that discovery.
    #[arg(long, help_heading = "Global Options")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (sets log level to DEBUG).
    #[arg(short, long, help_heading = "Global Options")]
    pub debug: bool,

    /// Show additional details during execution.
    #[arg(short, long, help_heading = "Global Options")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long, help_heading = "Global Options")]
    pub quiet: bool,
}

impl Cli {
    /// Tracing level: `--debug` beats `--verbose` beats `--quiet`.
    pub fn log_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else if self.verbose {
            Level::INFO
        } else if self.quiet {
            Level::ERROR
        } else {
            Level::WARN
        }
    }
}

/// Warnings about flag combinations that parse but contradict each other.
pub fn validate_cli_semantics(cli: &Cli) -> Vec<String> {
    let mut warnings = Vec::new();
    if cli.quiet && (cli.verbose || cli.debug) {
        warnings.push(
            "Warning: --quiet is ignored when --verbose or --debug is given".to_string(),
        );
    }
    warnings
}

//! brrr-paramfix: repair TS1016 parameter ordering errors.
//!
//! # Usage
//!
//! ```bash
//! # Fix every file a project includes
//! brrr-paramfix tsconfig.json
//!
//! # Fix every TypeScript file under a directory
//! brrr-paramfix src/
//!
//! # Preview only
//! brrr-paramfix src/ --dry-run
//!
//! # Run with debug logging
//! brrr-paramfix --debug src/
//! ```

use brrr_paramfix::cli::{validate_cli_semantics, Cli};
use brrr_paramfix::config::{discover_and_load_config, FixFileConfig};
use brrr_paramfix::error::{exit_code, Result};
use brrr_paramfix::fix::{FixEngine, FixOptions};

use clap::Parser;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(exit_code::FAILURE);
    }

    for warning in validate_cli_semantics(&cli) {
        eprintln!("{}", warning);
    }

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code::FAILURE);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let file_config = load_file_config(cli)?;
    let options = FixOptions::from_config(file_config.as_ref(), cli.dry_run)?;
    let summary = FixEngine::new(options).run(&cli.target).await?;
    info!(
        "Scanned {} file(s), fixed {} function(s) in {} file(s)",
        summary.files_scanned, summary.total_fixes, summary.files_modified
    );
    Ok(())
}

/// Load the config file, respecting `--config`.
fn load_file_config(cli: &Cli) -> Result<Option<FixFileConfig>> {
    if let Some(ref explicit_path) = cli.config {
        let config = FixFileConfig::load(explicit_path)?;
        info!("Loaded config from {}", explicit_path.display());
        return Ok(Some(config));
    }

    match discover_and_load_config(&cli.target)? {
        Some((config, path)) => {
            info!("Using config: {}", path.display());
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

//! Integration tests for CLI argument handling.
//!
//! Uses [`clap::Parser::try_parse_from`] to exercise clap-level validation
//! and [`validate_cli_semantics`] for runtime warnings, all without spawning
//! a subprocess.

use std::path::PathBuf;

use brrr_paramfix::cli::{validate_cli_semantics, Cli};
use brrr_paramfix::exit_code;
use clap::Parser;
use tracing::Level;

// ============================================================================
// HELPERS
// ============================================================================

/// Attempt to parse a command line, returning Ok(Cli) or the clap error.
fn try_parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

/// Shorthand: parse must succeed.
fn must_parse(args: &[&str]) -> Cli {
    try_parse(args).unwrap_or_else(|e| panic!("expected parse to succeed, got:\n{}", e))
}

// ============================================================================
// TARGET
// ============================================================================

#[test]
fn target_is_required() {
    let err = try_parse(&["brrr-paramfix"]).expect_err("expected parse to fail");
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    assert_eq!(err.exit_code(), exit_code::USAGE);
}

#[test]
fn target_accepts_manifest_directory_and_file() {
    for target in ["tsconfig.json", "src/", "src/api.ts"] {
        let cli = must_parse(&["brrr-paramfix", target]);
        assert_eq!(cli.target, PathBuf::from(target));
        assert!(!cli.dry_run);
        assert!(cli.config.is_none());
    }
}

#[test]
fn extra_positional_rejected() {
    assert!(try_parse(&["brrr-paramfix", "a.ts", "b.ts"]).is_err());
}

#[test]
fn unknown_flag_rejected() {
    let err = try_parse(&["brrr-paramfix", "src/", "--apply"]).expect_err("expected failure");
    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}

// ============================================================================
// FLAGS
// ============================================================================

#[test]
fn dry_run_and_config_flags() {
    let cli = must_parse(&[
        "brrr-paramfix",
        "--dry-run",
        "--config",
        "ci/paramfix.toml",
        "tsconfig.json",
    ]);
    assert!(cli.dry_run);
    assert_eq!(cli.config, Some(PathBuf::from("ci/paramfix.toml")));
    assert_eq!(cli.target, PathBuf::from("tsconfig.json"));
}

#[test]
fn log_level_default_is_warn() {
    assert_eq!(must_parse(&["brrr-paramfix", "."]).log_level(), Level::WARN);
}

#[test]
fn log_level_precedence() {
    assert_eq!(must_parse(&["brrr-paramfix", "-q", "."]).log_level(), Level::ERROR);
    assert_eq!(must_parse(&["brrr-paramfix", "-v", "."]).log_level(), Level::INFO);
    assert_eq!(must_parse(&["brrr-paramfix", "--debug", "."]).log_level(), Level::DEBUG);
    assert_eq!(
        must_parse(&["brrr-paramfix", "-d", "-v", "-q", "."]).log_level(),
        Level::DEBUG
    );
}

// ============================================================================
// SEMANTIC WARNINGS
// ============================================================================

#[test]
fn quiet_with_verbose_warns() {
    let cli = must_parse(&["brrr-paramfix", "--quiet", "--verbose", "."]);
    let warnings = validate_cli_semantics(&cli);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("--quiet"));
}

#[test]
fn plain_invocation_has_no_warnings() {
    let cli = must_parse(&["brrr-paramfix", "--dry-run", "src/"]);
    assert!(validate_cli_semantics(&cli).is_empty());
}

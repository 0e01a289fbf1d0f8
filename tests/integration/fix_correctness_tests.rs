//! Integration tests for fix correctness -- verifying that fixes only add
//! `?` markers and never corrupt files.
//!
//! Coverage:
//!  - Fixture with every declaration shape
//!  - Text-level non-interference (output minus `?` == input)
//!  - Idempotency across runs
//!  - Manifest (`tsconfig.json`) and single-file targets
//!  - TSX sources
//!  - Config file include/exclude in directory mode
//!  - Files with syntax errors elsewhere

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use brrr_paramfix::config::FixFileConfig;
use brrr_paramfix::fix::{fix_unit, FixEngine, FixOptions, FixSummary};
use brrr_paramfix::lang::count_error_nodes;
use brrr_paramfix::project::SourceUnit;

// =============================================================================
// HELPERS
// =============================================================================

const SAMPLE: &str = include_str!("../fixtures/sample.ts");

/// Create a file inside `dir` (parents included) and return its path.
fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create_dir_all failed");
    }
    fs::write(&path, content).expect("write_file failed");
    path
}

/// Read a file to string, panicking with a clear message on failure.
fn read_file(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read_file({}): {}", path.display(), e))
}

/// Assert `after` equals `before` with some `?` characters inserted.
fn assert_only_markers_added(before: &str, after: &str) {
    let mut b = before.chars().peekable();
    for c in after.chars() {
        if b.peek() == Some(&c) {
            b.next();
        } else {
            assert_eq!(c, '?', "unexpected character {:?} inserted", c);
        }
    }
    assert!(b.next().is_none(), "output dropped input characters");
}

async fn run(options: FixOptions, target: &Path) -> (FixSummary, String) {
    let mut out = Vec::new();
    let summary = FixEngine::new(options)
        .run_with_output(target, &mut out)
        .await
        .unwrap_or_else(|e| panic!("run({}) failed: {}", target.display(), e));
    (summary, String::from_utf8(out).expect("output is UTF-8"))
}

// =============================================================================
// FIXTURE
// =============================================================================

#[test]
fn fixture_every_shape_is_repaired() {
    let mut unit = SourceUnit::parse("sample.ts", SAMPLE).unwrap();
    let report = fix_unit(&mut unit);

    let described: Vec<String> = report.fixes.iter().map(|f| f.describe()).collect();
    assert_eq!(
        described,
        vec![
            "function: invalidFunc",
            "function: withDefault",
            "constructor: MyClass",
            "method: MyClass.myMethod",
            "arrow function: arrowFn",
            "function expression: funcExpr",
            "method: onEvent",
            "arrow function: (anonymous)",
        ]
    );
    assert_eq!(report.declarations, 12);

    let fixed_params: Vec<&str> = report
        .fixes
        .iter()
        .flat_map(|f| f.params.iter().map(String::as_str))
        .collect();
    assert_eq!(
        fixed_params,
        vec!["required", "b", "req", "required", "flag", "b", "y", "payload", "index"]
    );

    let output = unit.render();
    assert_only_markers_added(SAMPLE, &output);
    assert!(output.contains("function withDefault(a = 10, b?: string, ...rest: number[])"));
    assert!(output.contains("function greet(name?: string, greeting?: string)"));
    assert!(output.contains("function validFunc(required: string, optional?: number)"));
    assert!(output.contains("static create(label: string, size?: number)"));
}

#[test]
fn fixture_output_parses_cleanly() {
    let mut unit = SourceUnit::parse("sample.ts", SAMPLE).unwrap();
    assert_eq!(unit.error_nodes(), 0);
    fix_unit(&mut unit);

    let reparsed = SourceUnit::parse("sample.ts", unit.render()).unwrap();
    assert_eq!(count_error_nodes(reparsed.tree()), 0);
}

// =============================================================================
// ENGINE
// =============================================================================

#[tokio::test]
async fn directory_run_then_idempotent_rerun() {
    let dir = TempDir::new().unwrap();
    let sample = write_file(dir.path(), "src/sample.ts", SAMPLE);

    let (first, out) = run(FixOptions::default(), dir.path()).await;
    assert_eq!(first.total_fixes, 8);
    assert_eq!(first.files_modified, 1);
    assert!(first.saved);
    assert!(out.contains("Fixed constructor: MyClass in "));
    assert!(out.ends_with("Done! Fixed 8 function(s) in 1 file(s).\n"));

    let after_first = read_file(&sample);
    assert_only_markers_added(SAMPLE, &after_first);

    let (second, out) = run(FixOptions::default(), dir.path()).await;
    assert_eq!(second.total_fixes, 0);
    assert!(!second.saved);
    assert!(out.ends_with("No TS1016 errors found.\n"));
    assert_eq!(read_file(&sample), after_first);
}

#[tokio::test]
async fn single_file_target() {
    let dir = TempDir::new().unwrap();
    let target = write_file(dir.path(), "one.ts", "function f(a?: number, b: number) {}\n");
    let other = write_file(dir.path(), "two.ts", "function g(a?: number, b: number) {}\n");

    let (summary, out) = run(FixOptions::default(), &target).await;

    assert_eq!(summary.files_scanned, 1);
    assert!(out.contains("Found 1 source files"));
    assert_eq!(read_file(&target), "function f(a?: number, b?: number) {}\n");
    assert_eq!(read_file(&other), "function g(a?: number, b: number) {}\n");
}

#[tokio::test]
async fn manifest_with_extends_and_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_file(root, "base.json", r#"{ "exclude": ["src/legacy"] }"#);
    write_file(
        root,
        "tsconfig.json",
        r#"{
  "extends": "./base.json",
  "files": ["tools/build.ts"],
  "include": ["src/**/*"],
}"#,
    );
    let broken = "export function f(a?: string, b: string) {}\n";
    let app = write_file(root, "src/app.ts", broken);
    let legacy = write_file(root, "src/legacy/old.ts", broken);
    let tool = write_file(root, "tools/build.ts", broken);
    let stray = write_file(root, "stray.ts", broken);

    let (summary, out) = run(FixOptions::default(), &root.join("tsconfig.json")).await;

    assert!(out.starts_with("Loading project from: "));
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.files_modified, 2);
    assert_eq!(read_file(&app), "export function f(a?: string, b?: string) {}\n");
    assert_eq!(read_file(&tool), "export function f(a?: string, b?: string) {}\n");
    assert_eq!(read_file(&legacy), broken);
    assert_eq!(read_file(&stray), broken);
}

#[tokio::test]
async fn tsx_sources_are_fixed() {
    let dir = TempDir::new().unwrap();
    let view = write_file(
        dir.path(),
        "View.tsx",
        "export const View = (title?: string, count: number) => <div>{title}{count}</div>;\n",
    );

    let (summary, _) = run(FixOptions::default(), dir.path()).await;

    assert_eq!(summary.total_fixes, 1);
    assert_eq!(
        read_file(&view),
        "export const View = (title?: string, count?: number) => <div>{title}{count}</div>;\n"
    );
}

#[tokio::test]
async fn config_filters_directory_mode() {
    let dir = TempDir::new().unwrap();
    let broken = "function f(a?: string, b: string) {}\n";
    let kept = write_file(dir.path(), "src/a.ts", broken);
    let generated = write_file(dir.path(), "src/generated/b.ts", broken);

    let config = FixFileConfig::parse("[files]\nexclude = [\"src/generated/**\"]\n").unwrap();
    let options = FixOptions::from_config(Some(&config), false).unwrap();
    let (summary, _) = run(options, dir.path()).await;

    assert_eq!(summary.files_scanned, 1);
    assert_eq!(read_file(&kept), "function f(a?: string, b?: string) {}\n");
    assert_eq!(read_file(&generated), broken);
}

#[tokio::test]
async fn dry_run_from_config_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "a.ts", SAMPLE);

    let config = FixFileConfig::parse("[fix]\ndry_run = true\n").unwrap();
    let options = FixOptions::from_config(Some(&config), false).unwrap();
    let (summary, out) = run(options, dir.path()).await;

    assert_eq!(summary.total_fixes, 8);
    assert!(!summary.saved);
    assert!(out.contains("Changes that would be made:"));
    assert!(out.contains("+ function invalidFunc(optional?: string, required?: number) {"));
    assert_eq!(read_file(&path), SAMPLE);
}

#[tokio::test]
async fn broken_declaration_left_alone_rest_fixed() {
    let dir = TempDir::new().unwrap();
    let source = "function bad(a?: string, b: number) { return 1 +; }\n\nfunction good(a?: string, b: number) {}\n";
    let path = write_file(dir.path(), "mixed.ts", source);

    let (summary, _) = run(FixOptions::default(), dir.path()).await;

    assert_eq!(summary.total_fixes, 1);
    let output = read_file(&path);
    assert!(output.contains("function good(a?: string, b?: number) {}"));
    assert!(output.contains("function bad(a?: string, b: number)"));
}

//! Target resolution and parallel loading.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::debug;
use tree_sitter::Parser;

use super::source::SourceUnit;
use super::tsconfig::{normalize_path, TsConfig};
use crate::config::FileMatcher;
use crate::error::{ParamFixError, Result};
use crate::lang::{is_typescript_file, Dialect};

/// Directory never descended into in directory mode.
const NODE_MODULES: &str = "node_modules";

/// What the invocation target turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOrigin {
    /// A `tsconfig.json` (or other `.json` manifest).
    Manifest(PathBuf),
    /// Every TypeScript file below a directory.
    Directory(PathBuf),
    /// One TypeScript file.
    File(PathBuf),
}

impl ProjectOrigin {
    /// Classify an invocation target. The path is made absolute.
    pub fn resolve(target: &Path) -> Result<Self> {
        if !target.exists() {
            return Err(ParamFixError::TargetNotFound(target.to_path_buf()));
        }
        let path = normalize_path(
            &std::path::absolute(target).map_err(|e| ParamFixError::io_with_path(e, target))?,
        );

        if path.is_dir() {
            Ok(ProjectOrigin::Directory(path))
        } else if path.extension().is_some_and(|ext| ext == "json") {
            Ok(ProjectOrigin::Manifest(path))
        } else if is_typescript_file(&path) {
            Ok(ProjectOrigin::File(path))
        } else {
            Err(ParamFixError::UnsupportedTarget {
                path,
                reason: "expected a tsconfig.json, a directory or a .ts/.tsx file".to_string(),
            })
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ProjectOrigin::Manifest(p) | ProjectOrigin::Directory(p) | ProjectOrigin::File(p) => p,
        }
    }

    pub fn is_manifest(&self) -> bool {
        matches!(self, ProjectOrigin::Manifest(_))
    }

    /// Sorted list of files to load.
    ///
    /// `matcher` filters directory mode only; manifests and single files
    /// already name exactly what they want.
    pub fn collect_files(&self, matcher: &FileMatcher) -> Result<Vec<PathBuf>> {
        match self {
            ProjectOrigin::Manifest(path) => TsConfig::load(path)?.collect_files(),
            ProjectOrigin::Directory(root) => collect_directory(root, matcher),
            ProjectOrigin::File(path) => Ok(vec![path.clone()]),
        }
    }
}

/// Recursive `.ts`/`.tsx`/`.mts`/`.cts` scan skipping hidden directories
/// and `node_modules`.
fn collect_directory(root: &Path, matcher: &FileMatcher) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .filter_entry(|entry| entry.file_name() != NODE_MODULES)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ParamFixError::Walk {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_typescript_file(path) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if matcher.is_included(relative) {
            files.push(path.to_path_buf());
        } else {
            debug!("Excluded by config: {}", relative.display());
        }
    }

    files.sort();
    Ok(files)
}

/// One parser per dialect, created on first use.
#[derive(Default)]
struct Parsers {
    typescript: Option<Parser>,
    tsx: Option<Parser>,
}

impl Parsers {
    fn get(&mut self, dialect: Dialect) -> Result<&mut Parser> {
        let slot = match dialect {
            Dialect::TypeScript => &mut self.typescript,
            Dialect::Tsx => &mut self.tsx,
        };
        if slot.is_none() {
            *slot = Some(dialect.parser()?);
        }
        slot.as_mut()
            .ok_or_else(|| ParamFixError::TreeSitter(format!("no {} parser", dialect.name())))
    }
}

/// Read and parse every file in parallel, keeping input order.
///
/// Each rayon worker owns its parsers. The first failure aborts the load.
pub fn parse_files(paths: Vec<PathBuf>) -> Result<Vec<SourceUnit>> {
    paths
        .into_par_iter()
        .map_init(Parsers::default, |parsers, path| load_unit(parsers, path))
        .collect()
}

fn load_unit(parsers: &mut Parsers, path: PathBuf) -> Result<SourceUnit> {
    let dialect = Dialect::from_path(&path).ok_or_else(|| ParamFixError::UnsupportedTarget {
        path: path.clone(),
        reason: "not a TypeScript source file".to_string(),
    })?;
    let bytes = std::fs::read(&path).map_err(|e| ParamFixError::io_with_path(e, &path))?;
    let text = String::from_utf8(bytes).map_err(|_| ParamFixError::Encoding(path.clone()))?;

    let unit = SourceUnit::parse_with(parsers.get(dialect)?, path, dialect, text)?;
    if unit.error_nodes() > 0 {
        debug!(
            "{} parsed with {} error node(s)",
            unit.path().display(),
            unit.error_nodes()
        );
    }
    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_resolve_target_kinds() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "tsconfig.json", "{}");
        touch(root, "a.ts", "");
        touch(root, "a.js", "");

        assert!(matches!(
            ProjectOrigin::resolve(root).unwrap(),
            ProjectOrigin::Directory(_)
        ));
        assert!(ProjectOrigin::resolve(&root.join("tsconfig.json"))
            .unwrap()
            .is_manifest());
        assert!(matches!(
            ProjectOrigin::resolve(&root.join("a.ts")).unwrap(),
            ProjectOrigin::File(_)
        ));
        assert!(matches!(
            ProjectOrigin::resolve(&root.join("a.js")),
            Err(ParamFixError::UnsupportedTarget { .. })
        ));
        assert!(matches!(
            ProjectOrigin::resolve(&root.join("missing.ts")),
            Err(ParamFixError::TargetNotFound(_))
        ));
    }

    #[test]
    fn test_directory_skips_hidden_and_node_modules() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "b.ts", "");
        touch(root, "src/a.tsx", "");
        touch(root, "src/c.d.ts", "");
        touch(root, "src/d.js", "");
        touch(root, ".cache/e.ts", "");
        touch(root, "node_modules/pkg/f.ts", "");
        touch(root, "src/node_modules/g.ts", "");

        let files = collect_directory(root, &FileMatcher::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["b.ts", "src/a.tsx", "src/c.d.ts"]);
    }

    #[test]
    fn test_directory_applies_file_matcher() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/a.ts", "");
        touch(root, "src/gen/b.ts", "");
        touch(root, "test/c.ts", "");

        let matcher = crate::config::FileMatcher::new(&crate::config::FilesConfig {
            include: vec!["src/**".into()],
            exclude: vec!["src/gen/**".into()],
        })
        .unwrap();
        let files = collect_directory(root, &matcher).unwrap();
        assert_eq!(files, vec![root.join("src/a.ts")]);
    }

    #[test]
    fn test_parse_files_keeps_order_and_dialect() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "a.ts", "function f(a?: string) {}\n");
        touch(root, "b.tsx", "const C = () => <div />;\n");
        touch(root, "c.ts", "export {};\n");

        let paths = vec![root.join("a.ts"), root.join("b.tsx"), root.join("c.ts")];
        let units = parse_files(paths.clone()).unwrap();

        let loaded: Vec<PathBuf> = units.iter().map(|u| u.path().to_path_buf()).collect();
        assert_eq!(loaded, paths);
        assert_eq!(units[1].dialect(), Dialect::Tsx);
        assert!(units.iter().all(|u| u.error_nodes() == 0));
    }

    #[test]
    fn test_parse_files_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.ts");
        fs::write(&path, [0x66, 0xff, 0xfe]).unwrap();

        let err = parse_files(vec![path]).unwrap_err();
        assert!(matches!(err, ParamFixError::Encoding(_)));
    }

    #[test]
    fn test_parse_files_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = parse_files(vec![dir.path().join("gone.ts")]).unwrap_err();
        assert!(matches!(err, ParamFixError::IoWithPath { .. }));
    }
}

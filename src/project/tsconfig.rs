//! `tsconfig.json` resolution.
//!
//! Handles the subset of the manifest that decides which files belong to a
//! project: `files`, `include`, `exclude`, `compilerOptions.outDir` and
//! `extends`. Patterns keep the directory of the config that declared them,
//! so a base config's `include` stays relative to the base.

use std::collections::BTreeSet;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::config::ConfigError;
use crate::error::{ParamFixError, Result};
use crate::lang::is_typescript_file;

/// Directories excluded when a config has no `exclude` of its own.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

/// Include pattern used when neither `files` nor `include` is given.
const DEFAULT_INCLUDE: &str = "**/*";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    extends: Option<Extends>,
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    #[serde(default)]
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

impl Extends {
    fn into_vec(self) -> Vec<String> {
        match self {
            Extends::One(s) => vec![s],
            Extends::Many(v) => v,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    out_dir: Option<String>,
}

/// Patterns plus the directory they are relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedPatterns {
    pub base: PathBuf,
    pub patterns: Vec<String>,
}

/// A manifest with its `extends` chain folded in.
#[derive(Debug, Clone)]
pub struct TsConfig {
    pub path: PathBuf,
    pub files: Option<ScopedPatterns>,
    pub include: Option<ScopedPatterns>,
    pub exclude: Option<ScopedPatterns>,
    pub out_dir: Option<PathBuf>,
}

impl TsConfig {
    /// Read a manifest and every config it extends.
    pub fn load(path: &Path) -> Result<Self> {
        let path = normalize_path(&std::path::absolute(path).map_err(|e| {
            ParamFixError::io_with_path(e, path)
        })?);
        let mut chain = Vec::new();
        Self::load_chained(&path, &mut chain)
    }

    fn load_chained(path: &Path, chain: &mut Vec<PathBuf>) -> Result<Self> {
        if chain.iter().any(|p| p == path) {
            return Err(ParamFixError::ManifestExtends {
                path: path.to_path_buf(),
                reason: "circular `extends` chain".to_string(),
            });
        }
        chain.push(path.to_path_buf());

        let raw = read_raw(path)?;
        let dir = parent_dir(path);

        let mut merged = TsConfig {
            path: path.to_path_buf(),
            files: None,
            include: None,
            exclude: None,
            out_dir: None,
        };

        // Later bases override earlier ones; the config itself overrides all.
        for spec in raw.extends.map(Extends::into_vec).unwrap_or_default() {
            let base_path = resolve_extends(&dir, &spec).ok_or_else(|| {
                ParamFixError::ManifestExtends {
                    path: path.to_path_buf(),
                    reason: format!("cannot find base config '{}'", spec),
                }
            })?;
            debug!("{} extends {}", path.display(), base_path.display());
            let base = Self::load_chained(&base_path, chain)?;
            merged.files = base.files.or(merged.files);
            merged.include = base.include.or(merged.include);
            merged.exclude = base.exclude.or(merged.exclude);
            merged.out_dir = base.out_dir.or(merged.out_dir);
        }

        let scoped = |patterns: Option<Vec<String>>| {
            patterns.map(|patterns| ScopedPatterns {
                base: dir.clone(),
                patterns,
            })
        };
        if raw.files.is_some() {
            merged.files = scoped(raw.files);
        }
        if raw.include.is_some() {
            merged.include = scoped(raw.include);
        }
        if raw.exclude.is_some() {
            merged.exclude = scoped(raw.exclude);
        }
        if let Some(out_dir) = raw.compiler_options.out_dir {
            merged.out_dir = Some(normalize_path(&dir.join(out_dir)));
        }

        chain.pop();
        Ok(merged)
    }

    /// Directory of the manifest itself.
    pub fn dir(&self) -> PathBuf {
        parent_dir(&self.path)
    }

    /// `include` with the `**/*` default applied.
    pub fn effective_include(&self) -> Option<ScopedPatterns> {
        match (&self.files, &self.include) {
            (_, Some(include)) => Some(include.clone()),
            (None, None) => Some(ScopedPatterns {
                base: self.dir(),
                patterns: vec![DEFAULT_INCLUDE.to_string()],
            }),
            (Some(_), None) => None,
        }
    }

    /// `exclude` with the default directories applied.
    pub fn effective_exclude(&self) -> ScopedPatterns {
        if let Some(exclude) = &self.exclude {
            return exclude.clone();
        }
        let dir = self.dir();
        let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        if let Some(out_dir) = &self.out_dir {
            patterns.push(out_dir.to_string_lossy().into_owned());
        }
        ScopedPatterns {
            base: dir,
            patterns,
        }
    }

    /// Every TypeScript file the manifest selects, sorted.
    ///
    /// Entries of `files` must exist; `exclude` does not apply to them.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut selected = BTreeSet::new();

        if let Some(files) = &self.files {
            for entry in &files.patterns {
                let path = normalize_path(&files.base.join(entry));
                if !path.is_file() {
                    return Err(ParamFixError::io_with_path(
                        io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("listed in `files` of {}", self.path.display()),
                        ),
                        path,
                    ));
                }
                if is_typescript_file(&path) {
                    selected.insert(path);
                } else {
                    debug!("Skipping non-TypeScript entry {}", path.display());
                }
            }
        }

        if let Some(include) = self.effective_include() {
            let include_specs: Vec<PatternSpec> = include
                .patterns
                .iter()
                .map(|p| PatternSpec::new(&include.base, p, true))
                .collect();
            let exclude = self.effective_exclude();
            let exclude_specs: Vec<PatternSpec> = exclude
                .patterns
                .iter()
                .map(|p| PatternSpec::new(&exclude.base, p, false))
                .collect();

            let include_set = build_set(&include_specs, false)?;
            let exclude_set = build_set(&exclude_specs, true)?;

            for root in walk_roots(&include_specs) {
                let pruned = exclude_set.clone();
                let walker = WalkBuilder::new(&root)
                    .standard_filters(false)
                    .hidden(true)
                    .filter_entry(move |entry| !pruned.is_match(entry.path()))
                    .build();

                for entry in walker {
                    let entry = entry.map_err(|e| ParamFixError::Walk {
                        path: root.clone(),
                        source: e,
                    })?;
                    let path = entry.path();
                    if entry.file_type().is_some_and(|t| t.is_file())
                        && is_typescript_file(path)
                        && include_set.is_match(path)
                    {
                        selected.insert(normalize_path(path));
                    }
                }
            }
        }

        Ok(selected.into_iter().collect())
    }
}

fn read_raw(path: &Path) -> Result<RawTsConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| ParamFixError::io_with_path(e, path))?;
    serde_json::from_str(&strip_jsonc(&text)).map_err(|e| ParamFixError::Manifest {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Locate the file named by an `extends` entry.
fn resolve_extends(dir: &Path, spec: &str) -> Option<PathBuf> {
    let is_relative = spec.starts_with("./") || spec.starts_with("../");
    if is_relative || Path::new(spec).is_absolute() {
        let mut path = normalize_path(&dir.join(spec));
        if !path.extension().is_some_and(|ext| ext == "json") {
            path.as_mut_os_string().push(".json");
        }
        return path.is_file().then_some(path);
    }

    // Package reference: look in node_modules of every ancestor.
    for ancestor in dir.ancestors() {
        let candidate = ancestor.join("node_modules").join(spec);
        if candidate.is_file() {
            return Some(candidate);
        }
        let mut with_ext = candidate.clone().into_os_string();
        with_ext.push(".json");
        let with_ext = PathBuf::from(with_ext);
        if with_ext.is_file() {
            return Some(with_ext);
        }
        let nested = candidate.join("tsconfig.json");
        if nested.is_file() {
            return Some(nested);
        }
    }
    None
}

/// A pattern split into its literal directory prefix and wildcard tail.
#[derive(Debug, Clone)]
struct PatternSpec {
    /// Absolute, normalized literal prefix (also the walk root).
    root: PathBuf,
    /// Remaining glob segments, `/`-joined; empty when fully literal.
    tail: String,
}

impl PatternSpec {
    fn new(base: &Path, pattern: &str, is_include: bool) -> Self {
        let pattern = pattern.trim_start_matches("./");
        let segments: Vec<&str> = pattern.split(['/', '\\']).filter(|s| !s.is_empty()).collect();
        let literal_len = segments
            .iter()
            .position(|s| has_wildcard(s))
            .unwrap_or(segments.len());

        let mut root = if Path::new(pattern).is_absolute() {
            PathBuf::from("/")
        } else {
            base.to_path_buf()
        };
        for segment in &segments[..literal_len] {
            root.push(segment);
        }
        let root = normalize_path(&root);

        let mut tail = segments[literal_len..].join("/");
        // `src` or `src/lib` (no wildcard, no extension) names a directory.
        let names_directory = tail.is_empty() && root.extension().is_none();
        if is_include && names_directory {
            tail = DEFAULT_INCLUDE.to_string();
        }

        Self { root, tail }
    }

    fn globs(&self, as_exclude: bool) -> Vec<String> {
        let root = globset::escape(&self.root.to_string_lossy());
        let root = root.trim_end_matches('/');
        if self.tail.is_empty() {
            if as_exclude {
                vec![root.to_string(), format!("{}/**", root)]
            } else {
                vec![root.to_string()]
            }
        } else if as_exclude {
            vec![format!("{}/{}", root, self.tail), format!("{}/{}/**", root, self.tail)]
        } else {
            vec![format!("{}/{}", root, self.tail)]
        }
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

fn build_set(specs: &[PatternSpec], as_exclude: bool) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for spec in specs {
        for glob in spec.globs(as_exclude) {
            let compiled = GlobBuilder::new(&glob)
                .literal_separator(true)
                .build()
                .map_err(|e| ConfigError::InvalidGlob(glob.clone(), e.to_string()))?;
            builder.add(compiled);
        }
    }
    builder
        .build()
        .map_err(|e| ConfigError::InvalidGlob("(build)".into(), e.to_string()).into())
}

/// Deepest common set of directories to walk: nested roots are dropped.
fn walk_roots(specs: &[PatternSpec]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = specs
        .iter()
        .map(|s| {
            if s.tail.is_empty() {
                // A literal file pattern: walk its directory.
                parent_dir(&s.root)
            } else {
                s.root.clone()
            }
        })
        .filter(|r| r.is_dir())
        .collect();
    roots.sort();
    roots.dedup();

    let mut kept: Vec<PathBuf> = Vec::new();
    for root in roots {
        if !kept.iter().any(|k| root.starts_with(k)) {
            kept.push(root);
        }
    }
    kept
}

/// Lexically resolve `.` and `..` without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Turn JSON-with-comments into plain JSON.
///
/// Comments become whitespace (line breaks are kept, so serde error
/// positions still point at the right line) and trailing commas before `}`
/// or `]` are dropped.
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut pending_comma: Option<usize> = None;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                pending_comma = None;
                out.push(c);
                while let Some(s) = chars.next() {
                    out.push(s);
                    match s {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for s in chars.by_ref() {
                    if s == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for s in chars.by_ref() {
                    if prev == '*' && s == '/' {
                        break;
                    }
                    if s == '\n' {
                        out.push('\n');
                    }
                    prev = s;
                }
                out.push(' ');
            }
            ',' => {
                pending_comma = Some(out.len());
                out.push(c);
            }
            '}' | ']' => {
                if let Some(at) = pending_comma.take() {
                    out.replace_range(at..at + 1, " ");
                }
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                pending_comma = None;
                out.push(c);
            }
        }
    }

    out
}

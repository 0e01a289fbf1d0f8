//! Parsed source units with a pending-marker overlay.
//!
//! tree-sitter trees are immutable, so "setting the optional marker" on a
//! parameter records the byte offset where `?` must be inserted. Queries go
//! through the overlay, which keeps repeated walks of an unsaved unit
//! idempotent. `render` produces the rewritten text; nothing but the `?`
//! characters changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tree_sitter::{Parser, Tree};

use crate::error::{ParamFixError, Result};
use crate::lang::typescript::parse_source;
use crate::lang::{count_error_nodes, Dialect};

/// Text inserted for an explicit optional marker.
pub const OPTIONAL_MARKER: &str = "?";

/// One rewritten line, for dry-run previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// Line number (1-indexed).
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// A TypeScript file loaded into memory and parsed.
pub struct SourceUnit {
    path: PathBuf,
    dialect: Dialect,
    text: String,
    tree: Tree,
    error_nodes: usize,
    pending: BTreeSet<usize>,
}

impl SourceUnit {
    /// Parse `text` with a fresh parser for the dialect implied by `path`.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let dialect = Dialect::from_path(&path).ok_or_else(|| ParamFixError::UnsupportedTarget {
            path: path.clone(),
            reason: "not a TypeScript source file".to_string(),
        })?;
        let mut parser = dialect.parser()?;
        Self::parse_with(&mut parser, path, dialect, text.into())
    }

    /// Parse `text` with a caller-owned parser (already set to `dialect`).
    pub fn parse_with(
        parser: &mut Parser,
        path: PathBuf,
        dialect: Dialect,
        text: String,
    ) -> Result<Self> {
        let tree = parse_source(parser, &text, &path)?;
        let error_nodes = count_error_nodes(&tree);
        Ok(Self {
            path,
            dialect,
            text,
            tree,
            error_nodes,
            pending: BTreeSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// ERROR/MISSING nodes in the current tree.
    pub fn error_nodes(&self) -> usize {
        self.error_nodes
    }

    /// A `?` has been requested at `offset` but not yet saved.
    pub fn has_pending_marker(&self, offset: usize) -> bool {
        self.pending.contains(&offset)
    }

    /// Request a `?` at `offset`. Requesting the same offset twice is a no-op.
    pub fn set_optional_marker(&mut self, offset: usize) {
        debug_assert!(self.text.is_char_boundary(offset));
        self.pending.insert(offset);
    }

    pub fn pending_markers(&self) -> usize {
        self.pending.len()
    }

    /// Unsaved markers exist.
    pub fn is_modified(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Current text with every pending marker inserted.
    pub fn render(&self) -> String {
        insert_markers(&self.text, 0, self.text.len(), &self.pending)
    }

    /// Lines touched by pending markers, before and after.
    pub fn changed_lines(&self) -> Vec<LineChange> {
        let line_starts = line_starts(&self.text);
        let mut changes: Vec<LineChange> = Vec::new();

        for &offset in &self.pending {
            let idx = line_starts.partition_point(|&start| start <= offset) - 1;
            let line = idx + 1;
            if changes.last().is_some_and(|c| c.line == line) {
                continue;
            }

            let start = line_starts[idx];
            let end = line_starts
                .get(idx + 1)
                .map(|next| next - 1)
                .unwrap_or(self.text.len());
            let before = self.text[start..end].trim_end_matches('\r').to_string();
            let after = insert_markers(&self.text, start, end, &self.pending)
                .trim_end_matches('\r')
                .to_string();
            changes.push(LineChange { line, before, after });
        }

        changes
    }

    /// Render and re-parse, without touching the unit.
    pub(crate) fn reparse_rendered(&self) -> Result<(String, Tree, usize)> {
        let rendered = self.render();
        let mut parser = self.dialect.parser()?;
        let tree = parse_source(&mut parser, &rendered, &self.path)?;
        let errors = count_error_nodes(&tree);
        Ok((rendered, tree, errors))
    }

    /// Adopt a saved rendering as the new baseline.
    pub(crate) fn commit(&mut self, text: String, tree: Tree, error_nodes: usize) {
        self.text = text;
        self.tree = tree;
        self.error_nodes = error_nodes;
        self.pending.clear();
    }
}

impl std::fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceUnit")
            .field("path", &self.path)
            .field("dialect", &self.dialect)
            .field("len", &self.text.len())
            .field("pending", &self.pending)
            .finish()
    }
}

/// Copy `text[start..end]`, inserting a marker at each offset in the range.
fn insert_markers(text: &str, start: usize, end: usize, offsets: &BTreeSet<usize>) -> String {
    let mut out = String::with_capacity(end - start + offsets.len());
    let mut last = start;
    for &offset in offsets.range(start..=end) {
        out.push_str(&text[last..offset]);
        out.push_str(OPTIONAL_MARKER);
        last = offset;
    }
    out.push_str(&text[last..end]);
    out
}

/// Byte offset of the first character of every line.
fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

//! TypeScript grammar selection and parsing helpers.
//!
//! The `Dialect` decides which tree-sitter grammar parses a file:
//! - `TypeScript`: LANGUAGE_TYPESCRIPT (for .ts, .mts, .cts files)
//! - `Tsx`: LANGUAGE_TSX (for .tsx files that may contain JSX syntax)

use std::path::Path;

use tree_sitter::{Parser, Tree};

use crate::error::{ParamFixError, Result};

/// TypeScript grammar variant used to parse a source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    /// Pick the dialect from a file extension.
    ///
    /// Declaration files (`.d.ts`) are plain TypeScript.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "ts" | "mts" | "cts" => Some(Dialect::TypeScript),
            "tsx" => Some(Dialect::Tsx),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::TypeScript => "typescript",
            Dialect::Tsx => "tsx",
        }
    }

    /// Create a parser configured for this dialect.
    ///
    /// TSX grammar is required for JSX syntax; using LANGUAGE_TYPESCRIPT on
    /// a `.tsx` file turns every element into an ERROR node.
    pub fn parser(self) -> Result<Parser> {
        let lang = match self {
            Dialect::TypeScript => &tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
            Dialect::Tsx => &tree_sitter_typescript::LANGUAGE_TSX,
        };
        let mut parser = Parser::new();
        parser
            .set_language(&(*lang).into())
            .map_err(|e| ParamFixError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }
}

/// Check if a path names a TypeScript source file this tool rewrites.
pub fn is_typescript_file(path: &Path) -> bool {
    Dialect::from_path(path).is_some()
}

/// Parse `source` with an already configured parser.
pub fn parse_source(parser: &mut Parser, source: &str, path: &Path) -> Result<Tree> {
    parser.parse(source, None).ok_or_else(|| {
        ParamFixError::TreeSitter(format!("parser produced no tree for {}", path.display()))
    })
}

/// Count ERROR and MISSING nodes in a tree.
///
/// Subtrees without errors are never entered, so clean files cost one
/// visit of the root.
pub fn count_error_nodes(tree: &Tree) -> usize {
    let mut cursor = tree.walk();
    let mut count = 0;

    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            count += 1;
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return count;
            }
        }
    }
}

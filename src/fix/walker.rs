//! Declaration walker.
//!
//! One stack-based depth-first traversal classifies every node of a unit,
//! so each function-like declaration is visited exactly once no matter how
//! deeply it is nested: named functions, class methods and constructors (in
//! class declarations and class expressions), object-literal methods, arrow
//! functions and function expressions.
//!
//! Tree-sitter node kinds handled:
//! - `function_declaration`, `generator_function_declaration` -> Function
//! - `method_definition` -> Method, or Constructor when named `constructor`
//!   inside a class body
//! - `arrow_function` -> Arrow
//! - `function_expression`, `generator_function` -> Expression
//! - `abstract_method_signature` -> Method
//! - `function_signature`, and `method_signature` inside a class body, when
//!   ambient (`declare`, or a `.d.ts` file) -> Function, Method or Constructor
//!
//! Bodiless overloads next to an implementation are not visited; the
//! implementation carries the parameter list that matters.

use std::fmt;
use std::path::{Path, PathBuf};

use tree_sitter::Node;
use tracing::{debug, warn};

use super::params::{repair_parameters, Parameter};
use crate::project::SourceUnit;

/// Placeholder for declarations without a recoverable name.
pub const ANONYMOUS: &str = "(anonymous)";

/// Syntactic shape of a function-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Function,
    Method,
    Constructor,
    Arrow,
    Expression,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Function => "function",
            DeclarationKind::Method => "method",
            DeclarationKind::Constructor => "constructor",
            DeclarationKind::Arrow => "arrow function",
            DeclarationKind::Expression => "function expression",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declaration with a parameter list, detached from the tree.
#[derive(Debug, Clone)]
pub struct FunctionLike {
    pub kind: DeclarationKind,
    /// Own name, or the binding it is assigned to (`const f = () => {}`).
    pub name: Option<String>,
    /// Enclosing class for methods and constructors.
    pub owner: Option<String>,
    /// Starting line number (1-indexed).
    pub line: usize,
    pub params: Vec<Parameter>,
}

impl FunctionLike {
    pub fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.params
    }
}

/// One repaired declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixRecord {
    pub kind: DeclarationKind,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub line: usize,
    /// Parameters that received a `?` marker, in declaration order.
    pub params: Vec<String>,
}

impl FixRecord {
    /// `method: Greeter.greet`, `constructor: Greeter`, `arrow function: (anonymous)`.
    pub fn describe(&self) -> String {
        let name = self.name.as_deref().unwrap_or(ANONYMOUS);
        match self.kind {
            DeclarationKind::Constructor => {
                format!("{}: {}", self.kind, self.owner.as_deref().unwrap_or(ANONYMOUS))
            }
            DeclarationKind::Method => match &self.owner {
                Some(owner) => format!("{}: {}.{}", self.kind, owner, name),
                None => format!("{}: {}", self.kind, name),
            },
            _ => format!("{}: {}", self.kind, name),
        }
    }
}

/// Result of walking one unit.
#[derive(Debug, Clone, Default)]
pub struct UnitReport {
    pub path: PathBuf,
    /// Function-like declarations inspected.
    pub declarations: usize,
    /// Declarations skipped because their subtree has syntax errors.
    pub skipped: usize,
    pub fixes: Vec<FixRecord>,
}

impl UnitReport {
    /// Declarations that were mutated.
    pub fn fix_count(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_clean(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Walk a unit, repair every declaration and record the `?` markers.
pub fn fix_unit(unit: &mut SourceUnit) -> UnitReport {
    let (declarations, skipped) = collect_function_likes(unit);
    let mut report = UnitReport {
        path: unit.path().to_path_buf(),
        declarations: declarations.len(),
        skipped,
        fixes: Vec::new(),
    };

    for mut decl in declarations {
        let fixed = repair_parameters(decl.parameters_mut());
        if fixed.is_empty() {
            continue;
        }

        for param in decl.params.iter().filter(|p| p.is_modified()) {
            unit.set_optional_marker(param.marker_offset);
        }

        debug!(
            "{}:{}: {} {} -> {:?}",
            unit.path().display(),
            decl.line,
            decl.kind,
            decl.name.as_deref().unwrap_or(ANONYMOUS),
            fixed
        );

        report.fixes.push(FixRecord {
            kind: decl.kind,
            name: decl.name,
            owner: decl.owner,
            line: decl.line,
            params: fixed,
        });
    }

    report
}

/// Enumerate every function-like declaration in source order.
///
/// Returns the declarations and the number skipped for syntax errors.
pub fn collect_function_likes(unit: &SourceUnit) -> (Vec<FunctionLike>, usize) {
    let source = unit.source();
    let declaration_file = is_declaration_file(unit.path());
    let mut found = Vec::new();
    let mut skipped = 0;
    let mut stack = vec![unit.tree().root_node()];

    while let Some(node) = stack.pop() {
        if let Some(kind) = declaration_kind(node, source, declaration_file) {
            if node.has_error() {
                warn!(
                    "{}:{}: skipping {} with syntax errors",
                    unit.path().display(),
                    node.start_position().row + 1,
                    kind
                );
                skipped += 1;
            } else {
                found.push(extract_function_like(kind, node, unit));
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    (found, skipped)
}

/// Classify a node as a function-like declaration.
///
/// `declaration_file` marks a `.d.ts` unit, where every signature is ambient.
fn declaration_kind(node: Node, source: &[u8], declaration_file: bool) -> Option<DeclarationKind> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            Some(DeclarationKind::Function)
        }
        "function_expression" | "generator_function" => Some(DeclarationKind::Expression),
        "arrow_function" => Some(DeclarationKind::Arrow),
        "method_definition" => Some(member_kind(node, source)),
        "abstract_method_signature" => Some(DeclarationKind::Method),
        "function_signature" if declaration_file || in_ambient_context(node) => {
            Some(DeclarationKind::Function)
        }
        "method_signature"
            if enclosing_class(node).is_some()
                && (declaration_file || in_ambient_context(node)) =>
        {
            Some(member_kind(node, source))
        }
        _ => None,
    }
}

/// Method or constructor, for a member that sits in a class body.
fn member_kind(node: Node, source: &[u8]) -> DeclarationKind {
    let is_constructor = enclosing_class(node).is_some()
        && node
            .child_by_field_name("name")
            .is_some_and(|n| member_name(n, source) == "constructor");
    if is_constructor {
        DeclarationKind::Constructor
    } else {
        DeclarationKind::Method
    }
}

/// Property name with string-literal quotes removed: `'constructor'` -> `constructor`.
fn member_name<'a>(name: Node, source: &'a [u8]) -> &'a str {
    let text = get_text(name, source);
    if name.kind() == "string" {
        text.trim_matches(|c| c == '\'' || c == '"')
    } else {
        text
    }
}

/// Inside a `declare ...` statement (including `declare module` and `declare namespace`).
fn in_ambient_context(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "ambient_declaration" {
            return true;
        }
        current = n.parent();
    }
    false
}

/// `.d.ts`, `.d.mts` and `.d.cts` files contain only ambient declarations.
fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".d.ts") || n.ends_with(".d.mts") || n.ends_with(".d.cts"))
}

fn extract_function_like(kind: DeclarationKind, node: Node, unit: &SourceUnit) -> FunctionLike {
    let source = unit.source();

    let (name, owner) = match kind {
        DeclarationKind::Method | DeclarationKind::Constructor => {
            let name = node
                .child_by_field_name("name")
                .map(|n| get_text(n, source).to_string());
            let owner = enclosing_class(node).and_then(|class| {
                class
                    .child_by_field_name("name")
                    .map(|n| get_text(n, source).to_string())
            });
            (name, owner)
        }
        _ => (function_name_with_context(node, source), None),
    };

    let params = if let Some(list) = node.child_by_field_name("parameters") {
        extract_parameters(list, unit)
    } else if let Some(single) = node.child_by_field_name("parameter") {
        // `x => x`: one bare identifier, never in violation.
        vec![Parameter::new(get_text(single, source), single.end_byte())]
    } else {
        Vec::new()
    };

    FunctionLike {
        kind,
        name,
        owner,
        line: node.start_position().row + 1,
        params,
    }
}

/// Read the `formal_parameters` list through the unit's marker overlay.
fn extract_parameters(list: Node, unit: &SourceUnit) -> Vec<Parameter> {
    let source = unit.source();
    let mut params = Vec::new();
    let mut cursor = list.walk();

    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "required_parameter" | "optional_parameter" => {
                let Some(pattern) = child.child_by_field_name("pattern") else {
                    continue;
                };
                let offset = pattern.end_byte();
                let mut param = Parameter::new(get_text(pattern, source), offset);
                param.is_rest = pattern.kind() == "rest_pattern";
                param.has_question_token =
                    child.kind() == "optional_parameter" || unit.has_pending_marker(offset);
                param.has_initializer = child.child_by_field_name("value").is_some();
                params.push(param);
            }
            "comment" => {}
            // Bare JavaScript-style patterns, in case the grammar emits them.
            other => {
                let offset = child.end_byte();
                let mut param = Parameter::new(get_text(child, source), offset);
                param.is_rest = other == "rest_pattern";
                param.has_initializer = other == "assignment_pattern";
                param.has_question_token = unit.has_pending_marker(offset);
                params.push(param);
            }
        }
    }

    params
}

/// The class whose body directly contains this method, if any.
fn enclosing_class(method: Node) -> Option<Node> {
    let body = method.parent()?;
    if body.kind() != "class_body" {
        return None;
    }
    body.parent()
}

/// Name of a function, falling back to the binding it is assigned to.
///
/// Handles `const f = () => {}`, `{ key: function () {} }`,
/// `handler = () => {}` class fields and `exports.f = function () {}`.
fn function_name_with_context(node: Node, source: &[u8]) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(get_text(name, source).to_string());
    }

    let parent = node.parent()?;
    match parent.kind() {
        "variable_declarator" | "public_field_definition" => parent
            .child_by_field_name("name")
            .map(|n| get_text(n, source).to_string()),
        "pair" => parent
            .child_by_field_name("key")
            .map(|n| get_text(n, source).to_string()),
        "assignment_expression" => parent.child_by_field_name("left").and_then(|n| {
            match n.kind() {
                "identifier" => Some(get_text(n, source).to_string()),
                "member_expression" => n
                    .child_by_field_name("property")
                    .map(|p| get_text(p, source).to_string()),
                _ => None,
            }
        }),
        _ => None,
    }
}

fn get_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.start_byte()..node.end_byte()]).unwrap_or("")
}

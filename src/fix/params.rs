//! Parameter sequence repair.
//!
//! TypeScript rejects a required parameter that follows an optional one
//! (TS1016). The repair widens every such required parameter to optional by
//! adding the `?` marker. Parameters are never reordered, renamed, retyped
//! or removed, and default values are left alone.

/// Read/write view of one entry in a parameter list.
///
/// The repairer is written once against this trait, so every declaration
/// shape (and every test double) shares the same logic.
pub trait ParamNode {
    /// Source text of the binding (`name`, `{ a, b }`, `...rest`).
    fn name(&self) -> &str;

    /// `...rest` parameter.
    fn is_rest(&self) -> bool;

    /// Carries an explicit `?` marker.
    fn has_question_token(&self) -> bool;

    /// Has a default value (`x = 1`).
    fn has_initializer(&self) -> bool;

    /// Add the explicit `?` marker.
    fn set_question_token(&mut self);
}

/// A parameter may be omitted at a call site.
#[inline]
pub fn is_optional<P: ParamNode + ?Sized>(param: &P) -> bool {
    param.has_question_token() || param.has_initializer()
}

/// Make every required parameter that follows an optional one optional.
///
/// Single left-to-right pass. Rest parameters are invisible: they neither
/// start nor stop the optional run and are never modified. Returns the names
/// of the parameters that received a marker; an empty vector means the list
/// was already valid. Running it again on the result changes nothing.
pub fn repair_parameters<P: ParamNode>(params: &mut [P]) -> Vec<String> {
    let mut seen_optional = false;
    let mut fixed = Vec::new();

    for param in params.iter_mut() {
        if param.is_rest() {
            continue;
        }

        if is_optional(param) {
            seen_optional = true;
        } else if seen_optional {
            param.set_question_token();
            fixed.push(param.name().to_string());
        }
    }

    fixed
}

/// Check a parameter list for a required parameter after an optional one.
pub fn has_ordering_violation<P: ParamNode>(params: &[P]) -> bool {
    let mut seen_optional = false;
    for param in params.iter().filter(|p| !p.is_rest()) {
        if is_optional(param) {
            seen_optional = true;
        } else if seen_optional {
            return true;
        }
    }
    false
}

/// One parameter extracted from a syntax tree.
///
/// The tree itself is immutable; `set_question_token` flips the local flag
/// and remembers that the owning unit must insert `?` at `marker_offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub is_rest: bool,
    pub has_question_token: bool,
    pub has_initializer: bool,
    /// Byte offset right after the binding pattern, where `?` goes.
    pub marker_offset: usize,
    modified: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, marker_offset: usize) -> Self {
        Self {
            name: name.into(),
            is_rest: false,
            has_question_token: false,
            has_initializer: false,
            marker_offset,
            modified: false,
        }
    }

    pub fn rest(mut self) -> Self {
        self.is_rest = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.has_question_token = true;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_initializer = true;
        self
    }

    /// The repairer added a marker to this parameter.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl ParamNode for Parameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_rest(&self) -> bool {
        self.is_rest
    }

    fn has_question_token(&self) -> bool {
        self.has_question_token
    }

    fn has_initializer(&self) -> bool {
        self.has_initializer
    }

    fn set_question_token(&mut self) {
        if !self.has_question_token {
            self.has_question_token = true;
            self.modified = true;
        }
    }
}

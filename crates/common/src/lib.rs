//! # Common: shared data model
//!
//! Types exchanged between the Anatomist (extraction), the Forge (rewriting)
//! and the CLI. Everything here is a plain value: built once per input,
//! returned by value, never shared mutably.

pub mod comments;
pub mod mode;

pub use comments::{Comment, CommentCorpus};
pub use mode::{Mode, UnsupportedMode};

use serde::{Deserialize, Serialize};

/// Line/column location in a source text. `line` is 1-indexed, `column` is a
/// 0-indexed character offset within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Runtime type of a literal constant, carrying its value verbatim.
///
/// Numeric variants keep the source spelling (`0x1F`, `1_000`, `2.5e3`) and
/// string variants keep the raw body between the quotes, escapes undecoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LiteralValue {
    Str(String),
    Bytes(String),
    Int(String),
    Float(String),
    Complex(String),
    Bool(bool),
    None,
    Ellipsis,
}

/// Distinguishes text strings from byte strings. Non-string literals carry no tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringTag {
    Text,
    Bytes,
}

/// One hardcoded value found in the tree: `(value, type_tag)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: LiteralValue,
    pub tag: Option<StringTag>,
}

impl Literal {
    pub fn new(value: LiteralValue, tag: Option<StringTag>) -> Self {
        Self { value, tag }
    }

    /// Shorthand for a non-string literal (no tag).
    pub fn untagged(value: LiteralValue) -> Self {
        Self { value, tag: None }
    }
}

/// Identifier inventory of one source unit.
///
/// Every sequence is in document (pre-order) order and keeps duplicates.
/// Downstream rewriting re-indexes candidates positionally, so order matters.
///
/// A name that is assigned shows up in both `terminals` (every mention) and
/// `variables` (every write target).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// One entry per function definition, duplicates preserved.
    pub function_names: Vec<String>,
    /// Every bare name reference, read or write position.
    pub terminals: Vec<String>,
    /// Positional parameter names of every function, in declaration order.
    pub arg_variables: Vec<String>,
    /// Assignment targets (first target only; tuple elements expanded).
    pub variables: Vec<String>,
    /// Literal constants with their type tags.
    pub hardcoded_values: Vec<Literal>,
}

impl Inventory {
    /// Rename candidates in inventory order: `variables` followed by
    /// `arg_variables`, duplicates kept.
    pub fn rename_candidates(&self) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .chain(self.arg_variables.iter())
            .map(String::as_str)
    }

    /// Returns `true` when the unit has neither assignment targets nor parameters.
    pub fn has_no_candidates(&self) -> bool {
        self.variables.is_empty() && self.arg_variables.is_empty()
    }
}

//! Tree-sitter Python parsing with strict error reporting.
//!
//! Tree-sitter recovers from syntax errors by inserting `ERROR` and `MISSING`
//! nodes. The pipeline must not traverse a recovered tree, so any such node
//! turns the whole parse into [`AnatomistError::Parse`].

use common::Position;
use tree_sitter::{Node, Parser, Point, Tree};

use crate::AnatomistError;

/// Parses `source` into a tree-sitter tree.
///
/// Creates a local `Parser` per call, so callers can share nothing and still
/// parse concurrently.
///
/// # Errors
/// - `GrammarLoad`: the Python grammar could not be attached to the parser.
/// - `Parse`: the tree contains an error or missing node; the position is
///   that of the first one in document order.
pub fn parse(source: &str) -> Result<Tree, AnatomistError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| AnatomistError::GrammarLoad(e.to_string()))?;

    let tree = parser.parse(source, None).ok_or_else(|| AnatomistError::Parse {
        position: Position::new(1, 0),
        reason: "tree-sitter returned no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let culprit = first_error(root).unwrap_or(root);
        let reason = if culprit.is_missing() {
            format!("missing `{}`", culprit.kind())
        } else {
            "invalid syntax".to_string()
        };
        return Err(AnatomistError::Parse {
            position: char_position(source, culprit.start_byte(), culprit.start_position()),
            reason,
        });
    }

    Ok(tree)
}

/// First `ERROR` or `MISSING` node in pre-order, descending only into
/// subtrees that report an error.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let next = node.children(&mut cursor).find(|c| c.has_error());
        node = next?;
    }
}

/// Converts a tree-sitter point (byte column) into a 1-indexed line and a
/// character column.
fn char_position(source: &str, byte: usize, point: Point) -> Position {
    let line_start = byte.saturating_sub(point.column);
    let column = source
        .get(line_start..byte)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(point.column);
    Position::new(point.row as u32 + 1, column as u32)
}

//! Syntax tree traversal building the identifier [`Inventory`].
//!
//! One pre-order pass over the tree. Each node kind of interest contributes
//! to exactly one part of the inventory:
//!
//! | node                               | contributes to                         |
//! |------------------------------------|----------------------------------------|
//! | `function_definition` (incl. async)| `function_names`, `arg_variables`      |
//! | `assignment` (first target only)   | `variables`                            |
//! | name-reference `identifier`        | `terminals`                            |
//! | `string`, numbers, `True`, ...     | `hardcoded_values`                     |
//!
//! Identifiers that only *declare* or *label* something (function and class
//! names, parameters, attribute names after `.`, keyword argument names,
//! import contents, `global`/`nonlocal` lists, exception aliases, match-case
//! captures) are not name references and are skipped.

use common::{Inventory, Literal, LiteralValue, StringTag};
use tree_sitter::{Node, Tree};

/// Strategy that turns a parsed tree into an inventory.
///
/// The pipeline holds one as `Box<dyn TreeVisitor>`, so alternative
/// classification rules can be swapped in without touching the rewriting
/// side.
///
/// # Example
/// ```
/// use anatomist::{parse, TreeVisitor};
/// use common::Inventory;
///
/// struct FunctionsOnly;
///
/// impl TreeVisitor for FunctionsOnly {
///     fn visit(&self, tree: &tree_sitter::Tree, source: &[u8]) -> Inventory {
///         let mut inventory = Inventory::default();
///         let root = tree.root_node();
///         let mut cursor = root.walk();
///         for child in root.named_children(&mut cursor) {
///             if let Some(name) = child.child_by_field_name("name") {
///                 if child.kind() == "function_definition" {
///                     let text = name.utf8_text(source).unwrap_or_default();
///                     inventory.function_names.push(text.to_string());
///                 }
///             }
///         }
///         inventory
///     }
/// }
///
/// let src = "def a(): pass\ndef b(): pass\n";
/// let tree = parse(src).unwrap();
/// assert_eq!(FunctionsOnly.visit(&tree, src.as_bytes()).function_names, ["a", "b"]);
/// ```
pub trait TreeVisitor: Send + Sync {
    /// Walks `tree` (parsed from `source`) and returns the collected inventory.
    fn visit(&self, tree: &Tree, source: &[u8]) -> Inventory;
}

/// Default visitor: full pre-order traversal with Python name-role rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierVisitor;

impl TreeVisitor for IdentifierVisitor {
    fn visit(&self, tree: &Tree, source: &[u8]) -> Inventory {
        let mut walk = Walk {
            source,
            inventory: Inventory::default(),
            pattern_depth: 0,
        };
        walk.run(tree.root_node());

        let inventory = walk.inventory;
        tracing::debug!(
            functions = inventory.function_names.len(),
            terminals = inventory.terminals.len(),
            args = inventory.arg_variables.len(),
            variables = inventory.variables.len(),
            literals = inventory.hardcoded_values.len(),
            "inventory collected"
        );
        inventory
    }
}

/// Subtrees whose identifiers never count as name references.
const OPAQUE_STATEMENTS: &[&str] = &[
    "import_statement",
    "import_from_statement",
    "future_import_statement",
    "global_statement",
    "nonlocal_statement",
    "comment",
];

/// One unit of pending work on the traversal stack.
enum Step<'t> {
    /// Pre-order visit of `node`; `parent` is carried so no upward lookups
    /// are needed on deep trees.
    Enter { node: Node<'t>, parent: Option<Node<'t>> },
    /// A named child of an f-string: literal segment or interpolation.
    Segment(Node<'t>),
    /// All children of a `case` pattern have been visited.
    LeavePattern,
}

/// Accumulator owned by a single traversal.
struct Walk<'s> {
    source: &'s [u8],
    inventory: Inventory,
    /// > 0 while inside a `case` pattern, where bare names are captures.
    pattern_depth: usize,
}

impl<'s> Walk<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    /// Pre-order traversal driven by an explicit stack. Children are pushed
    /// in reverse so they pop in document order.
    fn run<'t>(&mut self, root: Node<'t>) {
        let mut stack = vec![Step::Enter {
            node: root,
            parent: None,
        }];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter { node, parent } => self.enter(node, parent, &mut stack),
                Step::Segment(part) => self.segment(part, &mut stack),
                Step::LeavePattern => self.pattern_depth -= 1,
            }
        }
    }

    fn enter<'t>(&mut self, node: Node<'t>, parent: Option<Node<'t>>, stack: &mut Vec<Step<'t>>) {
        match node.kind() {
            kind if OPAQUE_STATEMENTS.contains(&kind) => return,
            "identifier" => {
                if self.pattern_depth == 0 && is_name_reference(node, parent) {
                    let name = self.text(node).to_string();
                    self.inventory.terminals.push(name);
                }
                return;
            }
            // An aliased bare name in `with ... as name` / `except ... as name`.
            "as_pattern_target" if node.named_child_count() == 0 => {
                if self.pattern_depth == 0 && !is_exception_alias(parent) {
                    let name = self.text(node).to_string();
                    self.inventory.terminals.push(name);
                }
                return;
            }
            "string" => return self.string(node, stack),
            "concatenated_string" => return self.concatenated_string(node, stack),
            "integer" | "float" => return self.number(node),
            "true" => return self.literal(Literal::untagged(LiteralValue::Bool(true))),
            "false" => return self.literal(Literal::untagged(LiteralValue::Bool(false))),
            "none" => return self.literal(Literal::untagged(LiteralValue::None)),
            "ellipsis" => return self.literal(Literal::untagged(LiteralValue::Ellipsis)),
            "function_definition" => self.function_definition(node),
            "assignment" => self.assignment(node, parent),
            "case_pattern" => {
                self.pattern_depth += 1;
                stack.push(Step::LeavePattern);
            }
            _ => {}
        }
        push_children(node, stack);
    }

    fn segment<'t>(&mut self, part: Node<'t>, stack: &mut Vec<Step<'t>>) {
        match part.kind() {
            "string_content" => {
                let segment = self.text(part).to_string();
                self.literal(Literal::new(LiteralValue::Str(segment), Some(StringTag::Text)));
            }
            "interpolation" => push_children(part, stack),
            _ => {}
        }
    }

    fn literal(&mut self, literal: Literal) {
        self.inventory.hardcoded_values.push(literal);
    }

    // ── definitions and targets ──────────────────────────────────────────────

    fn function_definition(&mut self, node: Node<'_>) {
        if let Some(name) = node.child_by_field_name("name") {
            let name = self.text(name).to_string();
            self.inventory.function_names.push(name);
        }
        let Some(parameters) = node.child_by_field_name("parameters") else {
            return;
        };

        let mut cursor = parameters.walk();
        for param in parameters.named_children(&mut cursor) {
            let name = match param.kind() {
                "identifier" => Some(param),
                "default_parameter" | "typed_default_parameter" => param
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier"),
                "typed_parameter" => match param.named_child(0) {
                    Some(inner) if inner.kind() == "identifier" => Some(inner),
                    // `*args: T` / `**kw: T`
                    _ => break,
                },
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
                _ => None,
            };
            if let Some(name) = name {
                let name = self.text(name).to_string();
                self.inventory.arg_variables.push(name);
            }
        }
    }

    fn assignment(&mut self, node: Node<'_>, parent: Option<Node<'_>>) {
        // `a = b = 1` nests `b = 1` as the right side; only `a` is the first target.
        if parent.is_some_and(|p| p.kind() == "assignment") {
            return;
        }
        if node.child_by_field_name("type").is_some() {
            return;
        }
        let Some(target) = node.child_by_field_name("left") else {
            return;
        };

        match target.kind() {
            "identifier" => {
                let name = self.text(target).to_string();
                self.inventory.variables.push(name);
            }
            "pattern_list" | "tuple_pattern" => {
                let mut cursor = target.walk();
                let names: Vec<&'s str> = target
                    .named_children(&mut cursor)
                    .filter(|e| e.kind() == "identifier")
                    .map(|e| self.text(e))
                    .collect();
                self.inventory
                    .variables
                    .extend(names.into_iter().map(str::to_string));
            }
            _ => {}
        }
    }

    // ── literals ─────────────────────────────────────────────────────────────

    fn number(&mut self, node: Node<'_>) {
        let text = self.text(node).to_string();
        let value = if text.ends_with(['j', 'J']) {
            LiteralValue::Complex(text)
        } else if node.kind() == "integer" {
            LiteralValue::Int(text)
        } else {
            LiteralValue::Float(text)
        };
        self.literal(Literal::untagged(value));
    }

    fn string<'t>(&mut self, node: Node<'t>, stack: &mut Vec<Step<'t>>) {
        let (prefix, body) = split_string(self.text(node));
        if !is_format_prefix(prefix) {
            return self.literal(string_literal(prefix, body.to_string()));
        }

        // f-string: literal segments are constants, interpolations are code.
        let mut cursor = node.walk();
        let parts: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
        stack.extend(parts.into_iter().rev().map(Step::Segment));
    }

    /// Adjacent literals form one constant unless an f-string is involved.
    fn concatenated_string<'t>(&mut self, node: Node<'t>, stack: &mut Vec<Step<'t>>) {
        let mut cursor = node.walk();
        let parts: Vec<Node<'t>> = node
            .named_children(&mut cursor)
            .filter(|p| p.kind() == "string")
            .collect();

        let pieces: Vec<(&'s str, &'s str)> =
            parts.iter().map(|p| split_string(self.text(*p))).collect();
        if pieces.iter().any(|(prefix, _)| is_format_prefix(prefix)) {
            stack.extend(parts.into_iter().rev().map(|part| Step::Enter {
                node: part,
                parent: Some(node),
            }));
            return;
        }

        let prefix = pieces.first().map(|(prefix, _)| *prefix).unwrap_or("");
        let body: String = pieces.iter().map(|(_, body)| *body).collect();
        self.literal(string_literal(prefix, body));
    }
}

fn push_children<'t>(node: Node<'t>, stack: &mut Vec<Step<'t>>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    stack.extend(children.into_iter().rev().map(|child| Step::Enter {
        node: child,
        parent: Some(node),
    }));
}

/// Decides whether a bare `identifier` is a name reference, from its parent.
fn is_name_reference(node: Node<'_>, parent: Option<Node<'_>>) -> bool {
    let Some(parent) = parent else {
        return true;
    };
    match parent.kind() {
        "function_definition" | "class_definition" | "keyword_argument" => {
            !is_field(parent, "name", node)
        }
        "default_parameter" | "typed_default_parameter" => !is_field(parent, "name", node),
        "parameters" | "lambda_parameters" | "typed_parameter" => false,
        "list_splat_pattern" | "dictionary_splat_pattern" => !parent
            .parent()
            .is_some_and(|g| matches!(g.kind(), "parameters" | "lambda_parameters" | "typed_parameter")),
        "attribute" => !is_field(parent, "attribute", node),
        "except_clause" | "except_group_clause" => {
            let after_as = node.prev_sibling().is_some_and(|s| s.kind() == "as");
            !(after_as || is_field(parent, "alias", node))
        }
        "as_pattern_target" => !is_exception_alias(parent.parent()),
        "dotted_name" | "aliased_import" => false,
        _ => true,
    }
}

fn is_field(parent: Node<'_>, field: &str, node: Node<'_>) -> bool {
    parent.child_by_field_name(field) == Some(node)
}

/// Whether the `as_pattern` holding a target sits in `except X as name`.
fn is_exception_alias(as_pattern: Option<Node<'_>>) -> bool {
    as_pattern
        .and_then(|p| p.parent())
        .is_some_and(|p| matches!(p.kind(), "except_clause" | "except_group_clause"))
}

/// Splits a string literal's source text into its prefix letters and the
/// verbatim body between the quotes.
fn split_string(text: &str) -> (&str, &str) {
    let prefix_len = text.find(['"', '\'']).unwrap_or(0);
    let (prefix, quoted) = text.split_at(prefix_len);
    let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    let body = quoted
        .get(quote_len..quoted.len().saturating_sub(quote_len))
        .unwrap_or("");
    (prefix, body)
}

fn is_format_prefix(prefix: &str) -> bool {
    prefix.contains(['f', 'F'])
}

fn string_literal(prefix: &str, body: String) -> Literal {
    if prefix.contains(['b', 'B']) {
        Literal::new(LiteralValue::Bytes(body), Some(StringTag::Bytes))
    } else {
        Literal::new(LiteralValue::Str(body), Some(StringTag::Text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn inventory(src: &str) -> Inventory {
        let tree = parse(src).unwrap();
        IdentifierVisitor.visit(&tree, src.as_bytes())
    }

    fn text(s: &str) -> Literal {
        Literal::new(LiteralValue::Str(s.to_string()), Some(StringTag::Text))
    }

    fn int(s: &str) -> Literal {
        Literal::untagged(LiteralValue::Int(s.to_string()))
    }

    #[test]
    fn test_tuple_assignment() {
        let inv = inventory("x, y = 1, 2\n");
        assert_eq!(inv.variables, ["x", "y"]);
        assert_eq!(inv.terminals, ["x", "y"]);
        assert_eq!(inv.hardcoded_values, [int("1"), int("2")]);
    }

    #[test]
    fn test_parenthesized_tuple_target() {
        let inv = inventory("(a, b) = c\n");
        assert_eq!(inv.variables, ["a", "b"]);
        assert_eq!(inv.terminals, ["a", "b", "c"]);
    }

    #[test]
    fn test_chained_assignment_records_first_target() {
        let inv = inventory("a = b = 1\n");
        assert_eq!(inv.variables, ["a"]);
        assert_eq!(inv.terminals, ["a", "b"]);
    }

    #[test]
    fn test_star_target_skipped_in_variables() {
        let inv = inventory("first, *rest = items\n");
        assert_eq!(inv.variables, ["first"]);
        assert_eq!(inv.terminals, ["first", "rest", "items"]);
    }

    #[test]
    fn test_annotated_and_augmented_assignments_are_not_variables() {
        let inv = inventory("n: int = 5\ntotal += 1\n");
        assert!(inv.variables.is_empty(), "got {:?}", inv.variables);
        assert_eq!(inv.terminals, ["n", "int", "total"]);
    }

    #[test]
    fn test_attribute_and_subscript_targets() {
        let inv = inventory("self.x = 1\nitems[0] = v\n");
        assert!(inv.variables.is_empty());
        assert_eq!(inv.terminals, ["self", "items", "v"]);
    }

    #[test]
    fn test_duplicates_preserved() {
        let inv = inventory("x = 1\nx = 2\n");
        assert_eq!(inv.variables, ["x", "x"]);
        assert_eq!(inv.terminals, ["x", "x"]);
    }

    #[test]
    fn test_positional_parameters_only() {
        let src = "def f(a, b=2, /, c: int = 3, *args, d, **kw):\n    return a\n";
        let inv = inventory(src);
        assert_eq!(inv.function_names, ["f"]);
        assert_eq!(inv.arg_variables, ["a", "b", "c"]);
        assert_eq!(inv.terminals, ["int", "a"]);
        assert_eq!(inv.hardcoded_values, [int("2"), int("3")]);
    }

    #[test]
    fn test_bare_star_ends_positional_parameters() {
        let inv = inventory("def g(x, *, y):\n    pass\n");
        assert_eq!(inv.arg_variables, ["x"]);
    }

    #[test]
    fn test_async_function() {
        let inv = inventory("async def fetch(url):\n    return url\n");
        assert_eq!(inv.function_names, ["fetch"]);
        assert_eq!(inv.arg_variables, ["url"]);
        assert_eq!(inv.terminals, ["url"]);
    }

    #[test]
    fn test_nested_functions_in_document_order() {
        let src = "def outer(a):\n    def inner(b):\n        c = a + b\n        return c\n    return inner\n";
        let inv = inventory(src);
        assert_eq!(inv.function_names, ["outer", "inner"]);
        assert_eq!(inv.arg_variables, ["a", "b"]);
        assert_eq!(inv.variables, ["c"]);
        assert_eq!(inv.terminals, ["c", "a", "b", "c", "inner"]);
    }

    #[test]
    fn test_lambda_is_not_a_function_definition() {
        let inv = inventory("square = lambda v: v * v\n");
        assert!(inv.function_names.is_empty());
        assert!(inv.arg_variables.is_empty());
        assert_eq!(inv.variables, ["square"]);
        assert_eq!(inv.terminals, ["square", "v", "v"]);
    }

    #[test]
    fn test_keyword_argument_names_skipped() {
        let inv = inventory("print(x, sep=',')\n");
        assert_eq!(inv.terminals, ["print", "x"]);
        assert_eq!(inv.hardcoded_values, [text(",")]);
    }

    #[test]
    fn test_imports_skipped() {
        let inv = inventory("import os\nfrom a.b import c as d\nos.path\n");
        assert_eq!(inv.terminals, ["os"]);
    }

    #[test]
    fn test_global_statement_skipped() {
        let inv = inventory("def f():\n    global counter\n    counter = 1\n");
        assert_eq!(inv.variables, ["counter"]);
        assert_eq!(inv.terminals, ["counter"]);
    }

    #[test]
    fn test_class_and_method() {
        let src = "class Point(Base):\n    def __init__(self, x):\n        self.x = x\n";
        let inv = inventory(src);
        assert_eq!(inv.function_names, ["__init__"]);
        assert_eq!(inv.arg_variables, ["self", "x"]);
        assert_eq!(inv.terminals, ["Base", "self", "x"]);
    }

    #[test]
    fn test_decorator_is_a_reference() {
        let inv = inventory("@cache\ndef f():\n    pass\n");
        assert_eq!(inv.terminals, ["cache"]);
    }

    #[test]
    fn test_for_and_walrus_targets_are_terminals_only() {
        let inv = inventory("for i in range(3):\n    print(i)\nif (m := 10) > 5:\n    pass\n");
        assert!(inv.variables.is_empty());
        assert_eq!(inv.terminals, ["i", "range", "print", "i", "m"]);
    }

    #[test]
    fn test_exception_alias_skipped_with_target_kept() {
        let src = "try:\n    pass\nexcept ValueError as err:\n    raise\nwith open(p) as fh:\n    pass\n";
        let inv = inventory(src);
        assert_eq!(inv.terminals, ["ValueError", "open", "p", "fh"]);
    }

    #[test]
    fn test_match_captures_skipped() {
        let inv = inventory("match cmd:\n    case [x, 1]:\n        pass\n");
        assert_eq!(inv.terminals, ["cmd"]);
        assert_eq!(inv.hardcoded_values, [int("1")]);
    }

    #[test]
    fn test_literal_kinds() {
        let src = "a = (1, 2.5, 3j, 0x1F, True, False, None, ..., b'raw', 'txt')\n";
        let inv = inventory(src);
        assert_eq!(
            inv.hardcoded_values,
            [
                int("1"),
                Literal::untagged(LiteralValue::Float("2.5".into())),
                Literal::untagged(LiteralValue::Complex("3j".into())),
                int("0x1F"),
                Literal::untagged(LiteralValue::Bool(true)),
                Literal::untagged(LiteralValue::Bool(false)),
                Literal::untagged(LiteralValue::None),
                Literal::untagged(LiteralValue::Ellipsis),
                Literal::new(LiteralValue::Bytes("raw".into()), Some(StringTag::Bytes)),
                text("txt"),
            ]
        );
    }

    #[test]
    fn test_string_body_is_verbatim() {
        let inv = inventory("s = 'a\\tb'\nd = \"\"\"doc\"\"\"\n");
        assert_eq!(inv.hardcoded_values, [text("a\\tb"), text("doc")]);
    }

    #[test]
    fn test_negative_number_records_magnitude() {
        let inv = inventory("n = -1\n");
        assert_eq!(inv.hardcoded_values, [int("1")]);
    }

    #[test]
    fn test_concatenated_string_is_one_literal() {
        let inv = inventory("s = 'ab' \"cd\"\n");
        assert_eq!(inv.hardcoded_values, [text("abcd")]);
    }

    #[test]
    fn test_fstring_segments_and_interpolations() {
        let inv = inventory("msg = f'hi {name}!'\n");
        assert_eq!(inv.hardcoded_values, [text("hi "), text("!")]);
        assert_eq!(inv.terminals, ["msg", "name"]);
    }

    #[test]
    fn test_docstring_recorded() {
        let inv = inventory("def f():\n    \"\"\"Doc.\"\"\"\n");
        assert_eq!(inv.hardcoded_values, [text("Doc.")]);
    }

    #[test]
    fn test_long_binary_chain_walks_iteratively() {
        let src = format!("s = {}\n", vec!["a"; 20_000].join(" + "));
        let inv = inventory(&src);
        assert_eq!(inv.variables, ["s"]);
        assert_eq!(inv.terminals.len(), 20_001);
        assert!(inv.terminals[1..].iter().all(|t| t == "a"));
    }

    #[test]
    fn test_case_pattern_depth_restored_after_match() {
        let inv = inventory("match p:\n    case [x, y]:\n        pass\nz = q\n");
        assert_eq!(inv.terminals, ["p", "z", "q"]);
    }

    #[test]
    fn test_empty_module() {
        assert_eq!(inventory(""), Inventory::default());
    }

    #[test]
    fn test_split_string() {
        assert_eq!(split_string("rb'x'"), ("rb", "x"));
        assert_eq!(split_string("''"), ("", ""));
        assert_eq!(split_string("'''a'b'''"), ("", "a'b"));
        assert_eq!(split_string("F\"{x}\""), ("F", "{x}"));
    }
}

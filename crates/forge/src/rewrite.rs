//! Mode-level rewrites built from an inventory and the original text.

use std::sync::OnceLock;

use common::{CommentCorpus, Inventory};
use regex::Regex;

use crate::comments::strip_comments;
use crate::literals::strip_literals;
use crate::rename::{RenameMap, STANDARDIZE_PREFIX, SYNTMINE_PREFIX};

static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

fn whitespace_run() -> &'static Regex {
    WHITESPACE_RUN.get_or_init(|| {
        Regex::new(r"\s+").expect("whitespace regex is a hardcoded literal and must compile")
    })
}

/// Renames every variable and parameter to `variable_<i>` across the whole
/// original text. Comments, literals and layout are left as they are.
///
/// With no candidates the text comes back unchanged.
pub fn standardize(inventory: &Inventory, source: &str) -> String {
    if inventory.has_no_candidates() {
        return source.to_string();
    }
    let map = RenameMap::from_inventory(inventory, STANDARDIZE_PREFIX);
    tracing::debug!(names = map.len(), "standardize rename map built");
    map.apply(source)
}

/// Produces the dense syntax-mining form.
///
/// Pass order is fixed: comments, literals, identifiers, whitespace. With
/// `mask_identifiers` each candidate becomes `v_<i>`; without it every
/// occurrence is deleted and its neighbours run together.
pub fn syntmine(
    inventory: &Inventory,
    corpus: &CommentCorpus,
    source: &str,
    mask_identifiers: bool,
) -> String {
    let stripped = strip_literals(&strip_comments(source, corpus));
    let map = RenameMap::from_inventory(inventory, SYNTMINE_PREFIX);
    tracing::debug!(
        names = map.len(),
        mask_identifiers,
        "syntmine rename map built"
    );

    let rewritten = if mask_identifiers {
        map.apply(&stripped)
    } else {
        map.erase(&stripped)
    };
    compact_whitespace(&rewritten)
}

/// Collapses whitespace runs to one space, then drops every space.
pub fn compact_whitespace(text: &str) -> String {
    whitespace_run().replace_all(text, " ").replace(' ', "")
}

//! Rename map construction and ordered substring replacement.
//!
//! ## Ordering Rule
//! Candidates are stable-sorted by **descending length** (in characters)
//! before placeholder indices are assigned and before any replacement runs.
//! A name that is a substring of a longer candidate (`text` inside `text_t`)
//! is therefore only replaced after the longer one has been rewritten, so no
//! `variable_1_t` residue can appear.
//!
//! Replacement is plain substring replacement over the whole text with no
//! identifier-boundary check. The ordering only protects candidates from each
//! other; a candidate that occurs inside an unrelated word, string or comment
//! is rewritten there too, and so is a placeholder already emitted for a
//! longer name (`v` rewrites the `v` of `v_0`).

use std::cmp::Reverse;
use std::collections::HashMap;

use common::Inventory;

/// Placeholder prefix used by standardize mode (`variable_0`, `variable_1`, ...).
pub const STANDARDIZE_PREFIX: &str = "variable_";
/// Placeholder prefix used by syntax-mining mode (`v_0`, `v_1`, ...).
pub const SYNTMINE_PREFIX: &str = "v_";

/// Ephemeral `name -> placeholder` mapping for one rewrite call.
///
/// Entries are held in replacement order: the position at which each name
/// first appears in the length-sorted candidate list. When a name occurs more
/// than once among the candidates, every occurrence gets its own index and
/// the last one written wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
    entries: Vec<(String, String)>,
}

impl RenameMap {
    /// Builds the map from candidates in inventory order.
    ///
    /// ```
    /// use forge::RenameMap;
    /// let map = RenameMap::build(["text", "text_t"], "variable_");
    /// assert_eq!(map.get("text_t"), Some("variable_0"));
    /// assert_eq!(map.get("text"), Some("variable_1"));
    /// ```
    pub fn build<'a, I>(candidates: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut sorted: Vec<&str> = candidates
            .into_iter()
            .filter(|name| !name.is_empty())
            .collect();
        sorted.sort_by_key(|name| Reverse(name.chars().count()));

        let mut entries: Vec<(String, String)> = Vec::new();
        let mut slot_of: HashMap<&str, usize> = HashMap::new();
        for (index, name) in sorted.into_iter().enumerate() {
            let placeholder = format!("{prefix}{index}");
            match slot_of.get(name) {
                Some(&slot) => entries[slot].1 = placeholder,
                None => {
                    slot_of.insert(name, entries.len());
                    entries.push((name.to_string(), placeholder));
                }
            }
        }

        Self { entries }
    }

    /// Map over `variables ++ arg_variables` of an inventory.
    pub fn from_inventory(inventory: &Inventory, prefix: &str) -> Self {
        Self::build(inventory.rename_candidates(), prefix)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Placeholder assigned to `name`, if it is a candidate.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_str())
    }

    /// `(name, placeholder)` pairs in replacement order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p.as_str()))
    }

    /// Replaces every occurrence of each name with its placeholder, one name at
    /// a time, in replacement order.
    pub fn apply(&self, text: &str) -> String {
        self.entries
            .iter()
            .fold(text.to_string(), |acc, (name, placeholder)| {
                acc.replace(name.as_str(), placeholder)
            })
    }

    /// Deletes every occurrence of each name, in replacement order.
    pub fn erase(&self, text: &str) -> String {
        self.entries
            .iter()
            .fold(text.to_string(), |acc, (name, _)| acc.replace(name.as_str(), ""))
    }
}

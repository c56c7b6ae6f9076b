//! Comment removal for the syntax-mining form.

use std::sync::OnceLock;

use common::CommentCorpus;
use regex::Regex;

static COMMENT_LINE: OnceLock<Regex> = OnceLock::new();

fn comment_line() -> &'static Regex {
    COMMENT_LINE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*#.*$")
            .expect("comment-line regex is a hardcoded literal and must compile")
    })
}

/// Deletes comments from `text`.
///
/// Lines whose first non-blank character is `#` are emptied first (the line
/// break stays). Trailing comments are then removed by bulk substring
/// deletion of every corpus comment, longest first. The deletion is textual:
/// an identical `# ...` sequence inside a string literal goes too.
pub fn strip_comments(text: &str, corpus: &CommentCorpus) -> String {
    let mut out = comment_line().replace_all(text, "").into_owned();

    let mut trailing: Vec<&str> = corpus.iter().map(|c| c.text.as_str()).collect();
    trailing.sort_by_key(|c| std::cmp::Reverse(c.chars().count()));
    for comment in trailing {
        if !comment.is_empty() && out.contains(comment) {
            out = out.replace(comment, "");
        }
    }
    out
}

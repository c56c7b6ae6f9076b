//! Comment corpus extraction from the token stream.

use common::{Comment, CommentCorpus};

use crate::tokenize::{tokenize, TokenKind, TokenizeError};

/// Collects every comment token of `source`, in stream order.
///
/// Works from the lexer, not the syntax tree, so source that tokenizes but
/// does not parse still yields its comments.
///
/// # Errors
/// Any lexical error aborts the whole extraction; no partial corpus is returned.
pub fn extract_comments(source: &str) -> Result<CommentCorpus, TokenizeError> {
    let comments: Vec<Comment> = tokenize(source)?
        .into_iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .map(|t| Comment::new(t.text, t.start))
        .collect();
    tracing::debug!(comments = comments.len(), "comment corpus extracted");
    Ok(CommentCorpus::new(comments))
}

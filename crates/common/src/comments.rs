//! Comment corpus: the ordered comment tokens of one source unit.

use serde::{Deserialize, Serialize};

use crate::Position;

/// A single `#` comment token, marker included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub start: Position,
}

impl Comment {
    pub fn new(text: impl Into<String>, start: Position) -> Self {
        Self {
            text: text.into(),
            start,
        }
    }

    /// Comment content with the `#` marker and surrounding whitespace removed.
    ///
    /// ```
    /// # use common::{Comment, Position};
    /// let c = Comment::new("#  reverse it ", Position::new(1, 0));
    /// assert_eq!(c.body(), "reverse it");
    /// ```
    pub fn body(&self) -> &str {
        self.text.trim_start_matches('#').trim()
    }
}

/// Comments in token-stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCorpus {
    pub comments: Vec<Comment>,
}

impl CommentCorpus {
    pub fn new(comments: Vec<Comment>) -> Self {
        Self { comments }
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    /// Reassembles the corpus as one blob: comment texts concatenated with no
    /// separator, markers kept.
    ///
    /// ```
    /// # use common::{Comment, CommentCorpus, Position};
    /// let corpus = CommentCorpus::new(vec![
    ///     Comment::new("# one", Position::new(1, 0)),
    ///     Comment::new("# two", Position::new(3, 4)),
    /// ]);
    /// assert_eq!(corpus.text(), "# one# two");
    /// ```
    pub fn text(&self) -> String {
        self.comments.iter().map(|c| c.text.as_str()).collect()
    }

    /// Marker-stripped comment bodies, in order.
    pub fn bodies(&self) -> Vec<&str> {
        self.comments.iter().map(Comment::body).collect()
    }
}

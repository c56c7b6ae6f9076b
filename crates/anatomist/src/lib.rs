//! # The Anatomist: Python Source Dissection
//!
//! **Role**: Turns one unit of Python source into the facts the Forge needs:
//! an identifier [`Inventory`](common::Inventory) from the syntax tree and a
//! [`CommentCorpus`](common::CommentCorpus) from the token stream. The
//! [`Processor`] then dispatches to a Forge rewrite per [`Mode`](common::Mode).
//!
//! **Modules**:
//! - [`parser`]: tree-sitter parse with strict error rejection.
//! - [`walker`]: pre-order tree traversal collecting names and literals.
//! - [`tokenize`]: Python lexer feeding the comment extractor.
//! - [`comments`]: comment corpus extraction.
//! - [`pipeline`]: mode dispatch and the orchestrating [`Processor`].
//!
//! **Design**:
//! - Every entry point works on an in-memory `&str`; no I/O happens here.
//! - Nothing is cached between calls. A `Processor` only holds its visitor
//!   and config, so it can be shared across threads.

pub mod comments;
pub mod parser;
pub mod pipeline;
pub mod tokenize;
pub mod walker;

pub use comments::extract_comments;
pub use parser::parse;
pub use pipeline::{
    anonymize, extract_inventory, fingerprint, process, record, standardize, Artifact, Processor,
    ProcessorConfig, ProgramRecord,
};
pub use tokenize::{tokenize, Token, TokenKind, TokenizeError};
pub use walker::{IdentifierVisitor, TreeVisitor};

use common::{Position, UnsupportedMode};

/// Errors raised while dissecting a source unit.
#[derive(Debug, thiserror::Error)]
pub enum AnatomistError {
    /// The source is not syntactically valid Python.
    #[error("Parse failure at {position}: {reason}")]
    Parse { position: Position, reason: String },

    /// The source is not lexically valid Python (comment extraction only).
    #[error("Tokenize failure: {0}")]
    Tokenize(#[from] TokenizeError),

    /// A mode name outside the supported set.
    #[error(transparent)]
    UnsupportedMode(#[from] UnsupportedMode),

    /// The bundled grammar refused to load into the parser.
    #[error("Grammar load failure: {0}")]
    GrammarLoad(String),
}

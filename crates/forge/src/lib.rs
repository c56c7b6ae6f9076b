//! # The Forge: Text Rewriting Engine
//!
//! Turns an identifier inventory and the original source text into a
//! canonical form. Everything here is a pure `text -> text` transform; the
//! syntax tree never reaches this crate.
//!
//! ## Passes
//! - [`strip_comments`]: line-leading comment lines, then corpus comments.
//! - [`strip_literals`]: quoted spans to `LIT`, digit runs to `NUM`.
//! - [`RenameMap`]: length-descending `name -> placeholder` substitution.
//! - [`compact_whitespace`]: drops all whitespace.
//!
//! ## Modes
//! - [`standardize`]: rename only, layout preserved.
//! - [`syntmine`]: all passes, in the order listed above.
//! - [`fingerprint`]: BLAKE3 over a syntmine output.
//!
//! ## Example
//! ```
//! use common::{CommentCorpus, Inventory};
//!
//! let inventory = Inventory {
//!     arg_variables: vec!["x".into()],
//!     ..Default::default()
//! };
//! let dense = forge::syntmine(&inventory, &CommentCorpus::default(), "def f(x): return x", true);
//! assert_eq!(dense, "deff(v_0):returnv_0");
//! ```

pub mod comments;
pub mod fingerprint;
pub mod literals;
pub mod rename;
pub mod rewrite;

pub use comments::strip_comments;
pub use fingerprint::{fingerprint, group_clones, CloneGroup};
pub use literals::{strip_literals, LITERAL_SENTINEL, NUMBER_SENTINEL};
pub use rename::{RenameMap, STANDARDIZE_PREFIX, SYNTMINE_PREFIX};
pub use rewrite::{compact_whitespace, standardize, syntmine};

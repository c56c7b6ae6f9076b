//! Literal stripping: quoted spans become `LIT`, digit runs become `NUM`.
//!
//! The quoted-span match is deliberately naive. It does not understand
//! escapes, prefixes or triple quotes: a span starts at a quote character and
//! ends at the next identical quote on the same line. `'it\'s'` therefore
//! strips to `LITs'`.

use std::sync::OnceLock;

use regex::Regex;

/// Replacement for every quoted span.
pub const LITERAL_SENTINEL: &str = "LIT";
/// Replacement for every run of decimal digits.
pub const NUMBER_SENTINEL: &str = "NUM";

static QUOTED_SPAN: OnceLock<Regex> = OnceLock::new();
static DIGIT_RUN: OnceLock<Regex> = OnceLock::new();

fn quoted_span() -> &'static Regex {
    QUOTED_SPAN.get_or_init(|| {
        Regex::new(r#""[^"\n]*"|'[^'\n]*'"#)
            .expect("quoted-span regex is a hardcoded literal and must compile")
    })
}

fn digit_run() -> &'static Regex {
    DIGIT_RUN.get_or_init(|| {
        Regex::new(r"[0-9]+").expect("digit-run regex is a hardcoded literal and must compile")
    })
}

/// Replaces quoted spans with [`LITERAL_SENTINEL`], then digit runs with
/// [`NUMBER_SENTINEL`]. Pass order is fixed: digits inside a string are gone
/// before the number pass runs.
///
/// Digit runs are replaced wherever they occur, including inside identifiers
/// (`var1` becomes `varNUM`).
///
/// ```
/// assert_eq!(forge::strip_literals("n = 42"), "n = NUM");
/// assert_eq!(forge::strip_literals("s = \"hi\""), "s = LIT");
/// ```
pub fn strip_literals(text: &str) -> String {
    let without_strings = quoted_span().replace_all(text, LITERAL_SENTINEL);
    digit_run()
        .replace_all(&without_strings, NUMBER_SENTINEL)
        .into_owned()
}

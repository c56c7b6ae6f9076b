//! Python lexical tokenizer.
//!
//! Produces the token stream the comment extractor reads. It is
//! independent of tree-sitter: lexing can succeed on code that does not
//! parse, and fail on code tree-sitter would happily recover from.
//!
//! Handles:
//! - string prefixes (`r`, `b`, `u`, `f` and two-letter combinations)
//! - single- and triple-quoted strings, backslash escapes
//! - implicit continuation inside `()`, `[]`, `{}` and explicit `\` continuation
//! - INDENT / DEDENT via an indentation stack (tab stops at 8)
//! - NEWLINE for logical line ends, NL for blank, comment-only and bracketed line breaks

use common::Position;

/// Token categories, mirroring the Python tokenizer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    Comment,
    Newline,
    Nl,
    Indent,
    Dedent,
    EndMarker,
}

/// One token, borrowing its text from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub start: Position,
}

/// The source is not lexically well-formed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unterminated string literal at {0}")]
    UnterminatedString(Position),
    #[error("unterminated triple-quoted string literal starting at {0}")]
    UnterminatedTripleString(Position),
    #[error("EOF in multi-line statement: `{bracket}` opened at {position} is never closed")]
    UnclosedBracket { bracket: char, position: Position },
    #[error("closing `{found}` at {position} does not match any open bracket")]
    UnmatchedBracket { found: char, position: Position },
    #[error("EOF in multi-line statement: line continuation at {0}")]
    ContinuationAtEof(Position),
    #[error("unexpected character after line continuation at {0}")]
    BadContinuation(Position),
    #[error("unindent does not match any outer indentation level at {0}")]
    InconsistentDedent(Position),
    #[error("unexpected character {ch:?} at {position}")]
    UnexpectedCharacter { ch: char, position: Position },
}

/// Tokenizes a complete source unit.
///
/// The returned stream always ends with any pending DEDENTs and one
/// `EndMarker`.
///
/// ```
/// use anatomist::tokenize::{tokenize, TokenKind};
/// let kinds: Vec<TokenKind> = tokenize("x = 1  # one\n")
///     .unwrap()
///     .into_iter()
///     .map(|t| t.kind)
///     .collect();
/// assert_eq!(
///     kinds,
///     [TokenKind::Name, TokenKind::Op, TokenKind::Number, TokenKind::Comment,
///      TokenKind::Newline, TokenKind::EndMarker]
/// );
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, TokenizeError> {
    Lexer::new(source).run()
}

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: &[&str] = &[
    "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->", ":=", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];
const ONE_CHAR_OPS: &str = "+-*/%@&|^~<>=.,:;";
const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];

struct Lexer<'src> {
    src: &'src str,
    /// Current byte offset.
    pos: usize,
    /// 1-indexed line of `pos`.
    line: u32,
    /// 0-indexed character column of `pos` within its physical line.
    column: u32,
    /// Indentation stack; always starts with [0].
    indents: Vec<usize>,
    /// Open brackets with their positions. Non-empty means newlines are NL.
    brackets: Vec<(char, Position)>,
    at_line_start: bool,
    /// A NAME/NUMBER/STRING/OP has been emitted since the last NEWLINE.
    logical_line_open: bool,
    tokens: Vec<Token<'src>>,
}

impl<'src> Lexer<'src> {
    fn new(src: &'src str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 0,
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
            logical_line_open: false,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token<'src>>, TokenizeError> {
        loop {
            if self.at_line_start && self.brackets.is_empty() {
                self.at_line_start = false;
                if self.indentation()? {
                    continue;
                }
            }

            let Some(c) = self.peek() else { break };
            match c {
                ' ' | '\t' | '\x0c' => {
                    self.bump();
                }
                '\n' | '\r' => self.newline(),
                '#' => self.comment(),
                '\\' => self.continuation()?,
                '(' | '[' | '{' => {
                    let start = self.pos;
                    let position = self.position();
                    self.bump();
                    self.brackets.push((c, position));
                    self.push(TokenKind::Op, start, position);
                }
                ')' | ']' | '}' => self.close_bracket(c)?,
                '0'..='9' => self.number(),
                '.' if self.peek_nth(1).is_some_and(|n| n.is_ascii_digit()) => self.number(),
                _ => {
                    if let Some(prefix_len) = self.string_prefix_len() {
                        self.string(prefix_len)?;
                    } else if c == '_' || c.is_alphabetic() {
                        self.name();
                    } else {
                        self.operator(c)?;
                    }
                }
            }
        }
        self.finish()
    }

    // ── cursor ───────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    /// Advances one character, keeping line bookkeeping in sync. `\r\n`
    /// counts as one line break.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' || (c == '\r' && self.peek() != Some('\n')) {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn push(&mut self, kind: TokenKind, start: usize, position: Position) {
        if matches!(
            kind,
            TokenKind::Name | TokenKind::Number | TokenKind::String | TokenKind::Op
        ) {
            self.logical_line_open = true;
        }
        self.tokens.push(Token {
            kind,
            text: &self.src[start..self.pos],
            start: position,
        });
    }

    // ── line structure ───────────────────────────────────────────────────────

    /// Measures the indentation of a fresh line. Returns `Ok(true)` when the
    /// line was blank or comment-only and has been consumed.
    fn indentation(&mut self) -> Result<bool, TokenizeError> {
        let indent_start = self.pos;
        let mut column = 0usize;
        while let Some(c) = self.peek() {
            match c {
                ' ' => column += 1,
                '\t' => column = (column / 8 + 1) * 8,
                '\x0c' => column = 0,
                _ => break,
            }
            self.bump();
        }

        match self.peek() {
            None => return Ok(false),
            Some('#') => {
                self.comment();
                if matches!(self.peek(), Some('\n' | '\r')) {
                    self.newline();
                }
                return Ok(true);
            }
            Some('\n' | '\r') => {
                self.newline();
                return Ok(true);
            }
            Some(_) => {}
        }

        let position = self.position();
        let top = self.indents.last().copied().unwrap_or(0);
        if column > top {
            self.indents.push(column);
            self.tokens.push(Token {
                kind: TokenKind::Indent,
                text: &self.src[indent_start..self.pos],
                start: Position::new(self.line, 0),
            });
        } else if column < top {
            while self.indents.last().is_some_and(|&level| level > column) {
                self.indents.pop();
                self.tokens.push(Token {
                    kind: TokenKind::Dedent,
                    text: "",
                    start: position,
                });
            }
            if self.indents.last().copied() != Some(column) {
                return Err(TokenizeError::InconsistentDedent(position));
            }
        }
        Ok(false)
    }

    fn newline(&mut self) {
        let start = self.pos;
        let position = self.position();
        if self.bump() == Some('\r') && self.peek() == Some('\n') {
            self.bump();
        }

        let kind = if self.brackets.is_empty() && self.logical_line_open {
            TokenKind::Newline
        } else {
            TokenKind::Nl
        };
        self.tokens.push(Token {
            kind,
            text: &self.src[start..self.pos],
            start: position,
        });
        if kind == TokenKind::Newline {
            self.logical_line_open = false;
        }
        self.at_line_start = self.brackets.is_empty();
    }

    fn continuation(&mut self) -> Result<(), TokenizeError> {
        let position = self.position();
        self.bump();
        match self.peek() {
            None => Err(TokenizeError::ContinuationAtEof(position)),
            Some('\n' | '\r') => {
                if self.bump() == Some('\r') && self.peek() == Some('\n') {
                    self.bump();
                }
                if self.peek().is_none() {
                    return Err(TokenizeError::ContinuationAtEof(position));
                }
                Ok(())
            }
            Some(_) => Err(TokenizeError::BadContinuation(position)),
        }
    }

    fn finish(mut self) -> Result<Vec<Token<'src>>, TokenizeError> {
        if let Some(&(bracket, position)) = self.brackets.last() {
            return Err(TokenizeError::UnclosedBracket { bracket, position });
        }

        let position = self.position();
        if self.logical_line_open {
            self.tokens.push(Token {
                kind: TokenKind::Newline,
                text: "",
                start: position,
            });
        } else if self
            .tokens
            .last()
            .is_some_and(|t| t.kind == TokenKind::Comment)
        {
            self.tokens.push(Token {
                kind: TokenKind::Nl,
                text: "",
                start: position,
            });
        }

        for _ in 1..self.indents.len() {
            self.tokens.push(Token {
                kind: TokenKind::Dedent,
                text: "",
                start: position,
            });
        }
        self.tokens.push(Token {
            kind: TokenKind::EndMarker,
            text: "",
            start: position,
        });
        Ok(self.tokens)
    }

    // ── tokens ───────────────────────────────────────────────────────────────

    fn comment(&mut self) {
        let start = self.pos;
        let position = self.position();
        while self.peek().is_some_and(|c| c != '\n' && c != '\r') {
            self.bump();
        }
        self.push(TokenKind::Comment, start, position);
    }

    fn close_bracket(&mut self, c: char) -> Result<(), TokenizeError> {
        let start = self.pos;
        let position = self.position();
        let expected = match c {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.brackets.pop() {
            Some((open, _)) if open == expected => {}
            _ => {
                return Err(TokenizeError::UnmatchedBracket {
                    found: c,
                    position,
                })
            }
        }
        self.bump();
        self.push(TokenKind::Op, start, position);
        Ok(())
    }

    fn name(&mut self) {
        let start = self.pos;
        let position = self.position();
        while self.peek().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
            self.bump();
        }
        self.push(TokenKind::Name, start, position);
    }

    fn number(&mut self) {
        let start = self.pos;
        let position = self.position();
        let rest = &self.src[start..];
        let hex = rest.starts_with("0x") || rest.starts_with("0X");
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && !hex
                && matches!(self.src[..self.pos].chars().next_back(), Some('e' | 'E'));
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.bump();
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start, position);
    }

    /// Length of a string prefix at the cursor when a quote follows it.
    fn string_prefix_len(&self) -> Option<usize> {
        let rest = &self.src[self.pos..];
        let letters = rest
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .take(3)
            .count();
        (0..=letters.min(2)).find(|&len| {
            let prefix = rest[..len].to_ascii_lowercase();
            let quoted = matches!(rest[len..].chars().next(), Some('"' | '\''));
            quoted && (len == 0 || STRING_PREFIXES.contains(&prefix.as_str()))
        })
    }

    fn string(&mut self, prefix_len: usize) -> Result<(), TokenizeError> {
        let start = self.pos;
        let position = self.position();
        for _ in 0..prefix_len {
            self.bump();
        }
        let quote = self.bump().unwrap_or('"');
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);

        if triple {
            self.bump();
            self.bump();
            loop {
                match self.bump() {
                    None => return Err(TokenizeError::UnterminatedTripleString(position)),
                    Some('\\') => {
                        self.bump();
                    }
                    Some(c)
                        if c == quote
                            && self.peek() == Some(quote)
                            && self.peek_nth(1) == Some(quote) =>
                    {
                        self.bump();
                        self.bump();
                        break;
                    }
                    Some(_) => {}
                }
            }
        } else {
            loop {
                match self.peek() {
                    None | Some('\n' | '\r') => {
                        return Err(TokenizeError::UnterminatedString(position))
                    }
                    Some('\\') => {
                        self.bump();
                        if self.bump() == Some('\r') && self.peek() == Some('\n') {
                            self.bump();
                        }
                    }
                    Some(c) if c == quote => {
                        self.bump();
                        break;
                    }
                    Some(_) => {
                        self.bump();
                    }
                }
            }
        }

        self.push(TokenKind::String, start, position);
        Ok(())
    }

    fn operator(&mut self, c: char) -> Result<(), TokenizeError> {
        let start = self.pos;
        let position = self.position();
        let rest = &self.src[self.pos..];
        let len = THREE_CHAR_OPS
            .iter()
            .chain(TWO_CHAR_OPS)
            .find(|op| rest.starts_with(**op))
            .map(|op| op.len())
            .or_else(|| ONE_CHAR_OPS.contains(c).then_some(1));

        let Some(len) = len else {
            return Err(TokenizeError::UnexpectedCharacter { ch: c, position });
        };
        for _ in 0..len {
            self.bump();
        }
        self.push(TokenKind::Op, start, position);
        Ok(())
    }
}

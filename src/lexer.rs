use std::fmt;
use std::io::Read;
use std::iter::FusedIterator;

use crate::cursor::Cursor;
use crate::source::{CharSource, Encoding, SequenceSource, StreamSource};
use crate::token::{Position, Token, TokenKind};

/// What the lexer expects next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexMode {
    /// Left of `=`: keys, whitespace, comments.
    #[default]
    Key,
    /// Right of `=`: a quoted or raw value, possibly preceded by whitespace.
    Value,
}

/// Which tokens the lexer drops before handing them out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexOptions {
    pub skip_comments: bool,
    pub skip_whitespace: bool,
}

impl LexOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            skip_comments: false,
            skip_whitespace: false,
        }
    }

    /// Only keys and values: what the parser consumes.
    #[must_use]
    pub const fn significant() -> Self {
        Self {
            skip_comments: true,
            skip_whitespace: true,
        }
    }

    #[must_use]
    pub const fn skip_comments(mut self, skip: bool) -> Self {
        self.skip_comments = skip;
        self
    }

    #[must_use]
    pub const fn skip_whitespace(mut self, skip: bool) -> Self {
        self.skip_whitespace = skip;
        self
    }
}

/// Classifies a lexer error.
///
/// These point at a lexer bug or at input no grammar rule covers, such as
/// a quote that never closes. A NUL character is not an error: it ends the
/// input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Character that cannot start any token in the current mode.
    UnsupportedCharacter(char),
    /// A delimiter was required but something else (or nothing) was found.
    ExpectedToConsume { expected: char, found: Option<char> },
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCharacter(ch) => {
                write!(f, "character '{}' is not supported", escape(*ch))
            }
            Self::ExpectedToConsume {
                expected,
                found: Some(found),
            } => write!(
                f,
                "expected to consume '{}' but found '{}'",
                escape(*expected),
                escape(*found)
            ),
            Self::ExpectedToConsume {
                expected,
                found: None,
            } => write!(
                f,
                "expected to consume '{}' but found end of input",
                escape(*expected)
            ),
        }
    }
}

fn escape(ch: char) -> String {
    format!("\\u{:04X}", u32::from(ch))
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {position} (offset: {})", position.offset)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

/// Tokenize dotenv text into a sequence of tokens.
///
/// # Errors
///
/// Returns `LexError` on unterminated quoted values or characters no rule
/// accepts.
pub fn tokenize(input: &str, options: LexOptions) -> Result<Vec<Token>, LexError> {
    Lexer::from_text(input, options).collect()
}

/// Dotenv lexer over any [`CharSource`].
///
/// Produces tokens lazily through [`Lexer::next_token`] or the `Iterator`
/// impl, which is fused: it keeps returning `None` after end of input or
/// the first error.
#[derive(Debug)]
pub struct Lexer<S> {
    cursor: Cursor<S>,
    mode: LexMode,
    options: LexOptions,
    text: String,
    start: Position,
    finished: bool,
}

impl Lexer<SequenceSource> {
    #[must_use]
    pub fn from_text(input: &str, options: LexOptions) -> Self {
        Self::new(SequenceSource::new(input), options)
    }
}

impl<R: Read> Lexer<StreamSource<R>> {
    pub fn from_reader(reader: R, encoding: Encoding, options: LexOptions) -> Self {
        Self::new(StreamSource::new(reader, encoding), options)
    }
}

impl<S: CharSource> Lexer<S> {
    pub const fn new(source: S, options: LexOptions) -> Self {
        Self {
            cursor: Cursor::new(source),
            mode: LexMode::Key,
            options,
            text: String::new(),
            start: Position {
                offset: 0,
                line: 0,
                column: 0,
            },
            finished: false,
        }
    }

    pub const fn mode(&self) -> LexMode {
        self.mode
    }

    pub const fn position(&self) -> Position {
        self.cursor.position()
    }

    pub fn is_done(&mut self) -> bool {
        self.cursor.is_done()
    }

    pub fn into_source(self) -> S {
        self.cursor.into_source()
    }

    /// Next token that survives the skip options, `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns `LexError` when the input cannot be tokenized.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        while let Some(token) = self.next_raw_token()? {
            if self.options.skip_comments && token.kind.is_comment() {
                continue;
            }
            if self.options.skip_whitespace && token.kind.is_whitespace() {
                continue;
            }
            return Ok(Some(token));
        }
        Ok(None)
    }

    fn next_raw_token(&mut self) -> Result<Option<Token>, LexError> {
        self.reset_start();
        // a pending value still has to come out as an empty one
        if self.mode == LexMode::Key && self.cursor.is_done() {
            return Ok(None);
        }
        self.cursor.check_step();

        let token = match self.cursor.peek() {
            Some('#') => self.lex_comment(),
            _ if self.mode == LexMode::Value => self.lex_value()?,
            Some(ch) if is_key_char(ch) => self.lex_key(),
            Some(ch) if ch.is_whitespace() => self.lex_whitespace(),
            Some('=') => self.lex_equals(),
            None => return Ok(None),
            Some(ch) => return Err(self.error(LexErrorKind::UnsupportedCharacter(ch))),
        };

        Ok(Some(token))
    }

    fn lex_equals(&mut self) -> Token {
        self.bump();
        self.mode = LexMode::Value;
        self.emit(TokenKind::Equals)
    }

    fn lex_value(&mut self) -> Result<Token, LexError> {
        let token = match self.cursor.peek() {
            Some('\'') => self.lex_quoted_value(TokenKind::SingleQuoteValue, '\'')?,
            Some('"') => self.lex_quoted_value(TokenKind::DoubleQuoteValue, '"')?,
            Some('`') => self.lex_quoted_value(TokenKind::BacktickValue, '`')?,
            _ => self.lex_raw_value(),
        };

        if token.kind != TokenKind::Whitespace {
            self.mode = LexMode::Key;
        }

        Ok(token)
    }

    fn lex_quoted_value(&mut self, kind: TokenKind, quote: char) -> Result<Token, LexError> {
        self.eat(quote)?;
        self.reset_start();

        self.accept_run(|ch| ch != quote);

        // delimiters stay out of the token text
        let token = self.emit(kind);
        self.eat(quote)?;

        Ok(token)
    }

    /// Unquoted value running to the end of the line or a `#`.
    ///
    /// Leading whitespace comes out first as its own token. Trailing
    /// whitespace is left unconsumed, so it follows the value as a separate
    /// whitespace token.
    fn lex_raw_value(&mut self) -> Token {
        let mut len = 0;
        while let Some(ch) = self.cursor.peek_nth(len) {
            if is_eol(ch) || ch == '#' {
                break;
            }
            if len == 0 && ch.is_whitespace() {
                return self.lex_whitespace();
            }
            len += 1;
        }

        if len > 0 {
            let keep = self
                .cursor
                .last_index_of(len, |ch| !ch.is_whitespace())
                .map_or(0, |last| last + 1);
            for _ in 0..keep {
                self.bump();
            }
        }

        self.emit(TokenKind::Value)
    }

    fn lex_key(&mut self) -> Token {
        self.accept_run(is_key_char);
        self.emit(TokenKind::Key)
    }

    fn lex_comment(&mut self) -> Token {
        self.accept_run(|ch| !is_eol(ch));
        self.emit(TokenKind::Comment)
    }

    fn lex_whitespace(&mut self) -> Token {
        self.accept_run(char::is_whitespace);
        self.emit(TokenKind::Whitespace)
    }

    fn eat(&mut self, expected: char) -> Result<(), LexError> {
        if !self.cursor.is_at(expected) {
            let found = self.cursor.peek();
            return Err(self.error(LexErrorKind::ExpectedToConsume { expected, found }));
        }
        self.bump();
        Ok(())
    }

    fn accept_run(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.cursor.peek() {
            if !pred(ch) {
                break;
            }
            self.bump();
        }
    }

    fn bump(&mut self) {
        if let Some(ch) = self.cursor.read() {
            self.text.push(ch);
        }
    }

    fn emit(&mut self, kind: TokenKind) -> Token {
        let token = Token::new(kind, std::mem::take(&mut self.text), self.start);
        self.reset_start();
        token
    }

    fn reset_start(&mut self) {
        self.text.clear();
        self.start = self.cursor.position();
    }

    const fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            position: self.cursor.position(),
        }
    }
}

impl<S: CharSource> Iterator for Lexer<S> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: CharSource> FusedIterator for Lexer<S> {}

const fn is_eol(ch: char) -> bool {
    matches!(ch, '\r' | '\n')
}

fn is_key_char(ch: char) -> bool {
    !ch.is_whitespace() && ch != '='
}

use std::fmt;
use std::io::Read;

use log::trace;

use crate::Error;
use crate::env::EnvMap;
use crate::lexer::{LexOptions, Lexer};
use crate::source::{CharSource, Encoding, SequenceSource, StreamSource};
use crate::token::{Position, Token, TokenKind};

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A statement did not start with a key.
    ExpectedKey { found: Token },
    /// Input ended right after a key.
    ExpectedValue { key: String },
    /// A key was followed by something other than a value.
    InvalidValue { key: String, found: Token },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedKey { found } => write!(f, "Expected key. Got '{found}'"),
            Self::ExpectedValue { key } => write!(f, "Expected value for key: '{key}'"),
            Self::InvalidValue { key, found } => {
                write!(f, "Expected valid value for '{key}'. Got '{found}'")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", position.line, position.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
}

/// Parse dotenv text into an [`EnvMap`].
///
/// # Errors
///
/// Returns `Error::Parse` on malformed statements and `Error::Lex` when the
/// text cannot be tokenized.
pub fn parse_str(input: &str) -> Result<EnvMap, Error> {
    Parser::new(SequenceSource::new(input)).parse()
}

/// Parse UTF-8 dotenv text from a reader, consuming it fully.
///
/// Decoding is strict: invalid UTF-8 is an error, not replaced with
/// U+FFFD.
///
/// # Errors
///
/// As [`parse_str`], plus `Error::Io` on read failures and
/// `io::ErrorKind::InvalidData` for invalid byte sequences.
pub fn parse_reader<R: Read>(reader: R) -> Result<EnvMap, Error> {
    parse_reader_with_encoding(reader, Encoding::Utf8)
}

/// Parse dotenv text in the given encoding from a reader.
///
/// Invalid or truncated byte sequences fail the parse rather than being
/// replaced with U+FFFD.
///
/// # Errors
///
/// As [`parse_reader`].
pub fn parse_reader_with_encoding<R: Read>(reader: R, encoding: Encoding) -> Result<EnvMap, Error> {
    Parser::new(StreamSource::new(reader, encoding)).parse()
}

/// Turns the significant token stream into key/value pairs.
#[derive(Debug)]
pub struct Parser<S> {
    lexer: Lexer<S>,
}

impl<S: CharSource> Parser<S> {
    pub const fn new(source: S) -> Self {
        Self {
            lexer: Lexer::new(source, LexOptions::significant()),
        }
    }

    /// Parse every statement.
    ///
    /// Either the whole input parses or nothing is returned. A read error
    /// on the source takes precedence over the parse error it caused.
    ///
    /// # Errors
    ///
    /// Returns the first lex, parse, or read error.
    pub fn parse(mut self) -> Result<EnvMap, Error> {
        let result = self.parse_entries();
        let mut source = self.lexer.into_source();
        if let Some(err) = source.take_error() {
            return Err(Error::Io(err));
        }
        result
    }

    fn parse_entries(&mut self) -> Result<EnvMap, Error> {
        let mut env = EnvMap::new();

        while let Some(key) = self.lexer.next_token()? {
            let value = self.lexer.next_token()?;
            let (key, value) = self.validate(key, value)?;
            trace!("parsed {} for key {key}", value.kind);
            let value = normalize_value(value.kind, &value.text);
            env.insert(key, value);
        }

        Ok(env)
    }

    fn validate(&self, key: Token, value: Option<Token>) -> Result<(String, Token), ParseError> {
        if key.kind != TokenKind::Key {
            return Err(ParseError {
                position: key.position,
                kind: ParseErrorKind::ExpectedKey { found: key },
            });
        }

        let Some(value) = value else {
            return Err(ParseError {
                kind: ParseErrorKind::ExpectedValue { key: key.text },
                position: self.lexer.position(),
            });
        };

        if !value.kind.is_value() {
            return Err(ParseError {
                position: value.position,
                kind: ParseErrorKind::InvalidValue {
                    key: key.text,
                    found: value,
                },
            });
        }

        Ok((key.text, value))
    }
}

/// Normalize line endings to `\n`; double-quoted values additionally get
/// `\n` and `\r` escapes expanded.
#[must_use]
pub fn normalize_value(kind: TokenKind, text: &str) -> String {
    let value = text.replace("\r\n", "\n").replace('\r', "\n");
    if kind == TokenKind::DoubleQuoteValue {
        value.replace("\\n", "\n").replace("\\r", "\r")
    } else {
        value
    }
}

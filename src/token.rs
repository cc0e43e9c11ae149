use std::fmt;

/// Source location of a character or token.
///
/// All three fields are zero-based. The line counter moves forward when a
/// `\n` becomes the next character to be consumed, which puts the newline
/// itself at column 0 of the line it terminates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input. Never yielded by the lexer, used in diagnostics only.
    Eof,
    /// Run of whitespace, line terminators included.
    Whitespace,
    /// The `=` separating a key from its value.
    Equals,
    /// Comment (`# ...`), up to but excluding the line terminator.
    Comment,
    /// Key on the left side of `=`.
    Key,
    /// Unquoted value with trailing whitespace trimmed.
    Value,
    /// Single-quoted value (`'...'`), quotes excluded.
    SingleQuoteValue,
    /// Double-quoted value (`"..."`), quotes excluded.
    DoubleQuoteValue,
    /// Backtick-quoted value (`` `...` ``), backticks excluded.
    BacktickValue,
}

impl TokenKind {
    /// Whether this kind can appear on the right side of `=`.
    #[must_use]
    pub const fn is_value(self) -> bool {
        matches!(
            self,
            Self::Value | Self::SingleQuoteValue | Self::DoubleQuoteValue | Self::BacktickValue
        )
    }

    /// Whether this kind is dropped when whitespace is skipped.
    ///
    /// `Equals` counts as whitespace here: once whitespace is skipped the
    /// token stream is a plain alternation of keys and values.
    #[must_use]
    pub const fn is_whitespace(self) -> bool {
        matches!(self, Self::Whitespace | Self::Equals)
    }

    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::Comment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eof => "Eof",
            Self::Whitespace => "Whitespace",
            Self::Equals => "Equals",
            Self::Comment => "Comment",
            Self::Key => "Key",
            Self::Value => "Value",
            Self::SingleQuoteValue => "SingleQuoteValue",
            Self::DoubleQuoteValue => "DoubleQuoteValue",
            Self::BacktickValue => "BacktickValue",
        };
        f.write_str(name)
    }
}

/// A single token with its kind, text, and source location.
///
/// For quoted values `text` is the content between the delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, text: String, position: Position) -> Self {
        Self {
            kind,
            text,
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}='{}'", self.kind, self.text)
    }
}

//! Dotenv lexer, parser, and loader.
//!
//! Parses `.env` files into an [`EnvMap`] of string keys to string values,
//! from in-memory text or from a byte stream that is decoded as it is read.
//! Both paths share one lexer and produce the same result for the same text.
//!
//! # Quick start
//!
//! ## Parse text
//!
//! ```
//! use envfile_rs::parse_str;
//!
//! let env = parse_str("# database\nHOST = localhost # inline comment\nGREETING=\"hi\\nthere\"\n").unwrap();
//! assert_eq!(env.get("HOST"), Some("localhost"));
//! assert_eq!(env.get("GREETING"), Some("hi\nthere"));
//! ```
//!
//! ## Parse a stream
//!
//! ```
//! use envfile_rs::{Encoding, parse_reader_with_encoding};
//!
//! let bytes: Vec<u8> = "KEY='single quoted'".encode_utf16().flat_map(u16::to_le_bytes).collect();
//! let env = parse_reader_with_encoding(bytes.as_slice(), Encoding::Utf16Le).unwrap();
//! assert_eq!(env.get("KEY"), Some("single quoted"));
//! ```
//!
//! ## Inspect tokens
//!
//! ```
//! use envfile_rs::{LexOptions, TokenKind, tokenize};
//!
//! let tokens = tokenize("KEY = value # note", LexOptions::new().skip_whitespace(true)).unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(kinds, [TokenKind::Key, TokenKind::Value, TokenKind::Comment]);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod config;
pub mod cursor;
pub mod env;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod ring;
pub mod source;
pub mod token;

use std::io;
use std::path::PathBuf;

pub use config::{ConfigData, ConfigProvider, KEY_DELIMITER, normalize_key};
pub use env::{ApplyReport, EnvMap};
pub use lexer::{LexError, LexErrorKind, LexMode, LexOptions, Lexer, tokenize};
pub use loader::{
    DebugLogger, LoadOptions, default_search_dirs, find_env_file, load, load_from,
    load_into_process, parse_file,
};
pub use parser::{
    ParseError, ParseErrorKind, Parser, normalize_value, parse_reader, parse_reader_with_encoding,
    parse_str,
};
pub use source::{CharSource, Encoding, SequenceSource, StreamSource};
pub use token::{Position, Token, TokenKind};

/// Unified error type covering lexing, parsing, and loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// Reading or decoding the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The env file was not found in any searched directory.
    #[error("env file '{}' not found in: {}", .path.display(), display_dirs(.searched))]
    NotFound {
        path: PathBuf,
        searched: Vec<PathBuf>,
    },
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    if dirs.is_empty() {
        return "(no directories)".to_string();
    }
    dirs.iter()
        .map(|dir| format!("\n  {}", dir.display()))
        .collect()
}

/// Tokenize dotenv text read from `reader`.
///
/// # Errors
///
/// Returns `Error::Lex` on lexical errors and `Error::Io` on read or decode
/// failures.
pub fn tokenize_reader<R: io::Read>(
    reader: R,
    encoding: Encoding,
    options: LexOptions,
) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer::from_reader(reader, encoding, options);
    let mut tokens = Vec::new();
    let lexed = loop {
        match lexer.next_token() {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };
    if let Some(err) = lexer.into_source().take_error() {
        return Err(Error::Io(err));
    }
    lexed?;
    Ok(tokens)
}

//! Character sources the lexer reads from.
//!
//! [`SequenceSource`] holds the whole input in memory; [`StreamSource`]
//! decodes a byte stream on demand and keeps only the characters the lexer
//! has looked at but not yet consumed. Both yield the same characters for
//! the same text, so a single lexer serves both.

use std::io::{self, BufRead, BufReader, Read};

use crate::ring::RingBuffer;

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Pull-based character input with unbounded lookahead.
pub trait CharSource {
    /// The character `n` places past the next one, without consuming
    /// anything. `None` at end of input.
    fn peek_nth(&mut self, n: usize) -> Option<char>;

    /// Consume and return the next character.
    fn next_char(&mut self) -> Option<char>;

    /// Index of the last character among the next `limit` (all of which
    /// must already have been peeked) that satisfies `pred`.
    fn last_index_of(&self, limit: usize, pred: fn(char) -> bool) -> Option<usize>;

    /// Read error that cut the input short, if any.
    fn take_error(&mut self) -> Option<io::Error> {
        None
    }
}

/// Source over a fully materialized character sequence.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    chars: Vec<char>,
    pos: usize,
}

impl SequenceSource {
    #[must_use]
    pub fn new(input: &str) -> Self {
        let input = input.strip_prefix(BYTE_ORDER_MARK).unwrap_or(input);
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }
}

impl CharSource for SequenceSource {
    fn peek_nth(&mut self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        Some(ch)
    }

    fn last_index_of(&self, limit: usize, pred: fn(char) -> bool) -> Option<usize> {
        let end = (self.pos + limit).min(self.chars.len());
        self.chars[self.pos..end].iter().rposition(|&c| pred(c))
    }
}

/// Text encoding of a byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

/// Incremental decoder turning a byte stream into characters.
#[derive(Debug)]
pub struct Decoder<R> {
    reader: BufReader<R>,
    encoding: Encoding,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R, encoding: Encoding) -> Self {
        Self {
            reader: BufReader::new(reader),
            encoding,
        }
    }

    /// Decode the next character, `Ok(None)` at a clean end of stream.
    pub fn next_char(&mut self) -> io::Result<Option<char>> {
        match self.encoding {
            Encoding::Utf8 => self.next_utf8(),
            Encoding::Utf16Le => self.next_utf16(u16::from_le_bytes),
            Encoding::Utf16Be => self.next_utf16(u16::from_be_bytes),
            Encoding::Latin1 => Ok(self.next_byte()?.map(char::from)),
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        let Some(&byte) = buf.first() else {
            return Ok(None);
        };
        self.reader.consume(1);
        Ok(Some(byte))
    }

    fn next_utf8(&mut self) -> io::Result<Option<char>> {
        let Some(lead) = self.next_byte()? else {
            return Ok(None);
        };
        let width = match lead {
            0x00..=0x7F => return Ok(Some(char::from(lead))),
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(invalid_data(format!("invalid UTF-8 lead byte 0x{lead:02X}"))),
        };
        let mut buf = [lead, 0, 0, 0];
        self.reader
            .read_exact(&mut buf[1..width])
            .map_err(|e| truncated(e, "UTF-8 sequence"))?;
        let text = std::str::from_utf8(&buf[..width])
            .map_err(|e| invalid_data(format!("invalid UTF-8 input: {e}")))?;
        Ok(text.chars().next())
    }

    fn next_utf16(&mut self, unit: fn([u8; 2]) -> u16) -> io::Result<Option<char>> {
        let Some(first) = self.next_unit(unit)? else {
            return Ok(None);
        };
        let mut units = vec![first];
        if (0xD800..=0xDBFF).contains(&first) {
            let second = self
                .next_unit(unit)?
                .ok_or_else(|| invalid_data("unpaired UTF-16 surrogate at end of input".into()))?;
            units.push(second);
        }
        match char::decode_utf16(units).next() {
            Some(Ok(ch)) => Ok(Some(ch)),
            Some(Err(e)) => Err(invalid_data(format!("invalid UTF-16 input: {e}"))),
            None => Ok(None),
        }
    }

    fn next_unit(&mut self, unit: fn([u8; 2]) -> u16) -> io::Result<Option<u16>> {
        let Some(lo) = self.next_byte()? else {
            return Ok(None);
        };
        let hi = self
            .next_byte()?
            .ok_or_else(|| invalid_data("odd number of bytes in UTF-16 input".into()))?;
        Ok(Some(unit([lo, hi])))
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn truncated(err: io::Error, what: &str) -> io::Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        invalid_data(format!("truncated {what} at end of input"))
    } else {
        err
    }
}

/// Source over a byte stream, decoded as it is read.
///
/// Peeked characters wait in a ring buffer until consumed. A read or decode
/// failure ends the input early; the error is kept for [`CharSource::take_error`].
#[derive(Debug)]
pub struct StreamSource<R> {
    decoder: Decoder<R>,
    lookahead: RingBuffer<char>,
    exhausted: bool,
    error: Option<io::Error>,
}

impl<R: Read> StreamSource<R> {
    pub fn new(reader: R, encoding: Encoding) -> Self {
        let mut source = Self {
            decoder: Decoder::new(reader, encoding),
            lookahead: RingBuffer::new(),
            exhausted: false,
            error: None,
        };
        if source.peek_nth(0) == Some(BYTE_ORDER_MARK) {
            source.lookahead.pop_front();
        }
        source
    }

    /// Characters decoded but not yet consumed.
    #[must_use]
    pub const fn buffered(&self) -> usize {
        self.lookahead.len()
    }

    fn fill(&mut self, len: usize) {
        while !self.exhausted && self.lookahead.len() < len {
            match self.decoder.next_char() {
                Ok(Some(ch)) => self.lookahead.push_back(ch),
                Ok(None) => self.exhausted = true,
                Err(err) => {
                    self.exhausted = true;
                    self.error = Some(err);
                }
            }
        }
    }
}

impl<R: Read> CharSource for StreamSource<R> {
    fn peek_nth(&mut self, n: usize) -> Option<char> {
        self.fill(n + 1);
        self.lookahead.get(n).copied()
    }

    fn next_char(&mut self) -> Option<char> {
        self.fill(1);
        self.lookahead.pop_front()
    }

    fn last_index_of(&self, limit: usize, pred: fn(char) -> bool) -> Option<usize> {
        self.lookahead.last_index_of(limit, |&c| pred(c))
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

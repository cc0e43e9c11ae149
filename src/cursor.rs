use crate::source::CharSource;
use crate::token::Position;

/// Sentinel character that ends the input wherever it appears.
pub const NUL: char = '\0';

/// Steps allowed without the offset moving before the lexer is declared stuck.
pub(crate) const MAX_STALLED_STEPS: usize = 1_000_000;

/// Position-tracking reader over a [`CharSource`].
#[derive(Debug)]
pub struct Cursor<S> {
    source: S,
    position: Position,
    steps: usize,
    progress_mark: usize,
}

impl<S: CharSource> Cursor<S> {
    pub const fn new(source: S) -> Self {
        Self {
            source,
            position: Position {
                offset: 0,
                line: 0,
                column: 0,
            },
            steps: 0,
            progress_mark: 0,
        }
    }

    pub const fn position(&self) -> Position {
        self.position
    }

    pub fn peek(&mut self) -> Option<char> {
        self.peek_nth(0)
    }

    /// Character `n` places ahead. A NUL in the input reads as end of input.
    pub fn peek_nth(&mut self, n: usize) -> Option<char> {
        self.source.peek_nth(n).filter(|&ch| ch != NUL)
    }

    pub fn is_done(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Consume the next character and advance the position.
    pub fn read(&mut self) -> Option<char> {
        self.check_step();
        let ch = self.source.next_char()?;
        self.position.offset += 1;
        self.position.column += 1;
        if self.peek() == Some('\n') {
            self.position.line += 1;
            self.position.column = 0;
        }
        Some(ch)
    }

    /// Whether the next character is `ch`.
    pub fn is_at(&mut self, ch: char) -> bool {
        self.check_step();
        self.peek() == Some(ch)
    }

    pub fn last_index_of(&self, limit: usize, pred: fn(char) -> bool) -> Option<usize> {
        self.source.last_index_of(limit, pred)
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Count one lexer step and panic once too many pass without progress.
    ///
    /// # Panics
    ///
    /// When [`MAX_STALLED_STEPS`] steps have been counted at the same offset.
    pub(crate) fn check_step(&mut self) {
        if self.position.offset != self.progress_mark {
            self.progress_mark = self.position.offset;
            self.steps = 0;
        }
        self.steps += 1;
        if self.steps >= MAX_STALLED_STEPS {
            let current = self.peek();
            panic!(
                "lexer stalled at {current:?} at {} (offset: {})",
                self.position, self.position.offset
            );
        }
    }
}

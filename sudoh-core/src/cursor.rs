//! Read-only token sequence plus the single mutable index into it.

use crate::lexer::{Token, TokenKind};
use crate::span::Position;

/// Saved cursor location, only usable with the cursor that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// The token stream of one file.
///
/// The index only moves forward except through [`TokenCursor::restore`].
/// Reads past the end keep returning the `End` sentinel.
#[derive(Debug)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenCursor {
    /// `tokens` must end with an `End` token, as produced by the lexer.
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(tokens.last().is_some_and(|t| t.kind == TokenKind::End));
        TokenCursor { tokens, index: 0 }
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    pub fn text(&self) -> &str {
        &self.current().text
    }

    pub fn kind(&self) -> TokenKind {
        self.current().kind
    }

    pub fn position(&self) -> Position {
        self.current().position()
    }

    /// Token `distance` places ahead of the current one.
    pub fn peek(&self, distance: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + distance).min(last)]
    }

    pub fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    pub fn at_end(&self) -> bool {
        self.kind() == TokenKind::End
    }

    pub fn at_line_end(&self) -> bool {
        self.current().is_line_end()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.index)
    }

    pub fn restore(&mut self, mark: Mark) {
        self.index = mark.0;
    }
}

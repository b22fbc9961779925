//! Source positions attached to tokens and diagnostics.

use core::fmt;

/// Location of a token in its source file.
///
/// `line` is 1-based and only advances on real (or comment-synthesized)
/// newlines; `offset` is the 0-based byte offset of the token's first
/// character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, offset: usize) -> Self {
        Position { line, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} (byte {})", self.line, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_line_and_byte() {
        assert_eq!(Position::new(3, 41).to_string(), "line 3 (byte 41)");
    }
}

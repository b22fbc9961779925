//! Indentation tracking.
//!
//! Scope levels are never precomputed; every grammar rule that needs to
//! know where the next statement sits asks [`advance_to_next_significant_token`].

use crate::cursor::TokenCursor;
use crate::lexer::TokenKind;

/// Level before the top-level block has been opened.
pub const UNOPENED: i32 = -1;

/// Skips newline and leading-tab tokens and returns the indentation level
/// of the line holding the next significant token.
///
/// `running` is the level to report when no newline is crossed. End of
/// input and the `UNOPENED` sentinel both report level 0.
pub fn advance_to_next_significant_token(cursor: &mut TokenCursor, running: i32) -> i32 {
    let mut level = running;
    loop {
        match cursor.kind() {
            TokenKind::Newline => level = 0,
            TokenKind::Indent => level += 1,
            _ => break,
        }
        cursor.advance();
    }

    if level == UNOPENED || cursor.at_end() {
        0
    } else {
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn cursor(source: &str) -> TokenCursor {
        TokenCursor::new(tokenize(source).expect("tokenize"))
    }

    #[test]
    fn counts_tabs_after_newline() {
        let mut c = cursor("\n\n\t\tx");
        assert_eq!(advance_to_next_significant_token(&mut c, 0), 2);
        assert_eq!(c.text(), "x");
    }

    #[test]
    fn keeps_running_level_when_no_newline_is_crossed() {
        let mut c = cursor("x");
        assert_eq!(advance_to_next_significant_token(&mut c, 3), 3);
    }

    #[test]
    fn unopened_sentinel_reports_zero() {
        let mut c = cursor("x");
        assert_eq!(advance_to_next_significant_token(&mut c, UNOPENED), 0);
    }

    #[test]
    fn end_of_input_reports_zero() {
        let mut c = cursor("x\n\t\t");
        c.advance();
        assert_eq!(advance_to_next_significant_token(&mut c, 1), 0);
        assert!(c.at_end());
    }
}

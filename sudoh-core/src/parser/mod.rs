//! Single-pass Sudoh parser.
//!
//! Parsing, name resolution, type inference and code emission are
//! interleaved: every rule checks what it consumes and stages the
//! generated text right away. No syntax tree is built. The only state is
//! the `Parser` value itself, so independent files compile with
//! independent parsers.
//!
//! - `statement`  : lines, assignments, structures and blocks
//! - `expression` : the expression tiers with type inference

mod expression;
mod statement;

use tracing::debug;

use crate::cursor::TokenCursor;
use crate::emitter::{Emitter, Region};
use crate::error::{ErrorCategory, SyntaxError};
use crate::lexer::{Token, TokenKind};
use crate::names::{NameError, NameManager, PendingBindings, RoutineSignature, is_identifier};
use crate::scope::{self, UNOPENED};
use crate::span::Position;

pub type ParseResult<T> = Result<T, SyntaxError>;

/// Capabilities of the block being parsed: which extra statements are
/// legal in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockContext {
    /// `break` / `continue` allowed.
    pub in_loop: bool,
    /// `return` allowed.
    pub in_routine: bool,
}

/// Extra capability a structure grants to its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Loop,
    Routine,
}

impl BlockContext {
    pub fn with(self, capability: Option<Capability>) -> Self {
        match capability {
            None => self,
            Some(Capability::Loop) => BlockContext {
                in_loop: true,
                ..self
            },
            Some(Capability::Routine) => BlockContext {
                in_loop: false,
                in_routine: true,
            },
        }
    }
}

/// A file named on an `including` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRequest {
    pub name: String,
    pub position: Position,
}

/// Compilation state of one file.
pub struct Parser {
    cursor: TokenCursor,
    names: NameManager,
    emitter: Emitter,
    /// Scope level of the statement currently being parsed.
    level: i32,
    /// Region lines are committed to; `Routines` while inside a routine.
    region: Region,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            cursor: TokenCursor::new(tokens),
            names: NameManager::new(),
            emitter: Emitter::new(),
            level: 0,
            region: Region::Main,
        }
    }

    /// Positions the cursor on the first significant token and checks that
    /// the file's base scope is not indented.
    pub fn begin(&mut self) -> ParseResult<()> {
        self.level = 0;
        if self.next_line_level() != 0 {
            return Err(self.error(ErrorCategory::Structural, "base scope must not be indented"));
        }
        Ok(())
    }

    /// Parses an optional `including a, b, ...` line. Must directly follow
    /// [`Parser::begin`].
    pub fn parse_include_list(&mut self) -> ParseResult<Vec<IncludeRequest>> {
        if self.cursor.text() != "including" {
            return Ok(Vec::new());
        }
        self.cursor.advance();
        if self.cursor.at_line_end() {
            return Err(self.error(
                ErrorCategory::Structural,
                "expected file name after 'including'",
            ));
        }

        let mut includes = Vec::new();
        loop {
            let token = self.cursor.current();
            if !is_identifier(&token.text) {
                return Err(self.error(ErrorCategory::Structural, "invalid file name"));
            }
            includes.push(IncludeRequest {
                name: token.text.clone(),
                position: token.position(),
            });
            self.cursor.advance();
            if self.cursor.text() != "," {
                break;
            }
            self.cursor.advance();
        }

        if !self.cursor.at_line_end() {
            return Err(self.error(
                ErrorCategory::Structural,
                "expected end of line after included file names",
            ));
        }
        debug!(count = includes.len(), "parsed include list");
        Ok(includes)
    }

    /// Makes routines of an included unit callable from this file.
    pub fn import_routines(
        &mut self,
        routines: &[RoutineSignature],
        at: Position,
    ) -> ParseResult<()> {
        self.names
            .import_routines(routines)
            .map_err(|e| SyntaxError::name(e.to_string(), at))
    }

    pub fn add_include(&mut self, unit: &str) {
        self.emitter.include(unit);
    }

    /// Parses the rest of the file as the implicit top-level block, then
    /// validates every routine call.
    pub fn parse_program(&mut self) -> ParseResult<()> {
        self.level = UNOPENED;
        self.emitter.append("int main()");
        self.emitter.commit_line(self.region, self.level);
        self.parse_block(
            BlockContext::default(),
            statement::Body::Plain,
            PendingBindings::for_level(0),
        )?;
        self.names.validate_all_calls()
    }

    /// Routines defined in this file, in declaration order.
    pub fn defined_routines(&self) -> &[RoutineSignature] {
        self.names.defined_routines()
    }

    /// Assembled output; the main region is dropped for library units.
    pub fn finish(&self, include_main: bool) -> String {
        self.emitter.final_output(include_main)
    }

    // -----------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------

    /// Runs `rule` speculatively. If it declines (`Ok(None)`), the cursor
    /// and the staged output are rolled back. Rules must not touch the
    /// name manager before they are sure to match.
    fn attempt<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> ParseResult<Option<T>>,
    ) -> ParseResult<Option<T>> {
        let mark = self.cursor.mark();
        let staged = self.emitter.staged_len();
        let outcome = rule(self)?;
        if outcome.is_none() {
            self.cursor.restore(mark);
            self.emitter.truncate_staged(staged);
        }
        Ok(outcome)
    }

    fn next_line_level(&mut self) -> i32 {
        scope::advance_to_next_significant_token(&mut self.cursor, self.level)
    }

    /// Stages `text` and moves past the current token.
    fn advance_with(&mut self, text: &str) {
        self.cursor.advance();
        self.emitter.append(text);
    }

    /// Consumes `word` (staging `text`) or fails with `message`.
    fn expect(&mut self, word: &str, text: &str, message: &str) -> ParseResult<()> {
        if self.cursor.text() != word {
            return Err(self.error(ErrorCategory::Structural, message));
        }
        self.advance_with(text);
        Ok(())
    }

    /// Lowest frame whose variables are visible: routine bodies cannot see
    /// top-level variables.
    fn visibility_floor(&self) -> usize {
        match self.region {
            Region::Main => 0,
            Region::Routines => 1,
        }
    }

    fn variable_exists(&self, name: &str) -> bool {
        self.names.variable_exists(name, self.visibility_floor())
    }

    fn error(&self, category: ErrorCategory, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(category, message, self.cursor.position())
    }

    fn name_error(&self, error: NameError) -> SyntaxError {
        self.error(ErrorCategory::Name, error.to_string())
    }

    /// Allows an expression to continue on the next line, provided that
    /// line is indented deeper than the statement it belongs to.
    fn maybe_multiline(&mut self) -> ParseResult<()> {
        if self.cursor.kind() == TokenKind::Newline
            && self.next_line_level() <= self.level
        {
            return Err(self.error(
                ErrorCategory::Structural,
                "indentation of following lines of multiline statement must be greater than \
                 indentation of first line",
            ));
        }
        Ok(())
    }

    /// Parses `item (, item)*` up to (not including) `close`, staging
    /// `separator` between items. Returns the item count.
    fn parse_comma_separated(
        &mut self,
        close: &str,
        separator: &str,
        mut item: impl FnMut(&mut Self) -> ParseResult<()>,
    ) -> ParseResult<usize> {
        self.maybe_multiline()?;
        if self.cursor.text() == close {
            return Ok(0);
        }
        item(self)?;
        let mut count = 1;
        while self.cursor.text() == "," {
            self.advance_with(separator);
            self.maybe_multiline()?;
            item(self)?;
            count += 1;
        }
        self.maybe_multiline()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests;

//! Lines, blocks and control structures.

use tracing::debug;

use super::{BlockContext, Capability, ParseResult, Parser};
use crate::emitter::Region;
use crate::error::{ErrorCategory, SyntaxError};
use crate::lexer::TokenKind;
use crate::names::{PendingBindings, RoutineSignature, is_valid_name};
use crate::types::{BinaryOperator, TypeTag};

/// What kind of body a block is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Body {
    Plain,
    /// Gets an implicit `return null;` unless it ends with a `return`.
    Routine,
}

/// Parse step owed after a structure's block has closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Follow {
    Nothing,
    ElseChain,
    RepeatCondition,
    RoutineEnd,
}

/// Everything a structure header decides about the block under it.
#[derive(Debug)]
struct StructureHeader {
    capability: Option<Capability>,
    body: Body,
    bindings: PendingBindings,
    follow: Follow,
}

impl StructureHeader {
    fn plain(capability: Option<Capability>, follow: Follow) -> Self {
        StructureHeader {
            capability,
            body: Body::Plain,
            bindings: PendingBindings::default(),
            follow,
        }
    }
}

enum Line {
    End,
    Statement { returned: bool },
}

impl Parser {
    /// Parses a block one level deeper than the current statement.
    pub(super) fn parse_block(
        &mut self,
        ctx: BlockContext,
        body: Body,
        bindings: PendingBindings,
    ) -> ParseResult<()> {
        self.emitter.append("{");
        self.emitter.commit_line(self.region, self.level);

        let block_level = self.level + 1;
        self.level = self.next_line_level();
        if self.level < block_level {
            return Err(self.error(ErrorCategory::Structural, "empty block not allowed"));
        }
        self.names.enter_scope(bindings);

        let mut last_returned = false;
        while self.level == block_level {
            match self.parse_line(ctx)? {
                Line::End => break,
                Line::Statement { returned } => last_returned = returned,
            }
            self.level = self.next_line_level();
        }

        if self.level > block_level {
            return Err(self.error(
                ErrorCategory::Structural,
                "illegal attempt to increase indentation level",
            ));
        }

        if body == Body::Routine && !last_returned {
            self.emitter.append("return null;");
            self.emitter.commit_line(self.region, block_level);
        }

        let next_level = self.level;
        self.level = block_level - 1;
        self.emitter.append("}");
        self.emitter.commit_line(self.region, self.level);
        self.level = next_level;

        self.names.exit_scope();
        Ok(())
    }

    fn parse_line(&mut self, ctx: BlockContext) -> ParseResult<Line> {
        if self.cursor.at_end() {
            return Ok(Line::End);
        }

        if self.attempt(Self::parse_routine_call)?.is_some()
            || self.attempt(Self::parse_assignment)?.is_some()
        {
            self.emitter.append(";");
            self.end_of_line()?;
            return Ok(Line::Statement { returned: false });
        }

        if let Some(header) = self.attempt(Self::parse_structure_header)? {
            self.end_of_line()?;
            let scope = self.level;
            self.parse_block(ctx.with(header.capability), header.body, header.bindings)?;
            match header.follow {
                Follow::Nothing => {}
                Follow::ElseChain => self.parse_else_chain(scope, ctx)?,
                Follow::RepeatCondition => self.parse_repeat_condition(scope)?,
                Follow::RoutineEnd => {
                    self.emitter.commit_line(self.region, 0);
                    self.region = Region::Main;
                }
            }
            return Ok(Line::Statement { returned: false });
        }

        if let Some(returned) = self.parse_capability_statement(ctx)? {
            self.end_of_line()?;
            return Ok(Line::Statement { returned });
        }

        if self.cursor.text() == "including" {
            return Err(self.error(
                ErrorCategory::Structural,
                "'including' must be on the first line of the file",
            ));
        }
        Err(self.error(ErrorCategory::Structural, "invalid line"))
    }

    /// Requires the line to be over and commits its staged text.
    fn end_of_line(&mut self) -> ParseResult<()> {
        if !self.cursor.at_line_end() {
            return Err(self.error(
                ErrorCategory::Structural,
                "each statement must be on a new line; expected end of line",
            ));
        }
        self.emitter.commit_line(self.region, self.level);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Assignment
    // -----------------------------------------------------------------

    /// `target <- expr`, where `target` is a name with optional indices.
    fn parse_assignment(&mut self) -> ParseResult<Option<()>> {
        let name = self.cursor.text().to_string();
        if !is_valid_name(&name) {
            return Ok(None);
        }
        let Some(target_len) = self.assignment_target_len() else {
            return Ok(None);
        };
        let target: Vec<String> = (0..target_len)
            .map(|distance| self.cursor.peek(distance).text.clone())
            .collect();

        let exists = self.variable_exists(&name);
        if exists {
            self.advance_with(&format!("_{name}"));
        } else {
            self.advance_with(&format!("var _{name}"));
        }

        while self.cursor.text() == "[" {
            if !exists {
                return Err(self.error(
                    ErrorCategory::Name,
                    format!("cannot index into undeclared variable '{name}'"),
                ));
            }
            self.advance_with("[");
            self.parse_expr()?;
            self.expect("]", "]", "expected closing bracket")?;
        }
        self.expect("<-", "", "expected '<-'")?;

        if exists {
            if let Some(compound) = self.compound_operator(&target) {
                for _ in 0..=target.len() {
                    self.cursor.advance();
                }
                self.emitter.append(&format!(" {compound} "));
                self.parse_expr()?;
                return Ok(Some(()));
            }
        }

        self.emitter.append(" = ");
        self.parse_expr()?;
        if !exists {
            self.names.declare_variable(&name);
        }
        Ok(Some(()))
    }

    /// Token count of the assignment target starting at the cursor, if
    /// the target is followed by `<-`.
    fn assignment_target_len(&self) -> Option<usize> {
        let mut distance = 1;
        loop {
            match self.cursor.peek(distance).text.as_str() {
                "<-" => return Some(distance),
                "[" => distance = self.skip_group(distance)?,
                _ => return None,
            }
        }
    }

    /// Distance just past the bracket matching the opener at `open`.
    fn skip_group(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut distance = open;
        loop {
            let token = self.cursor.peek(distance);
            match token.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(distance + 1);
                    }
                }
                _ if token.kind == TokenKind::End => return None,
                _ => {}
            }
            distance += 1;
        }
    }

    /// Compound spelling (`+=` ...) for `target <- target op term` when the
    /// cursor sits right after the arrow. Only a call-free target followed
    /// by one arithmetic operator and a single term up to end of line
    /// qualifies.
    fn compound_operator(&self, target: &[String]) -> Option<&'static str> {
        if target.iter().any(|text| text == "(") {
            return None;
        }
        let repeats_target = target
            .iter()
            .enumerate()
            .all(|(distance, text)| self.cursor.peek(distance).text == *text);
        if !repeats_target {
            return None;
        }

        let compound = BinaryOperator::from_token(&self.cursor.peek(target.len()).text)?
            .compound_text()?;

        let start = target.len() + 1;
        let mut distance = start;
        loop {
            let token = self.cursor.peek(distance);
            if token.is_line_end() {
                return (distance > start).then_some(compound);
            }
            match token.text.as_str() {
                "(" | "[" | "{" => distance = self.skip_group(distance)?,
                "not" | "<-" | "," => return None,
                text if BinaryOperator::from_token(text).is_some() => return None,
                _ => distance += 1,
            }
        }
    }

    // -----------------------------------------------------------------
    // Structures
    // -----------------------------------------------------------------

    fn parse_structure_header(&mut self) -> ParseResult<Option<StructureHeader>> {
        let keyword = self.cursor.text().to_string();
        let header = match keyword.as_str() {
            "if" => self.parse_if_header()?,
            "while" | "until" => self.parse_while_header(keyword == "until")?,
            "for" => self.parse_for_header()?,
            "repeat" => {
                self.advance_with("do");
                StructureHeader::plain(Some(Capability::Loop), Follow::RepeatCondition)
            }
            "function" => self.parse_routine_header()?,
            _ => return Ok(None),
        };
        Ok(Some(header))
    }

    /// `if <boolean> then`
    fn parse_if_header(&mut self) -> ParseResult<StructureHeader> {
        self.advance_with("if (");
        self.parse_expr_expecting(&[TypeTag::Boolean])?;
        self.expect("then", ")", "expected 'then'")?;
        Ok(StructureHeader::plain(None, Follow::ElseChain))
    }

    /// `while <boolean> do` / `until <boolean> do`
    fn parse_while_header(&mut self, negated: bool) -> ParseResult<StructureHeader> {
        self.advance_with(if negated { "while (!(" } else { "while (" });
        self.parse_expr_expecting(&[TypeTag::Boolean])?;
        self.expect("do", if negated { "))" } else { ")" }, "expected 'do'")?;
        Ok(StructureHeader::plain(Some(Capability::Loop), Follow::Nothing))
    }

    /// `for i <- a (down)? to b do` / `for each e in xs do`
    fn parse_for_header(&mut self) -> ParseResult<StructureHeader> {
        self.advance_with("for (");
        if self.cursor.text() == "each" {
            self.cursor.advance();
            return self.parse_for_each_header();
        }

        let name = self.cursor.text().to_string();
        if !is_valid_name(&name) {
            return Err(self.error(
                ErrorCategory::Structural,
                "expected variable name after 'for'",
            ));
        }

        let mut bindings = PendingBindings::for_level(self.inner_level());
        if self.variable_exists(&name) {
            self.advance_with(&format!("_{name}"));
        } else {
            bindings.schedule(&name).map_err(|e| self.name_error(e))?;
            self.advance_with(&format!("var _{name}"));
        }

        self.expect("<-", " = ", "expected '<-' after 'for' loop variable")?;
        self.parse_expr_expecting(&[TypeTag::Number])?;
        self.emitter.append(&format!("; _{name}"));

        let down = self.cursor.text() == "down";
        if down {
            self.cursor.advance();
        }
        self.expect("to", if down { " >= " } else { " <= " }, "expected 'to' or 'down to'")?;
        self.parse_expr_expecting(&[TypeTag::Number])?;

        let step = if down { "-=" } else { "+=" };
        self.expect("do", &format!("; _{name} {step} var(1))"), "expected 'do'")?;

        Ok(StructureHeader {
            capability: Some(Capability::Loop),
            body: Body::Plain,
            bindings,
            follow: Follow::Nothing,
        })
    }

    fn parse_for_each_header(&mut self) -> ParseResult<StructureHeader> {
        let name = self.cursor.text().to_string();
        if !is_valid_name(&name) {
            return Err(self.error(
                ErrorCategory::Structural,
                "expected declaration of 'for each' loop iteration variable",
            ));
        }
        if self.variable_exists(&name) {
            return Err(self.error(
                ErrorCategory::Name,
                "'for each' iteration variable must be a new variable",
            ));
        }

        let mut bindings = PendingBindings::for_level(self.inner_level());
        bindings.schedule(&name).map_err(|e| self.name_error(e))?;
        self.advance_with(&format!("var _{name}"));

        self.expect("in", " : ", "expected 'in'")?;
        self.parse_expr_expecting(&[TypeTag::String, TypeTag::List, TypeTag::Map])?;
        self.expect("do", ")", "expected 'do'")?;

        Ok(StructureHeader {
            capability: Some(Capability::Loop),
            body: Body::Plain,
            bindings,
            follow: Follow::Nothing,
        })
    }

    /// `function name(a, b, ...)`
    fn parse_routine_header(&mut self) -> ParseResult<StructureHeader> {
        if self.region == Region::Routines {
            return Err(self.error(ErrorCategory::Structural, "nested function illegal"));
        }
        if self.level != 0 {
            return Err(self.error(
                ErrorCategory::Structural,
                "functions must be declared at the top level",
            ));
        }
        self.cursor.advance();

        let name_token = self.cursor.current().clone();
        if !is_valid_name(&name_token.text) {
            return Err(self.error(ErrorCategory::Structural, "invalid function name"));
        }

        self.region = Region::Routines;
        self.advance_with(&format!("var f_{}(", name_token.text));
        self.expect("(", "", "expected parameter list after function name")?;

        let mut bindings = PendingBindings::for_level(1);
        let arity = self.parse_comma_separated(")", ", ", |p| {
            let param = p.cursor.text().to_string();
            if !is_valid_name(&param) {
                return Err(p.error(ErrorCategory::Structural, "expected parameter name"));
            }
            bindings.schedule(&param).map_err(|e| p.name_error(e))?;
            p.advance_with(&format!("var _{param}"));
            Ok(())
        })?;
        self.expect(")", ")", "expected closing parenthesis after parameters")?;

        self.names
            .register_declaration(RoutineSignature::new(&name_token.text, arity))
            .map_err(|e| SyntaxError::name(e.to_string(), name_token.position()))?;
        debug!(name = %name_token.text, arity, line = name_token.line, "parsed function header");

        Ok(StructureHeader {
            capability: Some(Capability::Routine),
            body: Body::Routine,
            bindings,
            follow: Follow::RoutineEnd,
        })
    }

    /// Any number of `else if <boolean> then` blocks followed by at most
    /// one `else` block, all at the `if`'s own level.
    fn parse_else_chain(&mut self, scope: i32, ctx: BlockContext) -> ParseResult<()> {
        let mut else_reached = false;
        while self.level == scope && self.cursor.text() == "else" {
            if self.cursor.peek(1).text == "if" {
                if else_reached {
                    return Err(self.error(
                        ErrorCategory::Structural,
                        "'else' block cannot be followed by 'else if' block",
                    ));
                }
                self.advance_with("else");
                self.advance_with(" if (");
                self.parse_expr_expecting(&[TypeTag::Boolean])?;
                self.expect("then", ")", "expected 'then'")?;
            } else {
                if else_reached {
                    return Err(self.error(
                        ErrorCategory::Structural,
                        "multiple 'else' blocks not allowed",
                    ));
                }
                else_reached = true;
                self.advance_with("else");
            }
            self.end_of_line()?;
            self.parse_block(ctx, Body::Plain, PendingBindings::default())?;
        }
        Ok(())
    }

    /// The mandatory `while <boolean>` / `until <boolean>` closing a
    /// `repeat` block.
    fn parse_repeat_condition(&mut self, scope: i32) -> ParseResult<()> {
        let keyword = self.cursor.text().to_string();
        if self.level != scope || (keyword != "while" && keyword != "until") {
            return Err(self.error(
                ErrorCategory::Structural,
                "expected 'while' or 'until' condition after 'repeat' block",
            ));
        }
        let negated = keyword == "until";
        self.advance_with(if negated { "while (!(" } else { "while (" });
        self.parse_expr_expecting(&[TypeTag::Boolean])?;
        self.emitter.append(if negated { "));" } else { ");" });
        self.end_of_line()
    }

    // -----------------------------------------------------------------
    // Capability statements
    // -----------------------------------------------------------------

    /// `break` / `continue` inside loops and `return` inside routines.
    /// Returns whether the statement was a `return`.
    fn parse_capability_statement(&mut self, ctx: BlockContext) -> ParseResult<Option<bool>> {
        let keyword = self.cursor.text().to_string();
        match keyword.as_str() {
            "break" | "continue" => {
                if !ctx.in_loop {
                    return Err(self.error(
                        ErrorCategory::Structural,
                        format!("'{keyword}' is only allowed inside a loop"),
                    ));
                }
                self.advance_with(&format!("{keyword};"));
                Ok(Some(false))
            }
            "return" => {
                if !ctx.in_routine {
                    return Err(self.error(
                        ErrorCategory::Structural,
                        "'return' is only allowed inside a function",
                    ));
                }
                self.advance_with("return ");
                if self.cursor.at_line_end() {
                    self.emitter.append("null");
                } else {
                    self.parse_expr()?;
                }
                self.emitter.append(";");
                Ok(Some(true))
            }
            _ => Ok(None),
        }
    }

    /// Level of the block a structure header is about to open.
    fn inner_level(&self) -> usize {
        usize::try_from(self.level + 1).unwrap_or(0)
    }
}

//! Expressions.
//!
//! Three binary tiers, loosest first: `and`/`or`, comparisons, then
//! arithmetic. All operators in a tier share one precedence and associate
//! to the left. Each rule returns the static [`TypeTag`] of what it parsed
//! so the caller can check operator legality on the spot.

use super::{ParseResult, Parser};
use crate::error::{ErrorCategory, SyntaxError};
use crate::lexer::TokenKind;
use crate::names::is_valid_name;
use crate::types::{BinaryOperator, Tier, TypeTag};

impl Parser {
    pub(super) fn parse_expr(&mut self) -> ParseResult<TypeTag> {
        self.parse_tier(Tier::Logical)
    }

    /// Parses an expression and requires its tag to be one of `allowed`.
    /// `any` always passes.
    pub(super) fn parse_expr_expecting(&mut self, allowed: &[TypeTag]) -> ParseResult<TypeTag> {
        let position = self.cursor.position();
        let found = self.parse_expr()?;
        if found == TypeTag::Any || allowed.contains(&found) {
            return Ok(found);
        }
        let expected = allowed
            .iter()
            .map(|tag| tag.name())
            .collect::<Vec<_>>()
            .join(" | ");
        Err(SyntaxError::type_mismatch(
            format!("expected expression of type ({expected}) but found '{found}'"),
            position,
        ))
    }

    fn parse_tier(&mut self, tier: Tier) -> ParseResult<TypeTag> {
        let mut left = self.parse_operand(tier)?;
        while let Some(op) =
            BinaryOperator::from_token(self.cursor.text()).filter(|op| op.tier() == tier)
        {
            let position = self.cursor.position();
            self.advance_with(&format!(" {} ", op.target_text()));
            self.maybe_multiline()?;
            let right = self.parse_operand(tier)?;
            left = op.result_type(left, right).ok_or_else(|| {
                SyntaxError::type_mismatch(
                    format!(
                        "binary operator '{}' cannot be applied to types '{left}' and '{right}'",
                        op.source_text()
                    ),
                    position,
                )
            })?;
        }
        Ok(left)
    }

    fn parse_operand(&mut self, tier: Tier) -> ParseResult<TypeTag> {
        match tier {
            Tier::Logical => self.parse_tier(Tier::Comparison),
            Tier::Comparison => self.parse_tier(Tier::Arithmetic),
            Tier::Arithmetic => self.parse_term(),
        }
    }

    fn parse_term(&mut self) -> ParseResult<TypeTag> {
        let token = self.cursor.current().clone();
        match token.text.as_str() {
            "not" => {
                self.advance_with("!(");
                self.parse_expr_expecting(&[TypeTag::Boolean])?;
                self.emitter.append(")");
                Ok(TypeTag::Boolean)
            }
            "(" => {
                self.advance_with("(");
                let inner = self.parse_expr()?;
                self.expect(")", ")", "expected closing parenthesis")?;
                Ok(inner)
            }
            "true" | "false" => {
                self.advance_with(&format!("var({})", token.text));
                Ok(TypeTag::Boolean)
            }
            "null" => {
                self.advance_with("null");
                Ok(TypeTag::Null)
            }
            "[" => self.parse_list_literal(),
            "{" => self.parse_map_literal(),
            "-" if is_number_literal(&self.cursor.peek(1).text) => {
                self.cursor.advance();
                let digits = self.cursor.text().to_string();
                self.advance_with(&format!("var(-{digits})"));
                Ok(TypeTag::Number)
            }
            _ if token.kind == TokenKind::StringLiteral => {
                self.advance_with(&format!("var(std::string({}))", token.text));
                Ok(TypeTag::String)
            }
            text if is_number_literal(text) => {
                self.advance_with(&format!("var({text})"));
                Ok(TypeTag::Number)
            }
            _ => {
                if self.parse_routine_call()?.is_some() || self.parse_variable_reference()?.is_some()
                {
                    Ok(TypeTag::Any)
                } else {
                    Err(self.error(ErrorCategory::Structural, "expected expression term"))
                }
            }
        }
    }

    /// `[a, b, ...]`
    fn parse_list_literal(&mut self) -> ParseResult<TypeTag> {
        self.advance_with("var(List{ ");
        self.parse_comma_separated("]", ", ", |p| p.parse_expr().map(drop))?;
        self.expect("]", " })", "expected closing ']'")?;
        Ok(TypeTag::List)
    }

    /// `{k <- v, ...}`
    fn parse_map_literal(&mut self) -> ParseResult<TypeTag> {
        self.advance_with("var(Map{ ");
        self.parse_comma_separated("}", ", ", Self::parse_map_entry)?;
        self.expect("}", " })", "expected closing '}'")?;
        Ok(TypeTag::Map)
    }

    fn parse_map_entry(&mut self) -> ParseResult<()> {
        self.emitter.append("{ ");
        self.parse_expr()?;
        self.expect("<-", ", ", "map entry must be of form <key> <- <value>")?;
        self.parse_expr()?;
        self.emitter.append(" }");
        Ok(())
    }

    /// `name(args...)`. Declines unless a valid name is directly followed
    /// by `(`. The call is recorded and validated at end of file.
    pub(super) fn parse_routine_call(&mut self) -> ParseResult<Option<()>> {
        let token = self.cursor.current().clone();
        if !is_valid_name(&token.text) || self.cursor.peek(1).text != "(" {
            return Ok(None);
        }
        self.cursor.advance();
        self.advance_with(&format!("f_{}(", token.text));
        let arity = self.parse_comma_separated(")", ", ", |p| p.parse_expr().map(drop))?;
        self.expect(")", ")", "expected closing parenthesis for function call")?;
        self.names.record_call(&token.text, arity, token.position());
        Ok(Some(()))
    }

    /// A variable read, with `[i]` indices emitted as checked `.at(i)`.
    fn parse_variable_reference(&mut self) -> ParseResult<Option<()>> {
        let name = self.cursor.text().to_string();
        if !is_valid_name(&name) {
            return Ok(None);
        }
        if !self.variable_exists(&name) {
            return Err(self.error(
                ErrorCategory::Name,
                format!("use of undeclared variable '{name}'"),
            ));
        }
        self.advance_with(&format!("_{name}"));
        while self.cursor.text() == "[" {
            self.advance_with(".at(");
            self.parse_expr()?;
            self.expect("]", ")", "expected closing bracket")?;
        }
        Ok(Some(()))
    }
}

/// `[0-9]+(\.[0-9]+)?`
fn is_number_literal(text: &str) -> bool {
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match text.split_once('.') {
        Some((whole, fraction)) => digits(whole) && digits(fraction),
        None => digits(text),
    }
}

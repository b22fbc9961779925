//! Static type tags and binary operator legality.
//!
//! Tags are computed while an expression is parsed and thrown away once
//! the enclosing rule has checked them; nothing here is persisted.

use core::fmt;

/// Best static knowledge of an expression's runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Number,
    Boolean,
    String,
    List,
    Map,
    Null,
    /// Known only at run time (variables, routine results). Accepted on
    /// either side of every operator.
    Any,
}

impl TypeTag {
    pub const ALL: [TypeTag; 7] = [
        TypeTag::Number,
        TypeTag::Boolean,
        TypeTag::String,
        TypeTag::List,
        TypeTag::Map,
        TypeTag::Null,
        TypeTag::Any,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::String => "string",
            TypeTag::List => "list",
            TypeTag::Map => "map",
            TypeTag::Null => "null",
            TypeTag::Any => "any",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Precedence tier an operator belongs to, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Logical,
    Comparison,
    Arithmetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn from_token(text: &str) -> Option<Self> {
        use BinaryOperator::*;
        Some(match text {
            "and" => And,
            "or" => Or,
            "=" => Equal,
            "!=" => NotEqual,
            "<" => Less,
            "<=" => LessEqual,
            ">" => Greater,
            ">=" => GreaterEqual,
            "+" => Add,
            "-" => Subtract,
            "*" => Multiply,
            "/" => Divide,
            "mod" => Modulo,
            _ => return None,
        })
    }

    pub fn tier(self) -> Tier {
        use BinaryOperator::*;
        match self {
            And | Or => Tier::Logical,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => Tier::Comparison,
            Add | Subtract | Multiply | Divide | Modulo => Tier::Arithmetic,
        }
    }

    /// Spelling in Sudoh source.
    pub fn source_text(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            And => "and",
            Or => "or",
            Equal => "=",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "mod",
        }
    }

    /// Spelling in emitted code.
    pub fn target_text(self) -> &'static str {
        match self {
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Equal => "==",
            BinaryOperator::Modulo => "%",
            other => other.source_text(),
        }
    }

    /// Compound assignment form, for arithmetic operators only.
    pub fn compound_text(self) -> Option<&'static str> {
        use BinaryOperator::*;
        match self {
            Add => Some("+="),
            Subtract => Some("-="),
            Multiply => Some("*="),
            Divide => Some("/="),
            Modulo => Some("%="),
            _ => None,
        }
    }

    /// Result tag of `left op right`, or `None` if the pair is illegal.
    pub fn result_type(self, left: TypeTag, right: TypeTag) -> Option<TypeTag> {
        use BinaryOperator::*;
        use TypeTag::*;
        match self {
            Add => match (left, right) {
                (Number, Number) | (Number, Any) => Some(Number),
                (String, _) => Some(String),
                (List, _) => Some(List),
                (Any, _) | (_, Any) => Some(Any),
                _ => None,
            },
            Subtract | Multiply | Divide | Modulo => match (left, right) {
                (Number, Number) | (Any, _) | (_, Any) => Some(Number),
                _ => None,
            },
            And | Or => match (left, right) {
                (Boolean, Boolean) | (Any, _) | (_, Any) => Some(Boolean),
                _ => None,
            },
            Equal | NotEqual => {
                let legal = left == right
                    || matches!(left, Null | Any)
                    || matches!(right, Null | Any);
                legal.then_some(Boolean)
            }
            Less | LessEqual | Greater | GreaterEqual => match (left, right) {
                (Number, Number) | (String, String) | (Any, _) | (_, Any) => Some(Boolean),
                _ => None,
            },
        }
    }
}

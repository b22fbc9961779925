//! Lexer for Sudoh source.
//!
//! Tokenizing is delimiter driven: at every byte the fixed `DELIMITERS`
//! table is consulted in order, and the run of word bytes between two
//! delimiters becomes one `Word` token. Newlines and leading tabs are kept
//! in the stream because block structure is derived from them later.

use crate::error::SyntaxError;
use crate::span::Position;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `\n`, either real or standing in for a line comment.
    Newline,
    /// A tab at the start of a line (before any other token).
    Indent,
    /// Identifiers, keywords and numeric literals.
    Word,
    /// Punctuation and operators from the delimiter table.
    Symbol,
    /// A string literal, quotes included.
    StringLiteral,
    /// End-of-stream sentinel with empty text.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub offset: usize,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, line: usize, offset: usize, text: &str) -> Self {
        Token {
            kind,
            line,
            offset,
            text: text.to_string(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.offset)
    }

    pub fn is_line_end(&self) -> bool {
        matches!(self.kind, TokenKind::Newline | TokenKind::End)
    }
}

/// Strings that both separate tokens and (except whitespace) are tokens
/// themselves. Order matters: longer symbols sharing a prefix come first.
const DELIMITERS: &[&str] = &[
    " ", "\r", ",", "\"", "\n", "\t", "(", ")", "[", "]", "{", "}", "<-", "+", "-", "*", "//",
    "/", "<=", "<", ">=", ">", "=", "!=",
];

/// Lex a whole source file.
///
/// Either the complete token sequence (terminated by an `End` token) is
/// returned, or the first lexical fault.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        index: 0,
        word_start: 0,
        line: 1,
        at_line_start: true,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    index: usize,
    word_start: usize,
    line: usize,
    /// True until the first non-whitespace token of the current line.
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> Result<(), SyntaxError> {
        while self.index < self.bytes.len() {
            let Some(delim) = self.delimiter_at(self.index) else {
                let ch = self.bytes[self.index];
                if !is_word_byte(ch) {
                    return Err(self.invalid_character());
                }
                self.at_line_start = false;
                self.index += 1;
                continue;
            };

            self.flush_word();

            match delim {
                " " | "\r" => {}
                "\"" => self.lex_string()?,
                "//" => self.skip_comment(),
                "\t" => {
                    if self.at_line_start {
                        self.push(TokenKind::Indent, self.index, "\t");
                    }
                }
                "\n" => {
                    self.push(TokenKind::Newline, self.index, "\n");
                    self.line += 1;
                    self.at_line_start = true;
                }
                symbol => {
                    self.at_line_start = false;
                    self.push(TokenKind::Symbol, self.index, symbol);
                    self.index += symbol.len() - 1;
                }
            }

            self.index += 1;
            self.word_start = self.index;
        }

        self.flush_word();
        self.push(TokenKind::End, self.bytes.len(), "");
        Ok(())
    }

    fn delimiter_at(&self, index: usize) -> Option<&'static str> {
        let rest = &self.bytes[index..];
        DELIMITERS
            .iter()
            .copied()
            .find(|delim| rest.starts_with(delim.as_bytes()))
    }

    fn flush_word(&mut self) {
        if self.index > self.word_start {
            let text = &self.source[self.word_start..self.index];
            self.push(TokenKind::Word, self.word_start, text);
        }
    }

    fn push(&mut self, kind: TokenKind, offset: usize, text: &str) {
        self.tokens.push(Token::new(kind, self.line, offset, text));
    }

    /// Consumes a string literal starting at the opening quote. On return
    /// `index` points at the closing quote.
    fn lex_string(&mut self) -> Result<(), SyntaxError> {
        let open = self.index;
        let mut close = open + 1;
        while close < self.bytes.len() {
            if self.bytes[close] == b'"' && self.bytes[close - 1] != b'\\' {
                break;
            }
            close += 1;
        }
        if close == self.bytes.len() {
            return Err(SyntaxError::lexical(
                "malformed string",
                Position::new(self.line, open),
            ));
        }

        let text = &self.source[open..=close];
        self.push(TokenKind::StringLiteral, open, text);
        self.line += text.matches('\n').count();
        self.at_line_start = false;
        self.index = close;
        Ok(())
    }

    /// Replaces a `//` comment with a single newline token. On return
    /// `index` points at the comment's terminating newline (or the last
    /// byte of input).
    fn skip_comment(&mut self) {
        self.push(TokenKind::Newline, self.index, "\n");
        self.line += 1;
        self.at_line_start = true;
        self.index = match self.source[self.index..].find('\n') {
            Some(relative) => self.index + relative,
            None => self.bytes.len() - 1,
        };
    }

    fn invalid_character(&self) -> SyntaxError {
        let ch = self.source[self.index..].chars().next().unwrap_or('?');
        SyntaxError::lexical(
            format!("invalid character '{ch}'"),
            Position::new(self.line, self.index),
        )
    }
}

fn is_word_byte(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'.'
}

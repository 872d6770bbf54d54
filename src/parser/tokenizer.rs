//! Tokenizer for payroll formula expressions
//!
//! Scans the input left to right over a byte cursor and materializes the
//! whole token sequence eagerly; the recursive-descent evaluator needs
//! index-based cursor movement rather than a lazy stream. Whitespace is
//! skipped silently and never emitted. The first unrecognized character
//! aborts tokenization with a parse error naming the character and its
//! 0-based offset; there is no recovery or partial output.

use crate::error::{CalcError, Result};

/// Classification of a token produced by [`tokenize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Decimal-literal number (digits with optional single decimal point)
    Number,
    /// Arithmetic operator: `+ - * / % ^`
    Operator,
    /// Identifier immediately followed by `(`
    Function,
    /// Bare identifier
    Variable,
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Argument separator `,`
    Comma,
}

/// A classified, positioned fragment of a tokenized expression
///
/// Tokens borrow from the input; they are produced once per evaluation and
/// not retained after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'input> {
    /// Token classification
    pub kind: TokenKind,
    /// Source text of the token (`**` is normalized to `^`)
    pub text: &'input str,
    /// 0-based source offset, used only for error messages
    pub position: usize,
}

impl<'input> Token<'input> {
    /// Check whether this token is the given operator
    #[inline]
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }
}

/// Byte-cursor scanner over a single expression string
struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
}

impl<'input> Tokenizer<'input> {
    fn new(input: &'input str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline]
    fn slice(&self, start: usize, end: usize) -> &'input str {
        &self.input[start..end]
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Scan a number literal: digits with an optional single decimal point.
    /// Exponent notation and thousands separators are not recognized; a
    /// second `.` ends the literal and fails on the next scan.
    fn scan_number(&mut self) -> Token<'input> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        Token {
            kind: TokenKind::Number,
            text: self.slice(start, self.pos),
            position: start,
        }
    }

    /// Scan an identifier and classify it as FUNCTION when the very next
    /// character is `(` (no whitespace allowed before the parenthesis),
    /// VARIABLE otherwise. Case is preserved, not normalized.
    fn scan_identifier(&mut self) -> Token<'input> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        let kind = if self.peek() == Some(b'(') {
            TokenKind::Function
        } else {
            TokenKind::Variable
        };
        Token {
            kind,
            text: self.slice(start, self.pos),
            position: start,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token<'input>>> {
        self.skip_whitespace();

        let start = self.pos;
        let Some(b) = self.peek() else {
            return Ok(None);
        };

        let token = match b {
            b'0'..=b'9' => self.scan_number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),
            // `**` before `*`: multi-character operators match first
            b'*' if self.peek_at(1) == Some(b'*') => {
                self.pos += 2;
                Token {
                    kind: TokenKind::Operator,
                    text: "^",
                    position: start,
                }
            }
            b'+' | b'-' | b'*' | b'/' | b'%' | b'^' => {
                self.pos += 1;
                Token {
                    kind: TokenKind::Operator,
                    text: self.slice(start, self.pos),
                    position: start,
                }
            }
            b'(' => {
                self.pos += 1;
                Token {
                    kind: TokenKind::LeftParen,
                    text: "(",
                    position: start,
                }
            }
            b')' => {
                self.pos += 1;
                Token {
                    kind: TokenKind::RightParen,
                    text: ")",
                    position: start,
                }
            }
            b',' => {
                self.pos += 1;
                Token {
                    kind: TokenKind::Comma,
                    text: ",",
                    position: start,
                }
            }
            _ => {
                // Decode the full character for the message; the cursor may
                // sit on the first byte of a multi-byte sequence.
                let ch = self.input[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(CalcError::parse_error(
                    start,
                    format!("unexpected character '{ch}'"),
                ));
            }
        };

        Ok(Some(token))
    }
}

/// Tokenize an expression into a finite, eagerly-materialized sequence
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

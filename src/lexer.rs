use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("Unrecognized byte '{}' ({byte}) at line {line}, column {column}", char::from(*.byte))]
    UnexpectedByte { byte: u8, line: u32, column: u32 },
    #[error("Unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: u32, column: u32 },
}

pub type LexResult<T> = Result<T, LexError>;

/// Hand-written scanner over the raw source bytes.
///
/// Lines are 1-based; columns are 0-based and reset on every line feed.
/// Tokens record the position of their first byte and borrow their lexeme
/// from the source buffer.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 0,
            tokens: Vec::new(),
        }
    }

    pub fn scan(mut self) -> LexResult<Vec<Token<'a>>> {
        while let Some(byte) = self.peek() {
            let line = self.line;
            let column = self.column;
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'#' => self.skip_comment(),
                b'"' => self.read_string(line, column)?,
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.read_identifier(line, column),
                b'0'..=b'9' => self.read_number(line, column),
                _ => {
                    let Some(kind) = punctuation_kind(byte) else {
                        return Err(LexError::UnexpectedByte { byte, line, column });
                    };
                    let lexeme = &self.input[self.pos..self.pos + 1];
                    self.advance();
                    self.tokens.push(Token::new(kind, lexeme, line, column));
                }
            }
        }
        Ok(self.tokens)
    }

    // The line feed stays in the stream so the whitespace arm counts it.
    fn skip_comment(&mut self) {
        while let Some(byte) = self.peek() {
            if byte == b'\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_identifier(&mut self, line: u32, column: u32) {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_alphanumeric() && byte != b'_' {
                break;
            }
            self.advance();
        }
        let lexeme = &self.input[start..self.pos];
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Id);
        self.tokens.push(Token::new(kind, lexeme, line, column));
    }

    fn read_number(&mut self, line: u32, column: u32) {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_digit() {
                break;
            }
            self.advance();
        }
        let lexeme = &self.input[start..self.pos];
        self.tokens.push(Token::new(TokenKind::Num, lexeme, line, column));
    }

    // Raw passthrough between the quotes: no escapes, and embedded line
    // feeds stay content bytes while still advancing the line counter.
    fn read_string(&mut self, line: u32, column: u32) -> LexResult<()> {
        self.advance(); // opening quote
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b'"') => {
                    let lexeme = &self.input[start..self.pos];
                    self.advance(); // closing quote
                    self.tokens.push(Token::new(TokenKind::Str, lexeme, line, column));
                    return Ok(());
                }
                Some(_) => {
                    self.advance();
                }
                None => return Err(LexError::UnterminatedString { line, column }),
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn advance(&mut self) {
        let Some(byte) = self.peek() else { return };
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}

fn punctuation_kind(byte: u8) -> Option<TokenKind> {
    let kind = match byte {
        b'+' => TokenKind::Plus,
        b'-' => TokenKind::Minus,
        b'/' => TokenKind::Div,
        b'*' => TokenKind::Mult,
        b'=' => TokenKind::Equals,
        b'!' => TokenKind::Bang,
        b',' => TokenKind::Comma,
        b':' => TokenKind::Colon,
        b';' => TokenKind::Semicolon,
        b'(' => TokenKind::LParen,
        b')' => TokenKind::RParen,
        b'{' => TokenKind::LBrace,
        b'}' => TokenKind::RBrace,
        b'[' => TokenKind::LBracket,
        b']' => TokenKind::RBracket,
        _ => return None,
    };
    Some(kind)
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token<'_>>> {
    Lexer::new(input).scan()
}

/// Formats the token list grouped by source line, for `--dump-tokens`.
pub fn render_token_stream(tokens: &[Token<'_>]) -> String {
    use std::fmt::Write;

    let mut listing = String::new();
    let mut current_line = 0;
    for token in tokens {
        if token.line > current_line {
            current_line = token.line;
            let _ = writeln!(listing, "LINE {current_line}:");
        }
        let _ = writeln!(
            listing,
            "    {:<12} = {:<10} at {},{}",
            format!("{:?}", token.kind),
            token.lexeme,
            token.line,
            token.column
        );
    }
    listing
}

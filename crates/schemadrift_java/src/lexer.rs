//! Tokenizer for Java source text.
//!
//! Produces just enough structure for declaration parsing: identifiers,
//! literals and single-character punctuation. Comments and whitespace are
//! dropped. Multi-character operators come out as runs of punctuation, which
//! keeps `>>` in nested generics trivially splittable.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    /// String or text-block literal, escapes decoded.
    Str(String),
    /// Character literal, escapes decoded.
    Char(String),
    /// Numeric literal exactly as written.
    Number(String),
    Punct(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) | Self::Number(s) => f.write_str(s),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Char(s) => write!(f, "'{s}'"),
            Self::Punct(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

/// Tokenization failure with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

/// Tokenize `source`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    lexer.run()
}

impl Lexer {
    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: u32, column: u32, message: impl Into<String>) -> LexError {
        LexError {
            line,
            column,
            message: message.into(),
        }
    }

    fn run(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek(0) {
            let (line, column) = (self.line, self.column);

            if c.is_whitespace() || c == '\u{feff}' {
                self.bump();
                continue;
            }

            if c == '/' && self.peek(1) == Some('/') {
                while let Some(c) = self.peek(0) {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
                continue;
            }

            if c == '/' && self.peek(1) == Some('*') {
                self.bump();
                self.bump();
                loop {
                    match self.bump() {
                        Some('*') if self.peek(0) == Some('/') => {
                            self.bump();
                            break;
                        }
                        Some(_) => {}
                        None => return Err(self.error(line, column, "unterminated comment")),
                    }
                }
                continue;
            }

            let kind = if c == '"' && self.peek(1) == Some('"') && self.peek(2) == Some('"') {
                self.text_block(line, column)?
            } else if c == '"' {
                self.bump();
                TokenKind::Str(self.quoted('"', line, column)?)
            } else if c == '\'' {
                self.bump();
                TokenKind::Char(self.quoted('\'', line, column)?)
            } else if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) {
                TokenKind::Number(self.number())
            } else if is_ident_start(c) {
                let mut ident = String::new();
                while let Some(c) = self.peek(0).filter(|c| is_ident_part(*c)) {
                    ident.push(c);
                    self.bump();
                }
                TokenKind::Ident(ident)
            } else {
                self.bump();
                TokenKind::Punct(c)
            };

            tokens.push(Token { kind, line, column });
        }

        Ok(tokens)
    }

    /// Body of a string or char literal after the opening quote.
    fn quoted(&mut self, close: char, line: u32, column: u32) -> Result<String, LexError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == close => return Ok(out),
                Some('\\') => out.push(self.escape(line, column)?),
                Some('\n') | None => {
                    return Err(self.error(line, column, "unterminated literal"));
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn text_block(&mut self, line: u32, column: u32) -> Result<TokenKind, LexError> {
        for _ in 0..3 {
            self.bump();
        }
        // Content starts after the line terminator following the opening
        // delimiter.
        while let Some(c) = self.peek(0) {
            self.bump();
            if c == '\n' {
                break;
            }
        }

        let mut raw = String::new();
        loop {
            match self.peek(0) {
                None => return Err(self.error(line, column, "unterminated text block")),
                Some('"') if self.peek(1) == Some('"') && self.peek(2) == Some('"') => {
                    for _ in 0..3 {
                        self.bump();
                    }
                    break;
                }
                Some('\\') => {
                    self.bump();
                    if self.peek(0) == Some('\n') {
                        self.bump();
                    } else {
                        raw.push(self.escape(line, column)?);
                    }
                }
                Some(c) => {
                    raw.push(c);
                    self.bump();
                }
            }
        }

        Ok(TokenKind::Str(strip_indent(&raw)))
    }

    fn escape(&mut self, line: u32, column: u32) -> Result<char, LexError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error(line, column, "unterminated escape"))?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            's' => ' ',
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek(0).and_then(|d| d.to_digit(8)) {
                        Some(d) if value * 8 + d <= 0o377 => {
                            value = value * 8 + d;
                            self.bump();
                        }
                        _ => break,
                    }
                }
                char::from_u32(value).unwrap_or('\u{fffd}')
            }
            'u' => {
                while self.peek(0) == Some('u') {
                    self.bump();
                }
                let mut value = 0u32;
                for _ in 0..4 {
                    let d = self
                        .bump()
                        .and_then(|d| d.to_digit(16))
                        .ok_or_else(|| self.error(line, column, "invalid unicode escape"))?;
                    value = value * 16 + d;
                }
                char::from_u32(value).unwrap_or('\u{fffd}')
            }
            other => other,
        })
    }

    fn number(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            let exponent_sign = (c == '+' || c == '-')
                && text.ends_with(|e: char| matches!(e, 'e' | 'E' | 'p' | 'P'))
                && !text.starts_with("0x")
                && !text.starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        text
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Remove the indentation common to all non-blank lines of a text block.
fn strip_indent(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| skip_whitespace_chars(l, indent).trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop up to `count` leading whitespace characters.
fn skip_whitespace_chars(line: &str, count: usize) -> &str {
    let mut rest = line;
    for _ in 0..count {
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if c.is_whitespace() => rest = chars.as_str(),
            _ => break,
        }
    }
    rest
}

//! A token stream for declaration parsing.
//!
//! Only what the declaration parser needs is distinguished: identifiers (keywords included),
//! literals, and the separators that shape a declaration. Every other operator is a
//! single-character [`TokenKind::Op`]. `>>` and `>>>` are never joined, so nested type arguments close one
//! bracket at a time.

use crate::{ParseError, TextRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    Literal,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Comma,
    Semi,
    Dot,
    Ellipsis,
    At,
    Question,
    Amp,
    Eq,
    Op,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) range: TextRange,
    /// Text of a plain `/* ... */` comment directly preceding this token. Doc comments are not
    /// kept.
    pub(crate) comment: Option<TextRange>,
}

impl Token {
    pub(crate) fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.start as usize..self.range.end as usize]
    }
}

pub(crate) struct Lexer<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
    errors: Vec<ParseError>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            input: src.as_bytes(),
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Lex the whole input. The returned tokens always end with [`TokenKind::Eof`].
    pub(crate) fn tokenize(mut self) -> (Vec<Token>, Vec<ParseError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if eof {
                break;
            }
        }
        (tokens, self.errors)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.src.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn error(&mut self, message: impl Into<String>, start: usize) {
        self.errors.push(ParseError::new(message, TextRange::new(start, self.pos)));
    }

    /// Skip whitespace and comments, returning the last plain block comment seen.
    fn skip_trivia(&mut self) -> Option<TextRange> {
        let mut comment = None;
        loop {
            while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0C)) {
                self.pos += 1;
            }

            match (self.peek(), self.peek_at(1)) {
                (Some(b'/'), Some(b'/')) => {
                    while let Some(b) = self.peek() {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.pos;
                    let doc = self.peek_at(2) == Some(b'*') && self.peek_at(3) != Some(b'/');
                    self.pos += 2;
                    let mut closed = false;
                    while let Some(b) = self.peek() {
                        if b == b'*' && self.peek_at(1) == Some(b'/') {
                            self.pos += 2;
                            closed = true;
                            break;
                        }
                        self.pos += 1;
                    }
                    if !closed {
                        self.error("unterminated block comment", start);
                        return comment;
                    }
                    comment = (!doc).then(|| TextRange::new(start + 2, self.pos - 2));
                }
                _ => return comment,
            }
        }
    }

    fn next_token(&mut self) -> Token {
        let comment = self.skip_trivia();
        let start = self.pos;
        let Some(b) = self.peek() else {
            return Token {
                kind: TokenKind::Eof,
                range: TextRange::new(start, start),
                comment,
            };
        };

        let kind = match b {
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b'<' => self.single(TokenKind::Lt),
            b'>' => self.single(TokenKind::Gt),
            b',' => self.single(TokenKind::Comma),
            b';' => self.single(TokenKind::Semi),
            b'@' => self.single(TokenKind::At),
            b'?' => self.single(TokenKind::Question),
            b'&' => self.single(TokenKind::Amp),
            b'=' => self.single(TokenKind::Eq),
            b'.' if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') => {
                self.pos += 3;
                TokenKind::Ellipsis
            }
            b'.' if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => self.lex_number(),
            b'.' => self.single(TokenKind::Dot),
            b'"' => self.lex_string(),
            b'\'' => self.lex_quoted(b'\'', "character literal"),
            b if b.is_ascii_digit() => self.lex_number(),
            _ => match self.peek_char() {
                Some(ch) if is_ident_start(ch) => {
                    self.pos += ch.len_utf8();
                    while let Some(ch) = self.peek_char().filter(|ch| is_ident_part(*ch)) {
                        self.pos += ch.len_utf8();
                    }
                    TokenKind::Ident
                }
                Some(ch) => {
                    self.pos += ch.len_utf8();
                    TokenKind::Op
                }
                None => self.single(TokenKind::Op),
            },
        };

        Token {
            kind,
            range: TextRange::new(start, self.pos),
            comment,
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn lex_number(&mut self) -> TokenKind {
        let mut prev = 0u8;
        while let Some(b) = self.peek() {
            let exponent_sign = matches!(b, b'+' | b'-') && matches!(prev, b'e' | b'E' | b'p' | b'P');
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
                self.pos += 1;
                prev = b;
            } else {
                break;
            }
        }
        TokenKind::Literal
    }

    fn lex_string(&mut self) -> TokenKind {
        if self.peek_at(1) != Some(b'"') || self.peek_at(2) != Some(b'"') {
            return self.lex_quoted(b'"', "string literal");
        }
        let start = self.pos;
        self.pos += 3;
        while let Some(b) = self.peek() {
            match b {
                b'\\' => self.pos += 2,
                b'"' if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    self.pos += 3;
                    return TokenKind::Literal;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.input.len());
        self.error("unterminated text block", start);
        TokenKind::Literal
    }

    fn lex_quoted(&mut self, quote: u8, what: &str) -> TokenKind {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek() {
            match b {
                b'\\' if self.peek_at(1).is_some_and(|next| next != b'\n') => self.pos += 2,
                b'\n' => break,
                b if b == quote => {
                    self.pos += 1;
                    return TokenKind::Literal;
                }
                _ => self.pos += 1,
            }
        }
        self.error(format!("unterminated {what}"), start);
        TokenKind::Literal
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_ident::is_xid_start(ch)
}

fn is_ident_part(ch: char) -> bool {
    ch == '$' || unicode_ident::is_xid_continue(ch)
}

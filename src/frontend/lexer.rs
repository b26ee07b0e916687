//! Lexer for the C subset.
//!
//! Preprocessor lines (`#include ...`) are skipped like comments, so plain C
//! kernels can be fed in unchanged.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::location::{Span, SourceLocation};
use crate::utils::errors::{LexerError, LexerErrorKind};
use unicode_xid::UnicodeXID;
use std::iter::Peekable;
use std::str::Chars;

/// A lexer for tokenizing source code.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: usize,
    column: usize,
    token_start: SourceLocation,
    at_line_start: bool,
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            token_start: SourceLocation::start(),
            at_line_start: true,
            at_eof: false,
        }
    }

    /// The text being lexed.
    pub fn source(&self) -> &'a str {
        self.source
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.offset)
    }

    fn make_span(&self) -> Span {
        Span::from_locations(self.token_start, self.current_location())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
            if !c.is_whitespace() {
                self.at_line_start = false;
            }
        }
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_line(&mut self) {
        while self.peek().is_some() && self.peek() != Some('\n') {
            self.advance();
        }
    }

    /// Skip whitespace, comments and preprocessor lines.
    fn skip_trivia(&mut self) -> Result<(), LexerError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') if self.at_line_start => self.skip_line(),
                Some('/') if self.peek_next() == Some('/') => self.skip_line(),
                Some('/') if self.peek_next() == Some('*') => {
                    self.token_start = self.current_location();
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.make_error(
                                    "Unterminated block comment",
                                    LexerErrorKind::UnterminatedComment,
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        let span = self.make_span();
        let lexeme = self.source[span.start_offset..span.end_offset].to_string();
        Token::new(kind, span, lexeme)
    }

    fn make_error(&self, message: &str, kind: LexerErrorKind) -> LexerError {
        LexerError {
            message: message.to_string(),
            span: self.make_span(),
            kind,
        }
    }

    fn scan_number(&mut self) -> Result<Token, LexerError> {
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            is_float = true;
            self.advance();
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
        }

        if self.peek() == Some('e') || self.peek() == Some('E') {
            is_float = true;
            self.advance();
            if self.peek() == Some('+') || self.peek() == Some('-') {
                self.advance();
            }
            if !self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                return Err(self.make_error(
                    "Invalid floating-point exponent",
                    LexerErrorKind::InvalidNumber,
                ));
            }
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
        }

        let token = if is_float {
            self.make_token(TokenKind::Float)
        } else {
            self.make_token(TokenKind::Integer)
        };
        // Integer and float suffixes (`10u`, `1.0f`) carry no meaning here.
        while matches!(self.peek(), Some('u' | 'U' | 'l' | 'L' | 'f' | 'F')) {
            self.advance();
        }
        Ok(token)
    }

    fn scan_identifier(&mut self) -> Token {
        while self.peek().map(|c| c.is_xid_continue() || c == '_').unwrap_or(false) {
            self.advance();
        }

        let span = self.make_span();
        let lexeme = &self.source[span.start_offset..span.end_offset];
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, span, lexeme.to_string())
    }

    /// Pick `long_kind` if the next character is `next`, else `short_kind`.
    fn one_or_two(&mut self, next: char, long_kind: TokenKind, short_kind: TokenKind) -> Token {
        if self.match_char(next) {
            self.make_token(long_kind)
        } else {
            self.make_token(short_kind)
        }
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_trivia()?;
        self.token_start = self.current_location();

        let c = match self.advance() {
            Some(c) => c,
            None => {
                self.at_eof = true;
                return Ok(self.make_token(TokenKind::Eof));
            }
        };

        match c {
            '(' => Ok(self.make_token(TokenKind::LeftParen)),
            ')' => Ok(self.make_token(TokenKind::RightParen)),
            '[' => Ok(self.make_token(TokenKind::LeftBracket)),
            ']' => Ok(self.make_token(TokenKind::RightBracket)),
            '{' => Ok(self.make_token(TokenKind::LeftBrace)),
            '}' => Ok(self.make_token(TokenKind::RightBrace)),
            ',' => Ok(self.make_token(TokenKind::Comma)),
            ';' => Ok(self.make_token(TokenKind::Semicolon)),
            ':' => Ok(self.make_token(TokenKind::Colon)),
            '?' => Ok(self.make_token(TokenKind::Question)),

            '+' => {
                if self.match_char('+') {
                    Ok(self.make_token(TokenKind::PlusPlus))
                } else {
                    Ok(self.one_or_two('=', TokenKind::PlusEqual, TokenKind::Plus))
                }
            }
            '-' => {
                if self.match_char('-') {
                    Ok(self.make_token(TokenKind::MinusMinus))
                } else {
                    Ok(self.one_or_two('=', TokenKind::MinusEqual, TokenKind::Minus))
                }
            }
            '*' => Ok(self.one_or_two('=', TokenKind::StarEqual, TokenKind::Star)),
            '/' => Ok(self.one_or_two('=', TokenKind::SlashEqual, TokenKind::Slash)),
            '%' => Ok(self.one_or_two('=', TokenKind::PercentEqual, TokenKind::Percent)),
            '=' => Ok(self.one_or_two('=', TokenKind::EqualEqual, TokenKind::Equal)),
            '!' => Ok(self.one_or_two('=', TokenKind::BangEqual, TokenKind::Bang)),
            '<' => Ok(self.one_or_two('=', TokenKind::LessEqual, TokenKind::Less)),
            '>' => Ok(self.one_or_two('=', TokenKind::GreaterEqual, TokenKind::Greater)),
            '&' => {
                if self.match_char('&') {
                    Ok(self.make_token(TokenKind::AmpAmp))
                } else {
                    Err(self.make_error(
                        "Expected '&&', found single '&'",
                        LexerErrorKind::UnexpectedChar,
                    ))
                }
            }
            '|' => {
                if self.match_char('|') {
                    Ok(self.make_token(TokenKind::PipePipe))
                } else {
                    Err(self.make_error(
                        "Expected '||', found single '|'",
                        LexerErrorKind::UnexpectedChar,
                    ))
                }
            }

            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_xid_start() || c == '_' => Ok(self.scan_identifier()),

            _ => Err(self.make_error(
                &format!("Unexpected character: '{}'", c),
                LexerErrorKind::UnexpectedChar,
            )),
        }
    }

    /// Check if we've reached EOF.
    pub fn is_at_end(&self) -> bool {
        self.at_eof
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(token_kinds(""), vec![TokenKind::Eof]);
        assert_eq!(token_kinds("   \t\n\r\n   "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_for_header() {
        let kinds = token_kinds("for (int i = 0; i < n; i++)");
        assert_eq!(kinds, vec![
            TokenKind::For,
            TokenKind::LeftParen,
            TokenKind::Int,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Integer,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Less,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::PlusPlus,
            TokenKind::RightParen,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_compound_operators() {
        let kinds = token_kinds("+= -= *= /= %= ++ -- == != <= >= && ||");
        assert_eq!(kinds, vec![
            TokenKind::PlusEqual,
            TokenKind::MinusEqual,
            TokenKind::StarEqual,
            TokenKind::SlashEqual,
            TokenKind::PercentEqual,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::EqualEqual,
            TokenKind::BangEqual,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("123 45.67 1e10 2.0f 10u");
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[1].kind, TokenKind::Float);
        assert_eq!(tokens[2].kind, TokenKind::Float);
        assert_eq!(tokens[3].kind, TokenKind::Float);
        assert_eq!(tokens[3].lexeme, "2.0");
        assert_eq!(tokens[4].kind, TokenKind::Integer);
        assert_eq!(tokens[4].lexeme, "10");
    }

    #[test]
    fn test_comments_and_preprocessor() {
        let tokens = lex("#include <stdio.h>\nfoo // comment\n/* block */ bar");
        assert_eq!(tokens[0].lexeme, "foo");
        assert_eq!(tokens[1].lexeme, "bar");
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Lexer::new("a /* never closed").tokenize().unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_location_tracking() {
        let tokens = lex("foo\n  bar");
        assert_eq!(tokens[0].span.start_line, 1);
        assert_eq!(tokens[1].span.start_line, 2);
        assert_eq!(tokens[1].span.start_column, 3);
    }

    #[test]
    fn test_single_ampersand_is_error() {
        let err = Lexer::new("a & b").tokenize().unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::UnexpectedChar);
    }
}

//! Token types for the C subset.

use crate::utils::location::Span;
use std::fmt;

/// A token in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source span
    pub span: Span,
    /// The lexeme (raw text)
    pub lexeme: String,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, lexeme: String) -> Self {
        Self { kind, span, lexeme }
    }

    /// Check if this is an EOF token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.lexeme)
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Integer,
    Float,

    Identifier,

    // Statement keywords
    For,
    While,
    Do,
    If,
    Else,
    Return,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Goto,

    // Type keywords
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Float32,
    Double,
    Unsigned,
    Signed,
    Const,

    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,

    // Comparison operators
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Assignment operators
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,

    // Logical operators
    AmpAmp,
    PipePipe,
    Bang,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Colon,
    Question,

    Eof,
}

impl TokenKind {
    /// Check if this is a keyword.
    pub fn is_keyword(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            For | While | Do | If | Else | Return | Switch | Case | Default | Break |
            Continue | Goto
        ) || self.is_type_keyword()
    }

    /// Check if this keyword can start a type.
    pub fn is_type_keyword(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Void | Bool | Char | Short | Int | Long | Float32 | Double | Unsigned | Signed | Const
        )
    }

    /// Check if this is a comparison operator.
    pub fn is_comparison(&self) -> bool {
        use TokenKind::*;
        matches!(self, EqualEqual | BangEqual | Less | LessEqual | Greater | GreaterEqual)
    }

    /// Check if this is an assignment operator.
    pub fn is_assignment(&self) -> bool {
        use TokenKind::*;
        matches!(self, Equal | PlusEqual | MinusEqual | StarEqual | SlashEqual | PercentEqual)
    }

    /// Get the keyword for a string, if it is a keyword.
    pub fn keyword(s: &str) -> Option<TokenKind> {
        match s {
            "for" => Some(TokenKind::For),
            "while" => Some(TokenKind::While),
            "do" => Some(TokenKind::Do),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "return" => Some(TokenKind::Return),
            "switch" => Some(TokenKind::Switch),
            "case" => Some(TokenKind::Case),
            "default" => Some(TokenKind::Default),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "goto" => Some(TokenKind::Goto),
            "void" => Some(TokenKind::Void),
            "bool" | "_Bool" => Some(TokenKind::Bool),
            "char" => Some(TokenKind::Char),
            "short" => Some(TokenKind::Short),
            "int" => Some(TokenKind::Int),
            "long" => Some(TokenKind::Long),
            "float" => Some(TokenKind::Float32),
            "double" => Some(TokenKind::Double),
            "unsigned" => Some(TokenKind::Unsigned),
            "signed" => Some(TokenKind::Signed),
            "const" => Some(TokenKind::Const),
            _ => None,
        }
    }

    /// Get a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Integer => "integer",
            Float => "float literal",
            Identifier => "identifier",
            For => "for",
            While => "while",
            Do => "do",
            If => "if",
            Else => "else",
            Return => "return",
            Switch => "switch",
            Case => "case",
            Default => "default",
            Break => "break",
            Continue => "continue",
            Goto => "goto",
            Void => "void",
            Bool => "bool",
            Char => "char",
            Short => "short",
            Int => "int",
            Long => "long",
            Float32 => "float",
            Double => "double",
            Unsigned => "unsigned",
            Signed => "signed",
            Const => "const",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            PlusPlus => "++",
            MinusMinus => "--",
            EqualEqual => "==",
            BangEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Equal => "=",
            PlusEqual => "+=",
            MinusEqual => "-=",
            StarEqual => "*=",
            SlashEqual => "/=",
            PercentEqual => "%=",
            AmpAmp => "&&",
            PipePipe => "||",
            Bang => "!",
            LeftParen => "(",
            RightParen => ")",
            LeftBracket => "[",
            RightBracket => "]",
            LeftBrace => "{",
            RightBrace => "}",
            Comma => ",",
            Semicolon => ";",
            Colon => ":",
            Question => "?",
            Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword("for"), Some(TokenKind::For));
        assert_eq!(TokenKind::keyword("double"), Some(TokenKind::Double));
        assert_eq!(TokenKind::keyword("foobar"), None);
    }

    #[test]
    fn test_type_keywords() {
        assert!(TokenKind::Unsigned.is_type_keyword());
        assert!(TokenKind::Const.is_keyword());
        assert!(!TokenKind::For.is_type_keyword());
        assert!(!TokenKind::Plus.is_keyword());
    }

    #[test]
    fn test_operator_classes() {
        assert!(TokenKind::LessEqual.is_comparison());
        assert!(TokenKind::PercentEqual.is_assignment());
        assert!(!TokenKind::PlusPlus.is_assignment());
    }
}

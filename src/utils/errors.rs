//! Error types for polyhedral model extraction.
//!
//! Errors are organized by the phase that produces them. Everything the
//! builder rejects is fatal: a [`BuildError`] aborts the whole build and no
//! partial model is returned.

use thiserror::Error;
use crate::utils::location::Span;
use std::fmt;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum PolyExtractError {
    /// Error during lexing/tokenization
    #[error("Lexer error: {0}")]
    Lexer(#[from] LexerError),

    /// Error during parsing
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error while building a computation
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Any other failure, such as a missing function
    #[error("{0}")]
    Other(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PolyExtractError {
    /// Recover the typed error at the bottom of an `anyhow` chain.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let err = match err.downcast::<BuildError>() {
            Ok(e) => return Self::Build(e),
            Err(err) => err,
        };
        let err = match err.downcast::<ParseError>() {
            Ok(e) => return Self::Parse(e),
            Err(err) => err,
        };
        let err = match err.downcast::<LexerError>() {
            Ok(e) => return Self::Lexer(e),
            Err(err) => err,
        };
        match err.downcast::<std::io::Error>() {
            Ok(e) => Self::Io(e),
            Err(err) => Self::Other(format!("{:#}", err)),
        }
    }

    /// Whether this is a bug in the builder rather than a problem with its input.
    pub fn is_internal(&self) -> bool {
        matches!(self, PolyExtractError::Build(e) if e.is_internal())
    }
}

/// Error during lexical analysis.
#[derive(Error, Debug, Clone)]
pub struct LexerError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of lexer error
    pub kind: LexerErrorKind,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerErrorKind {
    /// Unexpected character
    UnexpectedChar,
    /// Invalid number literal
    InvalidNumber,
    /// Unterminated block comment
    UnterminatedComment,
}

/// Error during parsing.
#[derive(Error, Debug, Clone)]
pub struct ParseError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of parse error
    pub kind: ParseErrorKind,
    /// What was found
    pub found: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)?;
        if let Some(ref found) = self.found {
            write!(f, " (found: {})", found)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected token
    UnexpectedToken,
    /// Expected an expression
    ExpectedExpression,
    /// Expected a type
    ExpectedType,
    /// Expected an identifier
    ExpectedIdentifier,
    /// Unexpected end of file
    UnexpectedEof,
}

/// Which part of a `for` header failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopHeaderPart {
    /// The init clause
    Initializer,
    /// The condition clause
    Condition,
    /// The increment clause
    Increment,
}

impl fmt::Display for LoopHeaderPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopHeaderPart::Initializer => write!(f, "initializer"),
            LoopHeaderPart::Condition => write!(f, "condition"),
            LoopHeaderPart::Increment => write!(f, "increment"),
        }
    }
}

/// The kind of a build error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildErrorKind {
    /// A statement kind outside the affine control subset
    UnsupportedConstruct,
    /// A `for` header that is not a unit-stride counted loop
    MalformedLoopHeader(LoopHeaderPart),
    /// An `if` predicate that is not a single comparison
    MalformedBranchCondition,
    /// A write to a data space that is invariant in an enclosing scope
    InvariantViolation,
    /// The finished model is inconsistent
    IncompleteModel,
}

/// Who is at fault for a build error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The analyzed code is outside the supported subset.
    Input,
    /// The builder produced an inconsistent model; this is a bug.
    Internal,
}

impl BuildErrorKind {
    /// Severity of this kind of error.
    pub fn severity(&self) -> Severity {
        match self {
            BuildErrorKind::IncompleteModel => Severity::Internal,
            _ => Severity::Input,
        }
    }
}

/// Error while building a computation from a statement tree.
#[derive(Error, Debug, Clone)]
pub struct BuildError {
    /// The kind of build error
    pub kind: BuildErrorKind,
    /// Human-readable reason
    pub message: String,
    /// Location of the offending construct
    pub span: Span,
    /// Rendering of the offending construct
    pub source_text: String,
}

impl BuildError {
    /// Create a new build error.
    pub fn new(
        kind: BuildErrorKind,
        message: impl Into<String>,
        span: Span,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            source_text: source_text.into(),
        }
    }

    /// An inconsistency inside the builder itself.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(BuildErrorKind::IncompleteModel, message, Span::dummy(), "")
    }

    /// Severity of this error.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Whether this error indicates a bug in the builder.
    pub fn is_internal(&self) -> bool {
        self.severity() == Severity::Internal
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)?;
        if !self.source_text.is_empty() {
            write!(f, " in `{}`", self.source_text)?;
        }
        Ok(())
    }
}

/// Result type using BuildError.
pub type BuildResult<T> = Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "Expected ';'".to_string(),
            span: Span::new(1, 5, 1, 10),
            kind: ParseErrorKind::UnexpectedToken,
            found: Some("}".to_string()),
        };
        let s = err.to_string();
        assert!(s.contains("Expected ';'"));
        assert!(s.contains("found: }"));
    }

    #[test]
    fn test_build_error_display() {
        let err = BuildError::new(
            BuildErrorKind::MalformedLoopHeader(LoopHeaderPart::Increment),
            "Invalid increment in for loop -- must increase iterator by 1",
            Span::new(3, 5, 3, 30),
            "for (int i = 0; i < 5; i += 2)",
        );
        let s = err.to_string();
        assert!(s.starts_with("Invalid increment in for loop"));
        assert!(s.contains("3:5-30"));
        assert!(s.contains("i += 2"));
    }

    #[test]
    fn test_from_anyhow_keeps_kind() {
        let build = BuildError::new(BuildErrorKind::InvariantViolation, "bad", Span::dummy(), "");
        let err = anyhow::Error::new(build).context("Failed to build computation for 'f'");
        let recovered = PolyExtractError::from_anyhow(err);
        assert!(matches!(recovered, PolyExtractError::Build(ref e) if e.kind == BuildErrorKind::InvariantViolation));
        assert!(!recovered.is_internal());

        let internal = PolyExtractError::from_anyhow(anyhow::Error::new(BuildError::internal("oops")));
        assert!(internal.is_internal());

        let other = PolyExtractError::from_anyhow(anyhow::anyhow!("something else"));
        assert!(matches!(other, PolyExtractError::Other(ref m) if m == "something else"));
    }

    #[test]
    fn test_severity() {
        assert_eq!(BuildErrorKind::UnsupportedConstruct.severity(), Severity::Input);
        assert_eq!(BuildErrorKind::InvariantViolation.severity(), Severity::Input);
        assert_eq!(BuildErrorKind::IncompleteModel.severity(), Severity::Internal);
        let err = BuildError::new(BuildErrorKind::IncompleteModel, "bad", Span::dummy(), "");
        assert!(err.is_internal());
    }
}

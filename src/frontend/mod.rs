//! Frontend: Lexer, Parser, and statement tree for C kernels.
//!
//! This module turns C source into the statement tree that the
//! computation builder walks.
//!
//! ## Input Overview
//!
//! Any C function whose body is an affine loop nest:
//!
//! ```text
//! void forward_solve(int n, double l[n][n], double x[n], double b[n]) {
//!     for (int i = 0; i < n; i++)
//!         x[i] = b[i];
//!     for (int j = 0; j < n; j++) {
//!         x[j] = x[j] / l[j][j];
//!         for (int i = j + 1; i < n; i++)
//!             if (l[i][j] > 0)
//!                 x[i] = x[i] - l[i][j] * x[j];
//!     }
//! }
//! ```
//!
//! The parser accepts more than the builder does: `while`, `switch` and
//! friends parse fine and are rejected later with a located error.

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;

// Re-exports
pub use lexer::Lexer;
pub use parser::Parser;
pub use ast::*;
pub use token::{Token, TokenKind};
pub use crate::utils::errors::ParseError;

use anyhow::Result;

/// Parse source code into a statement tree.
pub fn parse(source: &str) -> Result<ast::Program> {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer)?;
    parser.parse_program()
}

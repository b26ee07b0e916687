//! Utility modules for polyhedral model extraction.
//!
//! This module contains common utilities used throughout the codebase:
//! - Error types
//! - Source location tracking
//! - Printing of computations

pub mod errors;
pub mod location;
pub mod poly_print;

// Re-exports
pub use errors::*;
pub use location::{SourceLocation, Span};
pub use poly_print::{computations_to_json, print_computation, print_computations, PolyPrinter};

//! Polyhedral model building blocks.
//!
//! This module provides the pieces a statement's model is assembled from:
//! - Affine expressions and relational operators
//! - Constraints and the scoped constraint stack (iteration spaces)
//! - Schedule vectors (execution order)
//! - Data access recording (read/write relations)

pub mod expr;
pub mod constraint;
pub mod schedule;
pub mod access;

pub use expr::{AffineExpr, RelKind};
pub use constraint::{Constraint, ConstraintStack, IterationSpace};
pub use schedule::{ScheduleEntry, ScheduleVector};
pub use access::{AccessRecorder, DataAccess, IndexExpr, ScalarPolicy};

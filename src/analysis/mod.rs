//! Model extraction.
//!
//! The builder walks a function's statement tree with a scoped
//! [`StatementContext`], validating loop headers and branch conditions as
//! it descends, and emits one statement record per leaf.

pub mod fold;
pub mod header;
pub mod context;
pub mod builder;

pub use fold::ConstFolder;
pub use header::{HeaderValidator, LoopHeader};
pub use context::{ContextSnapshot, StatementContext};
pub use builder::{BuilderConfig, ComputationBuilder, ConditionDeclPolicy, ElseBranchPolicy};

use crate::frontend::ast::Program;
use crate::ir::Computation;
use crate::utils::errors::BuildResult;

/// Build one computation per function of a program.
pub fn build_computations(program: &Program, config: &BuilderConfig) -> BuildResult<Vec<Computation>> {
    ComputationBuilder::new(config.clone()).build_program(program)
}

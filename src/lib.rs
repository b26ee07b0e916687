//! # polyextract - Polyhedral model extraction for affine loop nests
//!
//! Walks the statement tree of a C function and builds, for every leaf
//! statement:
//! - its iteration space (`{[i,j]: 0 <= i and i < n and ...}`)
//! - its execution schedule (`{[i,j]->[0,i,0,j,0]}`)
//! - its read and write access relations (`{[i,j]->[i,j]}`)
//!
//! ## Architecture
//!
//! ```text
//! Source → Frontend → Statement tree → ComputationBuilder → Computation → Text / JSON
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use polyextract::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let source = r#"
//!     void matrix_add(int a, int b, int x[a][b], int y[a][b], int sum[a][b]) {
//!         for (int i = 0; i < a; i++)
//!             for (int j = 0; j < b; j++)
//!                 sum[i][j] = x[i][j] + y[i][j];
//!     }
//! "#;
//!
//! let computations = polyextract::build_computations(source, &BuilderConfig::default())?;
//! println!("{}", print_computations(&computations));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frontend;
pub mod ir;
pub mod polyhedral;
pub mod analysis;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::frontend::{parse, ParseError};
    pub use crate::frontend::ast::*;
    pub use crate::ir::*;
    pub use crate::polyhedral::{
        AffineExpr, Constraint, IterationSpace, RelKind, ScalarPolicy, ScheduleEntry, ScheduleVector,
    };
    pub use crate::analysis::{
        BuilderConfig, ComputationBuilder, ConditionDeclPolicy, ElseBranchPolicy,
    };
    pub use crate::utils::errors::*;
    pub use crate::utils::poly_print::{computations_to_json, print_computation, print_computations};
}

use anyhow::{Context, Result};

/// Main entry point for parsing source code.
pub fn parse(source: &str) -> Result<frontend::ast::Program> {
    frontend::parse(source)
}

/// Parse source code and build one computation per function definition.
pub fn build_computations(
    source: &str,
    config: &analysis::BuilderConfig,
) -> Result<Vec<ir::Computation>> {
    let program = parse(source)?;
    let builder = analysis::ComputationBuilder::new(config.clone());
    program
        .functions
        .iter()
        .map(|function| {
            builder
                .build(function)
                .with_context(|| format!("Failed to build computation for '{}'", function.name))
        })
        .collect()
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Output model of the builder.

pub mod computation;

pub use computation::{AccessRelation, Computation, ExecutionSchedule, StatementRecord, StmtId};

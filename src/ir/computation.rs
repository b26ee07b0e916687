//! The polyhedral model of one function.
//!
//! A `Computation` is the builder's only output. It is immutable once
//! returned and every part renders to the textual set/relation notation:
//! - iteration spaces: `{[i,j]: 0 <= i and i < n and ...}`
//! - schedules: `{[i,j]->[0,i,0,j,0]}`
//! - accesses: `{[i,j]->[i,j]}`, or `{[k]->[_r0]: _r0 = col(k)}` when a
//!   subscript reads data

use crate::polyhedral::constraint::write_tuple;
use crate::polyhedral::{DataAccess, IndexExpr, IterationSpace, ScheduleVector};
use crate::utils::location::Span;
use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;
use std::fmt;

/// Position of a statement within its computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StmtId(pub usize);

impl StmtId {
    /// Id of the leaf statement at position `id`.
    pub fn new(id: usize) -> Self { Self(id) }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A map from a statement's iteration vector to the elements it touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRelation {
    /// Data space name
    pub space: String,
    /// Domain of the relation
    pub iterators: Vec<String>,
    /// Range of the relation; empty for a scalar
    pub indices: Vec<IndexExpr>,
}

impl AccessRelation {
    /// Relation of one recorded access at the given loop depth.
    pub fn from_access(access: DataAccess, iterators: &[String]) -> Self {
        Self {
            space: access.space,
            iterators: iterators.to_vec(),
            indices: access.indices,
        }
    }

    /// Number of subscripts.
    pub fn arity(&self) -> usize {
        self.indices.len()
    }

    /// Check if any subscript goes through a replacement variable.
    pub fn is_indirect(&self) -> bool {
        self.indices.iter().any(|idx| matches!(idx, IndexExpr::Indirect { .. }))
    }
}

impl fmt::Display for AccessRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        write_tuple(f, &self.iterators)?;
        write!(f, "->[")?;
        for (n, idx) in self.indices.iter().enumerate() {
            if n > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", idx)?;
        }
        write!(f, "]")?;

        let bindings: Vec<_> = self
            .indices
            .iter()
            .filter_map(|idx| match idx {
                IndexExpr::Indirect { var, value } => Some(format!("{} = {}", var, value)),
                IndexExpr::Affine(_) => None,
            })
            .collect();
        if !bindings.is_empty() {
            write!(f, ": {}", bindings.join(" and "))?;
        }
        write!(f, "}}")
    }
}

/// Execution order of a statement's instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSchedule {
    /// Domain of the schedule
    pub iterators: Vec<String>,
    /// Timestamp of each instance
    pub schedule: ScheduleVector,
}

impl ExecutionSchedule {
    /// Number of schedule dimensions.
    pub fn dimension(&self) -> usize {
        self.schedule.dimension()
    }
}

impl fmt::Display for ExecutionSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        write_tuple(f, &self.iterators)?;
        write!(f, "->{}}}", self.schedule)
    }
}

/// The model of one leaf statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    /// Index in program order
    pub id: StmtId,
    /// The statement as written
    pub source: String,
    /// Source location
    pub span: Span,
    /// When the statement executes
    pub iteration_space: IterationSpace,
    /// In which order its instances execute
    pub execution_schedule: ExecutionSchedule,
    /// Read relations, in recording order
    pub reads: Vec<AccessRelation>,
    /// Write relations, in recording order
    pub writes: Vec<AccessRelation>,
}

impl StatementRecord {
    /// Number of enclosing loops.
    pub fn depth(&self) -> usize {
        self.iteration_space.depth()
    }

    /// All relations, reads first.
    pub fn accesses(&self) -> impl Iterator<Item = &AccessRelation> {
        self.reads.iter().chain(self.writes.iter())
    }

    /// Check if this statement writes the given data space.
    pub fn writes_to(&self, space: &str) -> bool {
        self.writes.iter().any(|a| a.space == space)
    }

    /// Check if this statement reads the given data space.
    pub fn reads_from(&self, space: &str) -> bool {
        self.reads.iter().any(|a| a.space == space)
    }
}

/// The polyhedral model of one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computation {
    /// Function name
    pub name: String,
    /// Leaf statements in program order
    pub statements: Vec<StatementRecord>,
    /// Every data space any statement accesses
    pub data_spaces: BTreeSet<String>,
}

impl Computation {
    /// An empty computation for the named function.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statements: Vec::new(),
            data_spaces: BTreeSet::new(),
        }
    }

    /// Number of statements.
    pub fn num_stmts(&self) -> usize {
        self.statements.len()
    }

    /// Get a statement by ID.
    pub fn stmt(&self, id: StmtId) -> Option<&StatementRecord> {
        self.statements.iter().find(|s| s.id == id)
    }

    /// Common schedule dimension, or `None` for an empty computation.
    pub fn schedule_dimension(&self) -> Option<usize> {
        self.statements.first().map(|s| s.execution_schedule.dimension())
    }

    /// Check that the model is internally consistent.
    ///
    /// Every accessed space must be listed and all schedules must have the
    /// same dimension.
    pub fn is_complete(&self) -> bool {
        let spaces_listed = self
            .statements
            .iter()
            .flat_map(|s| s.accesses())
            .all(|a| self.data_spaces.contains(&a.space));
        let dims_equal = match self.schedule_dimension() {
            Some(dim) => self
                .statements
                .iter()
                .all(|s| s.execution_schedule.dimension() == dim),
            None => true,
        };
        spaces_listed && dims_equal
    }
}

//! Constraints and the scoped constraint stack.
//!
//! Each active loop contributes two constraints (lower bound and condition)
//! and one iterator; each active branch contributes one constraint. The
//! conjunction of everything on the stack is the iteration space of the
//! statement being visited.

use crate::polyhedral::expr::{AffineExpr, RelKind};
use crate::utils::errors::{BuildError, BuildResult};
use serde::{Serialize, Deserialize};
use std::fmt;

/// One conjunct: `lower op upper`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub lower: AffineExpr,
    pub upper: AffineExpr,
    pub op: RelKind,
}

impl Constraint {
    /// Create a new constraint.
    pub fn new(lower: AffineExpr, upper: AffineExpr, op: RelKind) -> Self {
        Self { lower, upper, op }
    }

    /// The constraint that holds exactly when this one does not.
    pub fn negated(&self) -> Self {
        Self {
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            op: self.op.negate(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lower, self.op, self.upper)
    }
}

/// Write `[i,j]`.
pub(crate) fn write_tuple(f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
    write!(f, "[{}]", names.join(","))
}

/// The set of iterator values for which a statement executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationSpace {
    /// Enclosing loop iterators, outermost first
    pub iterators: Vec<String>,
    /// Conjunction of loop bounds and branch predicates
    pub constraints: Vec<Constraint>,
}

impl IterationSpace {
    /// Number of enclosing loops.
    pub fn depth(&self) -> usize {
        self.iterators.len()
    }

    /// Check if the statement executes unconditionally, exactly once.
    pub fn is_single_point(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl fmt::Display for IterationSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            return write!(f, "{{[]}}");
        }
        write!(f, "{{")?;
        write_tuple(f, &self.iterators)?;
        write!(f, ": ")?;
        for (n, constraint) in self.constraints.iter().enumerate() {
            if n > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{}", constraint)?;
        }
        write!(f, "}}")
    }
}

/// Active iterators and constraints, pushed and popped with the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintStack {
    iterators: Vec<String>,
    constraints: Vec<Constraint>,
}

impl ConstraintStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a loop: `lower <= iterator`, then the loop condition.
    pub fn push_loop_bounds(&mut self, iterator: impl Into<String>, lower: AffineExpr, condition: Constraint) {
        let iterator = iterator.into();
        self.constraints.push(Constraint::new(lower, AffineExpr::new(iterator.clone()), RelKind::Le));
        self.constraints.push(condition);
        self.iterators.push(iterator);
    }

    /// Enter a branch.
    pub fn push_branch(&mut self, predicate: Constraint) {
        self.constraints.push(predicate);
    }

    /// Leave a loop.
    pub fn pop_loop(&mut self) -> BuildResult<()> {
        if self.iterators.is_empty() || self.constraints.len() < 2 {
            return Err(BuildError::internal("cannot pop a loop: no loop is active"));
        }
        self.iterators.pop();
        self.constraints.truncate(self.constraints.len() - 2);
        Ok(())
    }

    /// Leave a branch.
    pub fn pop_branch(&mut self) -> BuildResult<()> {
        if self.constraints.len() <= 2 * self.iterators.len() {
            return Err(BuildError::internal("cannot pop a branch: no branch is active"));
        }
        self.constraints.pop();
        Ok(())
    }

    /// Active iterators, outermost first.
    pub fn iterators(&self) -> &[String] {
        &self.iterators
    }

    /// Active constraints, in push order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Check if a name is an active loop iterator.
    pub fn is_iterator(&self, name: &str) -> bool {
        self.iterators.iter().any(|it| it == name)
    }

    /// Freeze the current state.
    pub fn render(&self) -> IterationSpace {
        IterationSpace {
            iterators: self.iterators.clone(),
            constraints: self.constraints.clone(),
        }
    }
}

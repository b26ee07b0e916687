//! The live state of a build.
//!
//! One `StatementContext` exists per build. Loops and branches push onto it
//! on entry and pop on exit, so after any fully walked subtree it is equal
//! to what it was before.

use crate::analysis::header::LoopHeader;
use crate::frontend::ast::{Expr, VarDecl};
use crate::polyhedral::{
    AccessRecorder, Constraint, ConstraintStack, DataAccess, IterationSpace, ScalarPolicy,
    ScheduleVector,
};
use crate::utils::errors::BuildResult;
use log::trace;
use std::collections::BTreeSet;

/// Everything known about one leaf statement at the moment it is visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    /// Conjunction of the enclosing loop bounds and branch predicates
    pub iteration_space: IterationSpace,
    /// Schedule at the statement, before zero padding
    pub schedule: ScheduleVector,
    /// Accesses of the statement, in recording order
    pub accesses: Vec<DataAccess>,
}

/// Scoped builder state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementContext {
    constraints: ConstraintStack,
    schedule: ScheduleVector,
    recorder: AccessRecorder,
}

impl StatementContext {
    /// A context at the top of a function body.
    pub fn new(scalars: ScalarPolicy) -> Self {
        Self {
            constraints: ConstraintStack::new(),
            schedule: ScheduleVector::new(),
            recorder: AccessRecorder::new(scalars),
        }
    }

    /// Move the schedule to the next sibling.
    pub fn advance(&mut self) {
        self.schedule.advance();
    }

    /// Enter a validated loop.
    ///
    /// Whatever the loop condition reads becomes invariant for the body.
    pub fn enter_loop(&mut self, header: &LoopHeader<'_>) -> BuildResult<()> {
        self.constraints.push_loop_bounds(
            header.iterator.clone(),
            header.lower.clone(),
            header.condition.clone(),
        );
        let invariants = self
            .recorder
            .spaces_read_by(header.condition_expr, self.constraints.iterators())?;
        trace!("loop {} invariants: {:?}", header.iterator, invariants);
        self.recorder.push_invariants(invariants);
        self.schedule.enter_loop(header.iterator.clone());
        Ok(())
    }

    /// Leave the innermost loop.
    pub fn exit_loop(&mut self) -> BuildResult<()> {
        self.schedule.exit_loop()?;
        self.recorder.pop_invariants()?;
        self.constraints.pop_loop()
    }

    /// Enter a branch guarded by `predicate`.
    pub fn enter_branch(&mut self, predicate: Constraint) {
        self.constraints.push_branch(predicate);
    }

    /// Leave the innermost branch.
    pub fn exit_branch(&mut self) -> BuildResult<()> {
        self.constraints.pop_branch()
    }

    /// Make a group of data spaces invariant for the rest of the build.
    pub fn declare_invariant(&mut self, group: Vec<String>) {
        self.recorder.push_invariants(group);
    }

    /// Record the accesses of an expression statement or returned value.
    pub fn record_expr(&mut self, expr: &Expr) -> BuildResult<()> {
        self.recorder.record_reads(expr, self.constraints.iterators())
    }

    /// Record the accesses of a declaration. Only initializers are read.
    pub fn record_declaration(&mut self, decls: &[VarDecl]) -> BuildResult<()> {
        for init in decls.iter().filter_map(|d| d.init.as_ref()) {
            self.recorder.record_reads(init, self.constraints.iterators())?;
        }
        Ok(())
    }

    /// Freeze the current statement and start the next one.
    pub fn snapshot(&mut self) -> ContextSnapshot {
        ContextSnapshot {
            iteration_space: self.constraints.render(),
            schedule: self.schedule.clone(),
            accesses: self.recorder.take_accesses(),
        }
    }

    /// Active loop iterators, outermost first.
    pub fn iterators(&self) -> &[String] {
        self.constraints.iterators()
    }

    /// Every data space accessed so far.
    pub fn data_spaces(&self) -> &BTreeSet<String> {
        self.recorder.data_spaces()
    }

    /// The in-progress schedule.
    pub fn schedule(&self) -> &ScheduleVector {
        &self.schedule
    }
}

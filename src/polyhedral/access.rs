//! Data access recording.
//!
//! The recorder scans the expressions of one leaf statement and lists every
//! data space it reads or writes, together with the subscript tuple used.
//! Subscripts that are not affine, such as `x[col[k]]` or `a[i / 2]`, are
//! bound to a fresh replacement variable instead (`_r0 = col(k)`).

use crate::frontend::ast::{Expr, ExprKind};
use crate::polyhedral::expr::AffineExpr;
use crate::utils::errors::{BuildError, BuildErrorKind, BuildResult};
use log::trace;
use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;
use std::fmt;

/// How bare scalar identifiers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScalarPolicy {
    /// A scalar is a zero-dimensional data space.
    #[default]
    Track,
    /// Only array subscripts are data accesses.
    Ignore,
}

/// One component of an access tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexExpr {
    /// An expression of the iterators and parameters
    Affine(AffineExpr),
    /// A replacement variable standing for a non-affine subscript
    Indirect {
        /// The replacement variable, `_rN`
        var: String,
        /// The subscript it stands for
        value: AffineExpr,
    },
}

impl IndexExpr {
    /// The subscript this component was built from.
    pub fn value(&self) -> &AffineExpr {
        match self {
            IndexExpr::Affine(expr) => expr,
            IndexExpr::Indirect { value, .. } => value,
        }
    }
}

impl fmt::Display for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexExpr::Affine(expr) => write!(f, "{}", expr),
            IndexExpr::Indirect { var, .. } => write!(f, "{}", var),
        }
    }
}

/// A read or write of one data space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAccess {
    /// Name of the data space
    pub space: String,
    /// Read (`true`) or write
    pub is_read: bool,
    /// Subscript tuple; empty for a scalar
    pub indices: Vec<IndexExpr>,
}

impl DataAccess {
    /// Check if this is a scalar access.
    pub fn is_scalar(&self) -> bool {
        self.indices.is_empty()
    }

    /// Check if both accesses touch the same element expression of the same space.
    pub fn same_target(&self, other: &DataAccess) -> bool {
        self.space == other.space
            && self.indices.len() == other.indices.len()
            && self.indices.iter().zip(&other.indices).all(|(a, b)| a.value() == b.value())
    }
}

/// Collects the accesses of the current leaf statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRecorder {
    scalars: ScalarPolicy,
    accesses: Vec<DataAccess>,
    data_spaces: BTreeSet<String>,
    invariants: Vec<Vec<String>>,
    next_replacement: usize,
}

impl AccessRecorder {
    /// Create a recorder.
    pub fn new(scalars: ScalarPolicy) -> Self {
        Self {
            scalars,
            ..Self::default()
        }
    }

    /// Declare a group of data spaces invariant until the matching pop.
    pub fn push_invariants(&mut self, group: Vec<String>) {
        self.invariants.push(group);
    }

    /// Drop the innermost invariant group.
    pub fn pop_invariants(&mut self) -> BuildResult<()> {
        self.invariants
            .pop()
            .map(|_| ())
            .ok_or_else(|| BuildError::internal("cannot pop invariants: none are active"))
    }

    /// Active invariant groups, outermost first.
    pub fn invariant_groups(&self) -> &[Vec<String>] {
        &self.invariants
    }

    /// Every data space accessed so far, across all statements.
    pub fn data_spaces(&self) -> &BTreeSet<String> {
        &self.data_spaces
    }

    /// Accesses of the current statement, in recording order.
    pub fn accesses(&self) -> &[DataAccess] {
        &self.accesses
    }

    /// Hand over the current statement's accesses and start a new statement.
    pub fn take_accesses(&mut self) -> Vec<DataAccess> {
        std::mem::take(&mut self.accesses)
    }

    /// Data spaces an expression reads, without recording anything.
    pub fn spaces_read_by(&self, expr: &Expr, iterators: &[String]) -> BuildResult<Vec<String>> {
        let mut scratch = AccessRecorder::new(self.scalars);
        scratch.record_reads(expr, iterators)?;
        Ok(scratch.data_spaces.into_iter().collect())
    }

    /// Record everything `expr` reads, in evaluation order.
    ///
    /// Assignments and `++`/`--` nested in `expr` also record their target
    /// as a write.
    pub fn record_reads(&mut self, expr: &Expr, iterators: &[String]) -> BuildResult<()> {
        match &expr.kind {
            ExprKind::IntLiteral(_) | ExprKind::FloatLiteral(_) => Ok(()),
            ExprKind::Variable(name) => {
                if self.tracks_scalar(name, iterators) {
                    self.add(name.clone(), true, &[]);
                }
                Ok(())
            }
            ExprKind::ArrayAccess { array, indices } => {
                self.add(space_name(array), true, indices);
                for idx in indices {
                    self.record_reads(idx, iterators)?;
                }
                Ok(())
            }
            ExprKind::Assign { op, target, value } => {
                self.record_write(target, iterators)?;
                if op.is_compound() {
                    self.record_reads(target, iterators)?;
                }
                self.record_reads(value, iterators)
            }
            ExprKind::Unary { op, operand } if op.is_inc_dec() => {
                self.record_write(operand, iterators)?;
                self.record_reads(operand, iterators)
            }
            ExprKind::Unary { operand, .. } => self.record_reads(operand, iterators),
            ExprKind::Binary { left, right, .. } => {
                self.record_reads(left, iterators)?;
                self.record_reads(right, iterators)
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    self.record_reads(arg, iterators)?;
                }
                Ok(())
            }
            ExprKind::Ternary { condition, then_expr, else_expr } => {
                self.record_reads(condition, iterators)?;
                self.record_reads(then_expr, iterators)?;
                self.record_reads(else_expr, iterators)
            }
            ExprKind::Grouped(inner) => self.record_reads(inner, iterators),
        }
    }

    /// Record an assignment target. Its subscripts are reads.
    pub fn record_write(&mut self, target: &Expr, iterators: &[String]) -> BuildResult<()> {
        let target = target.strip_parens();
        match &target.kind {
            ExprKind::Variable(name) => {
                if iterators.iter().any(|it| it == name) {
                    return Err(BuildError::new(
                        BuildErrorKind::InvariantViolation,
                        format!("Code may not modify loop iterator '{}'", name),
                        target.span,
                        target.to_string(),
                    ));
                }
                self.check_invariant(name, target)?;
                if self.tracks_scalar(name, iterators) {
                    self.add(name.clone(), false, &[]);
                }
                Ok(())
            }
            ExprKind::ArrayAccess { array, indices } => {
                let space = space_name(array);
                self.check_invariant(&space, target)?;
                self.add(space, false, indices);
                for idx in indices {
                    self.record_reads(idx, iterators)?;
                }
                Ok(())
            }
            _ => self.record_reads(target, iterators),
        }
    }

    fn tracks_scalar(&self, name: &str, iterators: &[String]) -> bool {
        self.scalars == ScalarPolicy::Track && !iterators.iter().any(|it| it == name)
    }

    fn check_invariant(&self, space: &str, target: &Expr) -> BuildResult<()> {
        if self.invariants.iter().any(|group| group.iter().any(|name| name == space)) {
            return Err(BuildError::new(
                BuildErrorKind::InvariantViolation,
                format!("Code may not modify loop-invariant data space '{}'", space),
                target.span,
                target.to_string(),
            ));
        }
        Ok(())
    }

    fn add(&mut self, space: String, is_read: bool, subscripts: &[Expr]) {
        self.data_spaces.insert(space.clone());

        let mut access = DataAccess {
            space,
            is_read,
            indices: subscripts
                .iter()
                .map(|sub| {
                    let value = AffineExpr::from_expr(sub);
                    if sub.is_affine() {
                        IndexExpr::Affine(value)
                    } else {
                        IndexExpr::Indirect { var: String::new(), value }
                    }
                })
                .collect(),
        };

        if is_read && self.accesses.iter().any(|a| a.is_read && a.same_target(&access)) {
            trace!("skipping repeated read of {}", access.space);
            return;
        }

        for idx in &mut access.indices {
            if let IndexExpr::Indirect { var, .. } = idx {
                *var = format!("_r{}", self.next_replacement);
                self.next_replacement += 1;
            }
        }

        trace!(
            "{} {}[{}]",
            if is_read { "read" } else { "write" },
            access.space,
            access.indices.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
        );
        self.accesses.push(access);
    }
}

/// Name of the space an array expression refers to.
fn space_name(array: &Expr) -> String {
    match array.as_variable() {
        Some(name) => name.to_string(),
        None => AffineExpr::from_expr(array).to_string(),
    }
}

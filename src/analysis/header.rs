//! Validation of loop headers and branch conditions.
//!
//! Only unit-stride counted loops and single-comparison branches have an
//! exact polyhedral form. Everything else is rejected here, before any
//! state is pushed.

use crate::analysis::fold::ConstFolder;
use crate::frontend::ast::{AssignOp, BinaryOp, Expr, ExprKind, ForInit, Stmt, StmtKind, VarDecl};
use crate::polyhedral::{AffineExpr, Constraint, RelKind};
use crate::utils::errors::{BuildError, BuildErrorKind, BuildResult, LoopHeaderPart};

/// A validated `for` header.
#[derive(Debug, Clone)]
pub struct LoopHeader<'a> {
    /// The loop iterator
    pub iterator: String,
    /// Initial value; the iteration space gets `lower <= iterator`
    pub lower: AffineExpr,
    /// The loop condition as a constraint
    pub condition: Constraint,
    /// The condition as written
    pub condition_expr: &'a Expr,
}

/// Checks loop headers and branch conditions.
#[derive(Debug, Clone)]
pub struct HeaderValidator<'f> {
    folder: &'f ConstFolder,
    allow_not_equal: bool,
}

impl<'f> HeaderValidator<'f> {
    /// Create a validator that folds increments with `folder`.
    pub fn new(folder: &'f ConstFolder, allow_not_equal: bool) -> Self {
        Self { folder, allow_not_equal }
    }

    /// Validate the header of a `for` statement.
    pub fn validate_loop<'a>(&self, stmt: &'a Stmt) -> BuildResult<LoopHeader<'a>> {
        let (init, condition, increment) = match &stmt.kind {
            StmtKind::For { init, condition, increment, .. } => (init, condition, increment),
            other => {
                return Err(BuildError::internal(format!(
                    "loop validation called on {}",
                    other.name()
                )));
            }
        };
        let fail = |part: LoopHeaderPart, reason: &str| {
            BuildError::new(
                BuildErrorKind::MalformedLoopHeader(part),
                format!("Invalid {} in for loop -- {}", part, reason),
                stmt.span,
                stmt.header_text(),
            )
        };

        let (iterator, lower) = match init {
            Some(ForInit::Expression(expr)) => match &expr.strip_parens().kind {
                ExprKind::Assign { op: AssignOp::Assign, target, value } => match target.as_variable() {
                    Some(name) => (name.to_string(), AffineExpr::from_expr(value)),
                    None => return Err(fail(LoopHeaderPart::Initializer, "must initialize iterator")),
                },
                _ => return Err(fail(LoopHeaderPart::Initializer, "must initialize iterator")),
            },
            Some(ForInit::Declaration(decls)) => match decls.as_slice() {
                [VarDecl { name, dimensions, init: Some(init), .. }] if dimensions.is_empty() => {
                    (name.clone(), AffineExpr::from_expr(init))
                }
                _ => {
                    return Err(fail(
                        LoopHeaderPart::Initializer,
                        "declarative initializer must declare a single variable",
                    ));
                }
            },
            None => return Err(fail(LoopHeaderPart::Initializer, "must initialize iterator")),
        };

        let condition_expr = match condition {
            Some(expr) => expr,
            None => return Err(fail(LoopHeaderPart::Condition, "must be a binary comparison")),
        };
        let constraint = match comparison(condition_expr, false) {
            Some(c) => c,
            None => return Err(fail(LoopHeaderPart::Condition, "must be a binary comparison")),
        };
        if constraint.op == RelKind::Ne && !self.allow_not_equal {
            return Err(fail(
                LoopHeaderPart::Condition,
                &format!("not-equal conditions are unsupported: {}", constraint),
            ));
        }

        let valid_increment = increment
            .as_ref()
            .map(|inc| self.is_unit_increment(inc, &iterator))
            .unwrap_or(false);
        if !valid_increment {
            return Err(fail(LoopHeaderPart::Increment, "must increase iterator by 1"));
        }

        Ok(LoopHeader {
            iterator,
            lower,
            condition: constraint,
            condition_expr,
        })
    }

    /// Validate an `if` condition and return its predicate.
    ///
    /// With `invert` the predicate of the else branch is returned instead.
    pub fn validate_branch(&self, stmt: &Stmt, invert: bool) -> BuildResult<Constraint> {
        let condition = match &stmt.kind {
            StmtKind::If { condition, .. } => condition,
            other => {
                return Err(BuildError::internal(format!(
                    "branch validation called on {}",
                    other.name()
                )));
            }
        };
        let fail = |message: String| {
            BuildError::new(
                BuildErrorKind::MalformedBranchCondition,
                message,
                stmt.span,
                stmt.header_text(),
            )
        };

        let constraint = comparison(condition, invert)
            .ok_or_else(|| fail("If statement condition must be a binary comparison".to_string()))?;
        if constraint.op == RelKind::Ne && !self.allow_not_equal {
            let message = if invert {
                format!("Not-equal conditions are unsupported: else branch of {}", constraint.negated())
            } else {
                format!("Not-equal conditions are unsupported: {}", constraint)
            };
            return Err(fail(message));
        }
        Ok(constraint)
    }

    /// `i++`, `++i`, `i += 1`, `i -= -1`, `i = i + 1` or `i = 1 + i`.
    fn is_unit_increment(&self, inc: &Expr, iterator: &str) -> bool {
        let is_iter = |e: &Expr| e.as_variable() == Some(iterator);
        match &inc.strip_parens().kind {
            ExprKind::Unary { op, operand } => op.is_increment() && is_iter(operand),
            ExprKind::Assign { op: AssignOp::AddAssign, target, value } => {
                is_iter(target) && self.folder.folds_to(value, 1)
            }
            ExprKind::Assign { op: AssignOp::SubAssign, target, value } => {
                is_iter(target) && self.folder.folds_to(value, -1)
            }
            ExprKind::Assign { op: AssignOp::Assign, target, value } if is_iter(target) => {
                match &value.strip_parens().kind {
                    ExprKind::Binary { op: BinaryOp::Add, left, right } => {
                        (is_iter(left) && self.folder.folds_to(right, 1))
                            || (is_iter(right) && self.folder.folds_to(left, 1))
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// `lhs op rhs` of a comparison, optionally negated.
fn comparison(expr: &Expr, invert: bool) -> Option<Constraint> {
    let (lhs, op, rhs) = expr.as_comparison()?;
    let rel = RelKind::from_binary_op(op)?;
    let rel = if invert { rel.negate() } else { rel };
    Some(Constraint::new(AffineExpr::from_expr(lhs), AffineExpr::from_expr(rhs), rel))
}

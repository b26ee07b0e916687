//! Compile-time evaluation of integer expressions.

use crate::frontend::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use std::collections::BTreeMap;

/// Evaluates constant integer expressions.
///
/// Handles literals, unary `-`/`+`, `+ - * / %`, parentheses and the named
/// constants it was created with. Anything else (variables, overflow,
/// division by zero) does not fold.
#[derive(Debug, Clone, Default)]
pub struct ConstFolder {
    constants: BTreeMap<String, i64>,
}

impl ConstFolder {
    /// A folder that knows no named constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// A folder that substitutes the given named constants.
    pub fn with_constants(constants: BTreeMap<String, i64>) -> Self {
        Self { constants }
    }

    /// Value of `expr`, if it is a compile-time constant.
    pub fn fold(&self, expr: &Expr) -> Option<i64> {
        match &expr.kind {
            ExprKind::IntLiteral(v) => Some(*v),
            ExprKind::Variable(name) => self.constants.get(name).copied(),
            ExprKind::Grouped(inner) => self.fold(inner),
            ExprKind::Unary { op: UnaryOp::Neg, operand } => self.fold(operand)?.checked_neg(),
            ExprKind::Unary { op: UnaryOp::Plus, operand } => self.fold(operand),
            ExprKind::Binary { op, left, right } => {
                let l = self.fold(left)?;
                let r = self.fold(right)?;
                match op {
                    BinaryOp::Add => l.checked_add(r),
                    BinaryOp::Sub => l.checked_sub(r),
                    BinaryOp::Mul => l.checked_mul(r),
                    BinaryOp::Div => l.checked_div(r),
                    BinaryOp::Mod => l.checked_rem(r),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Check if `expr` folds to exactly `value`.
    pub fn folds_to(&self, expr: &Expr, value: i64) -> bool {
        self.fold(expr) == Some(value)
    }
}

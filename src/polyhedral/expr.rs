//! Affine expressions as they appear in polyhedral formulas.
//!
//! Expressions are kept in the textual form a polyhedral library consumes.
//! Array reads are rewritten into uninterpreted-function form, so
//! `l[i][j] > 0` becomes `l(i,j) > 0`.

use crate::frontend::ast::{BinaryOp, Expr, ExprKind};
use serde::{Serialize, Deserialize};
use std::fmt;

/// An affine expression over iterator and parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AffineExpr {
    text: String,
}

impl AffineExpr {
    /// Wrap already-rendered text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Render an expression, turning array reads into call form.
    pub fn from_expr(expr: &Expr) -> Self {
        let mut text = String::new();
        render(expr, &mut text);
        Self { text }
    }

    /// The rendered text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for AffineExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for AffineExpr {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

fn render(expr: &Expr, out: &mut String) {
    match &expr.kind {
        ExprKind::IntLiteral(v) => out.push_str(&v.to_string()),
        ExprKind::FloatLiteral(v) => out.push_str(&format!("{:?}", v)),
        ExprKind::Variable(name) => out.push_str(name),
        ExprKind::ArrayAccess { array, indices } => {
            render(array, out);
            out.push('(');
            for (n, idx) in indices.iter().enumerate() {
                if n > 0 {
                    out.push(',');
                }
                render(idx, out);
            }
            out.push(')');
        }
        ExprKind::Binary { op, left, right } => {
            render(left, out);
            out.push_str(&format!(" {} ", op));
            render(right, out);
        }
        ExprKind::Unary { op, operand } => {
            if op.is_postfix() {
                render(operand, out);
                out.push_str(&op.to_string());
            } else {
                out.push_str(&op.to_string());
                render(operand, out);
            }
        }
        ExprKind::Assign { op, target, value } => {
            render(target, out);
            out.push_str(&format!(" {} ", op));
            render(value, out);
        }
        ExprKind::Call { function, args } => {
            out.push_str(function);
            out.push('(');
            for (n, arg) in args.iter().enumerate() {
                if n > 0 {
                    out.push_str(", ");
                }
                render(arg, out);
            }
            out.push(')');
        }
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            render(condition, out);
            out.push_str(" ? ");
            render(then_expr, out);
            out.push_str(" : ");
            render(else_expr, out);
        }
        ExprKind::Grouped(inner) => {
            out.push('(');
            render(inner, out);
            out.push(')');
        }
    }
}

/// Relational operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelKind {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl RelKind {
    /// The relation of a comparison operator, `None` for anything else.
    pub fn from_binary_op(op: BinaryOp) -> Option<Self> {
        match op {
            BinaryOp::Lt => Some(RelKind::Lt),
            BinaryOp::Le => Some(RelKind::Le),
            BinaryOp::Gt => Some(RelKind::Gt),
            BinaryOp::Ge => Some(RelKind::Ge),
            BinaryOp::Eq => Some(RelKind::Eq),
            BinaryOp::Ne => Some(RelKind::Ne),
            _ => None,
        }
    }

    /// Logical negation: `a < b` is false exactly when `a >= b`.
    pub fn negate(self) -> Self {
        match self {
            RelKind::Lt => RelKind::Ge,
            RelKind::Ge => RelKind::Lt,
            RelKind::Le => RelKind::Gt,
            RelKind::Gt => RelKind::Le,
            RelKind::Eq => RelKind::Ne,
            RelKind::Ne => RelKind::Eq,
        }
    }

    /// Operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            RelKind::Lt => "<",
            RelKind::Le => "<=",
            RelKind::Gt => ">",
            RelKind::Ge => ">=",
            RelKind::Eq => "=",
            RelKind::Ne => "!=",
        }
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_reads_use_call_form() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::index("l", vec![Expr::var("i"), Expr::var("j")]),
            Expr::int(1),
        );
        assert_eq!(AffineExpr::from_expr(&expr).as_str(), "l(i,j) + 1");
    }

    #[test]
    fn test_nested_array_reads() {
        let expr = Expr::index("x", vec![Expr::index("col", vec![Expr::var("k")])]);
        assert_eq!(AffineExpr::from_expr(&expr).to_string(), "x(col(k))");
    }

    #[test]
    fn test_plain_expression_matches_source() {
        let expr = Expr::binary(BinaryOp::Add, Expr::var("j"), Expr::int(1));
        assert_eq!(AffineExpr::from_expr(&expr).as_str(), "j + 1");
    }

    #[test]
    fn test_negate_is_involution() {
        for rel in [RelKind::Lt, RelKind::Le, RelKind::Gt, RelKind::Ge, RelKind::Eq, RelKind::Ne] {
            assert_eq!(rel.negate().negate(), rel);
            assert_ne!(rel.negate(), rel);
        }
        assert_eq!(RelKind::Lt.negate(), RelKind::Ge);
        assert_eq!(RelKind::Le.negate(), RelKind::Gt);
        assert_eq!(RelKind::Eq.negate(), RelKind::Ne);
    }

    #[test]
    fn test_from_binary_op() {
        assert_eq!(RelKind::from_binary_op(BinaryOp::Ge), Some(RelKind::Ge));
        assert_eq!(RelKind::from_binary_op(BinaryOp::Add), None);
    }
}

//! Statement tree consumed by the computation builder.
//!
//! The tree models the C subset that can appear in an affine loop nest:
//! blocks, declarations, expression statements, `for` loops and `if`/`else`.
//! The other C statement kinds are still representable so that the builder
//! can reject them with a precise error instead of failing to parse.
//!
//! Trees come either from [`crate::frontend::parse`] or from an external
//! front end that builds them directly; the shorthand constructors on
//! [`Expr`] and [`Stmt`] exist for the latter.

use crate::utils::location::Span;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A translation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Function definitions, in source order
    pub functions: Vec<Function>,
    /// Source span
    pub span: Span,
}

impl Program {
    /// Create a new empty program.
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            span: Span::dummy(),
        }
    }

    /// Find a function by name.
    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

/// A function definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Return type
    pub return_type: Type,
    /// Parameters
    pub params: Vec<Parameter>,
    /// Function body
    pub body: Block,
    /// Source span
    pub span: Span,
}

impl Function {
    /// Create a function with no parameters around the given body.
    pub fn new(name: impl Into<String>, body: Block) -> Self {
        Self {
            name: name.into(),
            return_type: Type::scalar(ScalarType::Void),
            params: Vec::new(),
            body,
            span: Span::dummy(),
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Element type
    pub ty: Type,
    /// Array dimensions; `None` for an unsized `[]`
    pub dimensions: Vec<Option<Expr>>,
    /// Source span
    pub span: Span,
}

impl Parameter {
    /// Check if this parameter is an array (or pointer).
    pub fn is_array(&self) -> bool {
        !self.dimensions.is_empty() || self.ty.pointer_depth > 0
    }

    /// Number of subscripts this parameter accepts.
    pub fn ndims(&self) -> usize {
        self.dimensions.len() + self.ty.pointer_depth
    }
}

/// A builtin scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Void => "void",
            ScalarType::Bool => "bool",
            ScalarType::Char => "char",
            ScalarType::Short => "short",
            ScalarType::Int => "int",
            ScalarType::Long => "long",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        };
        write!(f, "{}", name)
    }
}

/// A declared type: qualifiers, a scalar base and pointer depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    /// Base scalar type
    pub scalar: ScalarType,
    /// `unsigned` qualifier
    pub is_unsigned: bool,
    /// `const` qualifier
    pub is_const: bool,
    /// Number of `*`
    pub pointer_depth: usize,
}

impl Type {
    /// A plain scalar type.
    pub fn scalar(scalar: ScalarType) -> Self {
        Self {
            scalar,
            is_unsigned: false,
            is_const: false,
            pointer_depth: 0,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        if self.is_unsigned {
            write!(f, "unsigned ")?;
        }
        write!(f, "{}", self.scalar)?;
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// A braced sequence of statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Statements in the block
    pub statements: Vec<Stmt>,
    /// Source span
    pub span: Span,
}

impl Block {
    /// Create a block from statements.
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self {
            statements,
            span: Span::dummy(),
        }
    }
}

/// A statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    /// The kind of statement
    pub kind: StmtKind,
    /// Source span
    pub span: Span,
}

/// A single declarator: `double x[n] = init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    /// Declared name
    pub name: String,
    /// Declared type
    pub ty: Type,
    /// Array dimensions
    pub dimensions: Vec<Option<Expr>>,
    /// Initializer
    pub init: Option<Expr>,
    /// Source span
    pub span: Span,
}

impl VarDecl {
    /// An `int` declarator with an optional initializer.
    pub fn int(name: impl Into<String>, init: Option<Expr>) -> Self {
        Self {
            name: name.into(),
            ty: Type::scalar(ScalarType::Int),
            dimensions: Vec::new(),
            init,
            span: Span::dummy(),
        }
    }
}

/// The init clause of a `for` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ForInit {
    /// `for (int i = 0; ...)`
    Declaration(Vec<VarDecl>),
    /// `for (i = 0; ...)`
    Expression(Expr),
}

/// The kind of a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    /// `{ stmts }`
    Compound(Block),

    /// `int x = e, y;`
    Declaration(Vec<VarDecl>),

    /// `expr;`, including assignments
    Expression(Expr),

    /// `for (init; cond; inc) body`
    For {
        init: Option<ForInit>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },

    /// `if (init; cond) then else otherwise`
    If {
        init: Option<Box<Stmt>>,
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while (cond) body`
    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// `do body while (cond);`
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },

    /// `switch (cond) body`
    Switch {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// `name: body`
    Label {
        name: String,
        body: Box<Stmt>,
    },

    /// `[[attr]] body`
    Attributed {
        attributes: Vec<String>,
        body: Box<Stmt>,
    },

    /// `goto name;`
    Goto(String),

    /// `break;`
    Break,

    /// `continue;`
    Continue,

    /// `return expr;`
    Return(Option<Expr>),

    /// `;`
    Empty,
}

impl StmtKind {
    /// Short name of the statement kind, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Compound(_) => "CompoundStmt",
            StmtKind::Declaration(_) => "DeclStmt",
            StmtKind::Expression(expr) => match expr.strip_parens().kind {
                ExprKind::Call { .. } => "CallExpr",
                _ => "ExprStmt",
            },
            StmtKind::For { .. } => "ForStmt",
            StmtKind::If { .. } => "IfStmt",
            StmtKind::While { .. } => "WhileStmt",
            StmtKind::DoWhile { .. } => "DoStmt",
            StmtKind::Switch { .. } => "SwitchStmt",
            StmtKind::Label { .. } => "LabelStmt",
            StmtKind::Attributed { .. } => "AttributedStmt",
            StmtKind::Goto(_) => "GotoStmt",
            StmtKind::Break => "BreakStmt",
            StmtKind::Continue => "ContinueStmt",
            StmtKind::Return(_) => "ReturnStmt",
            StmtKind::Empty => "NullStmt",
        }
    }
}

impl Stmt {
    /// Create a statement with a dummy span.
    pub fn new(kind: StmtKind) -> Self {
        Self { kind, span: Span::dummy() }
    }

    /// `expr;`
    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expression(expr))
    }

    /// `{ stmts }`
    pub fn block(statements: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Compound(Block::new(statements)))
    }

    /// Single-declarator declaration.
    pub fn decl(decl: VarDecl) -> Self {
        Self::new(StmtKind::Declaration(vec![decl]))
    }

    /// `for (init; condition; increment) body`
    pub fn for_loop(init: ForInit, condition: Expr, increment: Expr, body: Stmt) -> Self {
        Self::new(StmtKind::For {
            init: Some(init),
            condition: Some(condition),
            increment: Some(increment),
            body: Box::new(body),
        })
    }

    /// `if (condition) then_branch else else_branch`
    pub fn if_else(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Self::new(StmtKind::If {
            init: None,
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    /// The header of a control statement, or the whole statement otherwise.
    pub fn header_text(&self) -> String {
        match &self.kind {
            StmtKind::For { init, condition, increment, .. } => {
                let init = match init {
                    Some(ForInit::Declaration(decls)) => render_decls(decls),
                    Some(ForInit::Expression(e)) => e.to_string(),
                    None => String::new(),
                };
                let condition = condition.as_ref().map(|c| c.to_string()).unwrap_or_default();
                let increment = increment.as_ref().map(|i| i.to_string()).unwrap_or_default();
                format!("for ({}; {}; {})", init, condition, increment)
            }
            StmtKind::If { condition, .. } => format!("if ({})", condition),
            StmtKind::While { condition, .. } => format!("while ({})", condition),
            StmtKind::DoWhile { condition, .. } => format!("do ... while ({})", condition),
            StmtKind::Switch { condition, .. } => format!("switch ({})", condition),
            StmtKind::Label { name, .. } => format!("{}:", name),
            StmtKind::Attributed { attributes, .. } => format!("[[{}]]", attributes.join(", ")),
            StmtKind::Compound(_) => "{ ... }".to_string(),
            _ => self.to_string(),
        }
    }
}

fn render_decls(decls: &[VarDecl]) -> String {
    let mut out = String::new();
    for (n, decl) in decls.iter().enumerate() {
        if n == 0 {
            out.push_str(&format!("{} ", decl.ty));
        } else {
            out.push_str(", ");
        }
        out.push_str(&decl.name);
        for dim in &decl.dimensions {
            match dim {
                Some(d) => out.push_str(&format!("[{}]", d)),
                None => out.push_str("[]"),
            }
        }
        if let Some(init) = &decl.init {
            out.push_str(&format!(" = {}", init));
        }
    }
    out
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Compound(block) => {
                write!(f, "{{")?;
                for stmt in &block.statements {
                    write!(f, " {}", stmt)?;
                }
                write!(f, " }}")
            }
            StmtKind::Declaration(decls) => write!(f, "{};", render_decls(decls)),
            StmtKind::Expression(expr) => write!(f, "{};", expr),
            StmtKind::For { body, .. }
            | StmtKind::While { body, .. }
            | StmtKind::Switch { body, .. }
            | StmtKind::Label { body, .. }
            | StmtKind::Attributed { body, .. } => write!(f, "{} {}", self.header_text(), body),
            StmtKind::If { then_branch, else_branch, .. } => {
                write!(f, "{} {}", self.header_text(), then_branch)?;
                if let Some(else_b) = else_branch {
                    write!(f, " else {}", else_b)?;
                }
                Ok(())
            }
            StmtKind::DoWhile { body, condition } => write!(f, "do {} while ({});", body, condition),
            StmtKind::Goto(label) => write!(f, "goto {};", label),
            StmtKind::Break => write!(f, "break;"),
            StmtKind::Continue => write!(f, "continue;"),
            StmtKind::Return(Some(value)) => write!(f, "return {};", value),
            StmtKind::Return(None) => write!(f, "return;"),
            StmtKind::Empty => write!(f, ";"),
        }
    }
}

/// An expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    /// The kind of expression
    pub kind: ExprKind,
    /// Source span
    pub span: Span,
}

/// The kind of an expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    /// Integer literal
    IntLiteral(i64),
    /// Floating-point literal
    FloatLiteral(f64),
    /// Variable reference
    Variable(String),
    /// Array access: `a[i][j]`
    ArrayAccess {
        array: Box<Expr>,
        indices: Vec<Expr>,
    },
    /// Binary operation: `left op right`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Prefix or postfix unary operation
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Assignment: `target op value`
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Function call: `func(args)`
    Call {
        function: String,
        args: Vec<Expr>,
    },
    /// Ternary conditional: `cond ? then : else`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// Parenthesized expression
    Grouped(Box<Expr>),
}

impl Expr {
    /// Create a new expression.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    fn synth(kind: ExprKind) -> Self {
        Self::new(kind, Span::dummy())
    }

    /// Integer literal.
    pub fn int(value: i64) -> Self {
        Self::synth(ExprKind::IntLiteral(value))
    }

    /// Variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Self::synth(ExprKind::Variable(name.into()))
    }

    /// `array[i0][i1]...`
    pub fn index(array: impl Into<String>, indices: Vec<Expr>) -> Self {
        Self::synth(ExprKind::ArrayAccess {
            array: Box::new(Self::var(array)),
            indices,
        })
    }

    /// `left op right`
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::synth(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Unary operation.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::synth(ExprKind::Unary { op, operand: Box::new(operand) })
    }

    /// `target op value`
    pub fn assign(op: AssignOp, target: Expr, value: Expr) -> Self {
        Self::synth(ExprKind::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// `function(args)`
    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::synth(ExprKind::Call { function: function.into(), args })
    }

    /// This expression with any enclosing parentheses removed.
    pub fn strip_parens(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Grouped(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    /// The name of a bare variable reference (parentheses ignored).
    pub fn as_variable(&self) -> Option<&str> {
        match &self.strip_parens().kind {
            ExprKind::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// The operands and operator of a binary comparison (parentheses ignored).
    pub fn as_comparison(&self) -> Option<(&Expr, BinaryOp, &Expr)> {
        match &self.strip_parens().kind {
            ExprKind::Binary { op, left, right } if op.is_comparison() => Some((left, *op, right)),
            _ => None,
        }
    }

    /// Check if this expression contains an array access.
    pub fn contains_array_access(&self) -> bool {
        let mut finder = ArrayAccessFinder { found: false };
        finder.visit_expr(self);
        finder.found
    }

    /// Check if this expression is a sum of variables and integer literals
    /// with constant factors.
    pub fn is_affine(&self) -> bool {
        match &self.kind {
            ExprKind::IntLiteral(_) | ExprKind::Variable(_) => true,
            ExprKind::Grouped(inner) => inner.is_affine(),
            ExprKind::Unary { op: UnaryOp::Neg | UnaryOp::Plus, operand } => operand.is_affine(),
            ExprKind::Binary { op: BinaryOp::Add | BinaryOp::Sub, left, right } => {
                left.is_affine() && right.is_affine()
            }
            ExprKind::Binary { op: BinaryOp::Mul, left, right } => {
                (left.is_int_constant() && right.is_affine())
                    || (left.is_affine() && right.is_int_constant())
            }
            _ => false,
        }
    }

    fn is_int_constant(&self) -> bool {
        match &self.kind {
            ExprKind::IntLiteral(_) => true,
            ExprKind::Grouped(inner) => inner.is_int_constant(),
            ExprKind::Unary { op: UnaryOp::Neg | UnaryOp::Plus, operand } => operand.is_int_constant(),
            ExprKind::Binary { op: BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul, left, right } => {
                left.is_int_constant() && right.is_int_constant()
            }
            _ => false,
        }
    }
}

struct ArrayAccessFinder {
    found: bool,
}

impl AstVisitor for ArrayAccessFinder {
    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::ArrayAccess { .. } = expr.kind {
            self.found = true;
        } else {
            walk_expr(self, expr);
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::IntLiteral(v) => write!(f, "{}", v),
            ExprKind::FloatLiteral(v) => write!(f, "{:?}", v),
            ExprKind::Variable(name) => write!(f, "{}", name),
            ExprKind::ArrayAccess { array, indices } => {
                write!(f, "{}", array)?;
                for idx in indices {
                    write!(f, "[{}]", idx)?;
                }
                Ok(())
            }
            ExprKind::Binary { op, left, right } => write!(f, "{} {} {}", left, op, right),
            ExprKind::Unary { op, operand } => {
                if op.is_postfix() {
                    write!(f, "{}{}", operand, op)
                } else {
                    write!(f, "{}{}", op, operand)
                }
            }
            ExprKind::Assign { op, target, value } => write!(f, "{} {} {}", target, op, value),
            ExprKind::Call { function, args } => {
                write!(f, "{}(", function)?;
                for (n, arg) in args.iter().enumerate() {
                    if n > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            ExprKind::Ternary { condition, then_expr, else_expr } => {
                write!(f, "{} ? {} : {}", condition, then_expr, else_expr)
            }
            ExprKind::Grouped(inner) => write!(f, "({})", inner),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    /// Get the precedence of this operator (higher binds tighter).
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
        }
    }

    /// Check if this is a comparison operator.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::Ne => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Le => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Ge => write!(f, ">="),
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x`
    Not,
    /// `++x`
    PreInc,
    /// `--x`
    PreDec,
    /// `x++`
    PostInc,
    /// `x--`
    PostDec,
}

impl UnaryOp {
    /// `++` in either position.
    pub fn is_increment(&self) -> bool {
        matches!(self, UnaryOp::PreInc | UnaryOp::PostInc)
    }

    /// `++` or `--` in either position.
    pub fn is_inc_dec(&self) -> bool {
        matches!(self, UnaryOp::PreInc | UnaryOp::PostInc | UnaryOp::PreDec | UnaryOp::PostDec)
    }

    /// Written after the operand.
    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::PreInc | UnaryOp::PostInc => write!(f, "++"),
            UnaryOp::PreDec | UnaryOp::PostDec => write!(f, "--"),
        }
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
}

impl AssignOp {
    /// Anything but plain `=`: the target's old value is read.
    pub fn is_compound(&self) -> bool {
        !matches!(self, AssignOp::Assign)
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignOp::Assign => write!(f, "="),
            AssignOp::AddAssign => write!(f, "+="),
            AssignOp::SubAssign => write!(f, "-="),
            AssignOp::MulAssign => write!(f, "*="),
            AssignOp::DivAssign => write!(f, "/="),
            AssignOp::ModAssign => write!(f, "%="),
        }
    }
}

/// Visitor for walking expressions in evaluation order.
///
/// Override `visit_expr` and call [`walk_expr`] to continue into children.
pub trait AstVisitor {
    /// Visit an expression.
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

/// Visit the children of `expr`, left to right.
pub fn walk_expr<V: AstVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::IntLiteral(_) | ExprKind::FloatLiteral(_) | ExprKind::Variable(_) => {}
        ExprKind::ArrayAccess { array, indices } => {
            visitor.visit_expr(array);
            for idx in indices {
                visitor.visit_expr(idx);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Assign { target, value, .. } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            visitor.visit_expr(condition);
            visitor.visit_expr(then_expr);
            visitor.visit_expr(else_expr);
        }
        ExprKind::Grouped(inner) => visitor.visit_expr(inner),
    }
}

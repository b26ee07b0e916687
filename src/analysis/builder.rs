//! Computation builder.
//!
//! Walks the statement tree of one function depth-first and emits a
//! [`StatementRecord`] for every leaf statement. Loops and branches only
//! shape the context the leaves are recorded in.

use crate::analysis::context::{ContextSnapshot, StatementContext};
use crate::analysis::fold::ConstFolder;
use crate::analysis::header::HeaderValidator;
use crate::frontend::ast::{ExprKind, Function, Program, Stmt, StmtKind};
use crate::ir::computation::{AccessRelation, Computation, ExecutionSchedule, StatementRecord, StmtId};
use crate::polyhedral::ScalarPolicy;
use crate::utils::errors::{BuildError, BuildErrorKind, BuildResult};
use crate::utils::location::Span;
use log::{debug, trace};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

/// What to do with the `else` of an `if`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElseBranchPolicy {
    /// Walk the else branch under the negated predicate.
    #[default]
    Invert,
    /// Fail with `UnsupportedConstruct`.
    Reject,
}

/// What to do with `if (int x = ...; cond)` and `if (int x = ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionDeclPolicy {
    /// Fail with `MalformedBranchCondition`.
    #[default]
    Reject,
    /// Emit the declaration as a leaf statement just before the branch.
    Hoist,
}

/// Configuration for the computation builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Handling of else branches
    pub else_branches: ElseBranchPolicy,
    /// Handling of declarations in `if` conditions
    pub condition_decls: ConditionDeclPolicy,
    /// Whether bare scalars are data accesses
    pub scalars: ScalarPolicy,
    /// Accept `!=` loop conditions and branch predicates
    pub allow_not_equal: bool,
    /// Groups of data spaces that no statement of the function may write
    pub invariants: Vec<Vec<String>>,
    /// Named constants available when checking loop increments
    pub constants: BTreeMap<String, i64>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            else_branches: ElseBranchPolicy::Invert,
            condition_decls: ConditionDeclPolicy::Reject,
            scalars: ScalarPolicy::Track,
            allow_not_equal: false,
            invariants: Vec::new(),
            constants: BTreeMap::new(),
        }
    }
}

impl BuilderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration that rejects else branches and condition declarations.
    pub fn without_else() -> Self {
        Self::default()
            .else_branches(ElseBranchPolicy::Reject)
            .condition_decls(ConditionDeclPolicy::Reject)
    }

    /// Set the else-branch policy.
    pub fn else_branches(mut self, policy: ElseBranchPolicy) -> Self {
        self.else_branches = policy;
        self
    }

    /// Set the condition-declaration policy.
    pub fn condition_decls(mut self, policy: ConditionDeclPolicy) -> Self {
        self.condition_decls = policy;
        self
    }

    /// Set the scalar policy.
    pub fn scalars(mut self, policy: ScalarPolicy) -> Self {
        self.scalars = policy;
        self
    }

    /// Accept or reject `!=` constraints.
    pub fn allow_not_equal(mut self, allow: bool) -> Self {
        self.allow_not_equal = allow;
        self
    }

    /// Add a group of invariant data spaces.
    pub fn invariant<I, S>(mut self, group: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invariants.push(group.into_iter().map(Into::into).collect());
        self
    }

    /// Add a named constant.
    pub fn constant(mut self, name: impl Into<String>, value: i64) -> Self {
        self.constants.insert(name.into(), value);
        self
    }
}

/// Builds the polyhedral model of a function.
#[derive(Debug, Clone)]
pub struct ComputationBuilder {
    config: BuilderConfig,
    folder: ConstFolder,
}

impl ComputationBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: BuilderConfig) -> Self {
        let folder = ConstFolder::with_constants(config.constants.clone());
        Self { config, folder }
    }

    /// The configuration this builder was created with.
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build the computation of every function in a program.
    pub fn build_program(&self, program: &Program) -> BuildResult<Vec<Computation>> {
        program.functions.iter().map(|f| self.build(f)).collect()
    }

    /// Build the computation of one function.
    ///
    /// Fails on the first construct outside the supported subset; no
    /// partial model is returned.
    pub fn build(&self, function: &Function) -> BuildResult<Computation> {
        debug!("building computation for '{}'", function.name);
        let mut walker = FunctionWalker::new(&self.config, &self.folder);

        let body = &function.body.statements;
        for (n, stmt) in body.iter().enumerate() {
            walker.walk(stmt, n + 1 == body.len())?;
        }

        let computation = walker.finish(&function.name)?;
        debug!(
            "'{}': {} statements, {} data spaces",
            computation.name,
            computation.num_stmts(),
            computation.data_spaces.len()
        );
        Ok(computation)
    }
}

impl Default for ComputationBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

/// A leaf statement waiting for schedule padding.
struct PendingStmt {
    source: String,
    span: Span,
    snapshot: ContextSnapshot,
}

/// State of one `build` call.
struct FunctionWalker<'b> {
    config: &'b BuilderConfig,
    validator: HeaderValidator<'b>,
    ctx: StatementContext,
    pending: Vec<PendingStmt>,
}

impl<'b> FunctionWalker<'b> {
    fn new(config: &'b BuilderConfig, folder: &'b ConstFolder) -> Self {
        let mut ctx = StatementContext::new(config.scalars);
        for group in &config.invariants {
            ctx.declare_invariant(group.clone());
        }
        Self {
            config,
            validator: HeaderValidator::new(folder, config.allow_not_equal),
            ctx,
            pending: Vec::new(),
        }
    }

    /// Walk one statement. `trailing` is set only for the last statement
    /// of the function body.
    fn walk(&mut self, stmt: &Stmt, trailing: bool) -> BuildResult<()> {
        match &stmt.kind {
            StmtKind::Compound(block) => {
                for child in &block.statements {
                    self.walk(child, false)?;
                }
                Ok(())
            }
            StmtKind::Declaration(decls) => self.leaf(stmt, |ctx| ctx.record_declaration(decls)),
            StmtKind::Expression(expr) => match expr.strip_parens().kind {
                ExprKind::Call { .. } => Err(unsupported(stmt)),
                _ => self.leaf(stmt, |ctx| ctx.record_expr(expr)),
            },
            StmtKind::Return(value) if trailing => self.leaf(stmt, |ctx| match value {
                Some(expr) => ctx.record_expr(expr),
                None => Ok(()),
            }),
            StmtKind::Empty => self.leaf(stmt, |_| Ok(())),
            StmtKind::For { body, .. } => self.walk_loop(stmt, body),
            StmtKind::If { init, then_branch, else_branch, .. } => {
                self.walk_branch(stmt, init.as_deref(), then_branch, else_branch.as_deref())
            }
            StmtKind::While { .. }
            | StmtKind::DoWhile { .. }
            | StmtKind::Switch { .. }
            | StmtKind::Label { .. }
            | StmtKind::Attributed { .. }
            | StmtKind::Goto(_)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Return(_) => Err(unsupported(stmt)),
        }
    }

    fn walk_loop(&mut self, stmt: &Stmt, body: &Stmt) -> BuildResult<()> {
        self.ctx.advance();
        let header = self.validator.validate_loop(stmt)?;
        debug!("entering loop over {} ({})", header.iterator, header.condition);

        self.ctx.enter_loop(&header)?;
        self.walk(body, false)?;
        self.ctx.exit_loop()
    }

    fn walk_branch(
        &mut self,
        stmt: &Stmt,
        init: Option<&Stmt>,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> BuildResult<()> {
        if let Some(init) = init {
            match self.config.condition_decls {
                ConditionDeclPolicy::Reject => {
                    return Err(BuildError::new(
                        BuildErrorKind::MalformedBranchCondition,
                        "If statement condition variable declarations are unsupported",
                        stmt.span,
                        stmt.header_text(),
                    ));
                }
                ConditionDeclPolicy::Hoist => {
                    trace!("hoisting `{}` out of `{}`", init, stmt.header_text());
                    self.walk(init, false)?;
                }
            }
        }
        if else_branch.is_some() && self.config.else_branches == ElseBranchPolicy::Reject {
            return Err(BuildError::new(
                BuildErrorKind::UnsupportedConstruct,
                "Else branches are unsupported in this configuration",
                stmt.span,
                stmt.header_text(),
            ));
        }

        let predicate = self.validator.validate_branch(stmt, false)?;
        debug!("entering branch {}", predicate);
        self.ctx.enter_branch(predicate);
        self.walk(then_branch, false)?;
        self.ctx.exit_branch()?;

        if let Some(otherwise) = else_branch {
            let predicate = self.validator.validate_branch(stmt, true)?;
            debug!("entering else branch {}", predicate);
            self.ctx.enter_branch(predicate);
            self.walk(otherwise, false)?;
            self.ctx.exit_branch()?;
        }
        Ok(())
    }

    fn leaf<F>(&mut self, stmt: &Stmt, record: F) -> BuildResult<()>
    where
        F: FnOnce(&mut StatementContext) -> BuildResult<()>,
    {
        self.ctx.advance();
        record(&mut self.ctx)?;
        let snapshot = self.ctx.snapshot();
        debug!(
            "S{}: `{}` at {}",
            self.pending.len(),
            stmt,
            snapshot.schedule
        );
        self.pending.push(PendingStmt {
            source: stmt.to_string(),
            span: stmt.span,
            snapshot,
        });
        Ok(())
    }

    /// Pad every schedule to the common dimension and assemble the result.
    fn finish(self, name: &str) -> BuildResult<Computation> {
        if !self.ctx.iterators().is_empty() {
            return Err(BuildError::internal(format!(
                "loops still open after building from function '{}'",
                name
            )));
        }

        let max_dim = self
            .pending
            .iter()
            .map(|p| p.snapshot.schedule.dimension())
            .max()
            .unwrap_or(0);

        let mut computation = Computation::new(name);
        computation.data_spaces = self.ctx.data_spaces().clone();

        for (n, pending) in self.pending.into_iter().enumerate() {
            let ContextSnapshot { iteration_space, mut schedule, accesses } = pending.snapshot;
            schedule.zero_pad(max_dim)?;

            let iterators = iteration_space.iterators.clone();
            let (reads, writes): (Vec<_>, Vec<_>) = accesses.into_iter().partition(|a| a.is_read);
            computation.statements.push(StatementRecord {
                id: StmtId::new(n),
                source: pending.source,
                span: pending.span,
                execution_schedule: ExecutionSchedule {
                    iterators: iterators.clone(),
                    schedule,
                },
                reads: reads.into_iter().map(|a| AccessRelation::from_access(a, &iterators)).collect(),
                writes: writes.into_iter().map(|a| AccessRelation::from_access(a, &iterators)).collect(),
                iteration_space,
            });
        }

        if !computation.is_complete() {
            return Err(BuildError::internal(format!(
                "Computation is in an inconsistent state after building from function '{}'",
                name
            )));
        }
        Ok(computation)
    }
}

fn unsupported(stmt: &Stmt) -> BuildError {
    BuildError::new(
        BuildErrorKind::UnsupportedConstruct,
        format!("Unsupported stmt type {}", stmt.kind.name()),
        stmt.span,
        stmt.header_text(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse;
    use crate::utils::errors::LoopHeaderPart;

    fn build_with(source: &str, config: BuilderConfig) -> BuildResult<Computation> {
        let program = parse(source).expect("test source should parse");
        ComputationBuilder::new(config).build(&program.functions[0])
    }

    fn build(source: &str) -> BuildResult<Computation> {
        build_with(source, BuilderConfig::default())
    }

    fn schedules(comp: &Computation) -> Vec<String> {
        comp.statements.iter().map(|s| s.execution_schedule.to_string()).collect()
    }

    fn spaces(comp: &Computation) -> Vec<String> {
        comp.statements.iter().map(|s| s.iteration_space.to_string()).collect()
    }

    #[test]
    fn test_single_nest() {
        let comp = build(
            "void f(int a, int b, int x[a][b], int y[a][b], int sum[a][b]) {
                for (int i = 0; i < a; i++)
                    for (int j = 0; j < b; j++)
                        sum[i][j] = x[i][j] + y[i][j];
            }",
        )
        .unwrap();
        assert_eq!(comp.num_stmts(), 1);
        let stmt = &comp.statements[0];
        assert_eq!(
            stmt.iteration_space.to_string(),
            "{[i,j]: 0 <= i and i < a and 0 <= j and j < b}"
        );
        assert_eq!(stmt.execution_schedule.to_string(), "{[i,j]->[0,i,0,j,0]}");
        assert_eq!(stmt.writes.len(), 1);
        assert_eq!(stmt.writes[0].space, "sum");
        assert_eq!(stmt.writes[0].to_string(), "{[i,j]->[i,j]}");
        let reads: Vec<_> = stmt.reads.iter().map(|r| (r.space.as_str(), r.to_string())).collect();
        assert_eq!(
            reads,
            vec![("x", "{[i,j]->[i,j]}".to_string()), ("y", "{[i,j]->[i,j]}".to_string())]
        );
    }

    #[test]
    fn test_sibling_loops_are_padded() {
        let comp = build(
            "void f(int n, double a[n]) {
                double s = 0;
                for (int i = 0; i < n; i++) {
                    a[i] = 0;
                    for (int j = 0; j < n; j++)
                        a[i] += 1;
                }
                s = a[0];
            }",
        )
        .unwrap();
        assert_eq!(
            schedules(&comp),
            vec![
                "{[]->[0,0,0,0,0]}",
                "{[i]->[1,i,0,0,0]}",
                "{[i,j]->[1,i,1,j,0]}",
                "{[]->[2,0,0,0,0]}",
            ]
        );
        assert!(comp.is_complete());
    }

    #[test]
    fn test_else_branch_inverts_predicate() {
        let comp = build(
            "void f(int n, int a[n]) {
                for (int i = 0; i < n; i++) {
                    if (a[i] > 0) a[i] = 1;
                    else a[i] = 2;
                }
            }",
        )
        .unwrap();
        assert_eq!(
            spaces(&comp),
            vec![
                "{[i]: 0 <= i and i < n and a(i) > 0}",
                "{[i]: 0 <= i and i < n and a(i) <= 0}",
            ]
        );
        assert_eq!(schedules(&comp), vec!["{[i]->[0,i,0]}", "{[i]->[0,i,1]}"]);
    }

    #[test]
    fn test_else_branch_rejected_by_policy() {
        let source = "void f(int n) { int x; if (n > 0) x = 1; else x = 2; }";
        let err = build_with(source, BuilderConfig::without_else()).unwrap_err();
        assert_eq!(err.kind, BuildErrorKind::UnsupportedConstruct);

        let ok = build_with("void f(int n) { int x; if (n > 0) x = 1; }", BuilderConfig::without_else());
        assert!(ok.is_ok());
    }

    #[test]
    fn test_condition_declaration_policy() {
        let source = "void f(int n) { int x; if (int t = n; t > 0) x = t; }";
        let err = build(source).unwrap_err();
        assert_eq!(err.kind, BuildErrorKind::MalformedBranchCondition);
        assert_eq!(err.message, "If statement condition variable declarations are unsupported");

        let config = BuilderConfig::default().condition_decls(ConditionDeclPolicy::Hoist);
        let comp = build_with(source, config).unwrap();
        assert_eq!(comp.num_stmts(), 3);
        assert_eq!(comp.statements[1].source, "int t = n;");
        assert_eq!(comp.statements[2].iteration_space.to_string(), "{[]: t > 0}");
    }

    #[test]
    fn test_condition_variable_declaration() {
        let source = "void f(int n, int a[n]) { int x; if (int t = a[0]) x = t; }";
        let err = build(source).unwrap_err();
        assert_eq!(err.kind, BuildErrorKind::MalformedBranchCondition);
        assert_eq!(err.message, "If statement condition variable declarations are unsupported");

        let hoist = BuilderConfig::default().condition_decls(ConditionDeclPolicy::Hoist);
        let err = build_with(source, hoist.clone()).unwrap_err();
        assert_eq!(err.kind, BuildErrorKind::MalformedBranchCondition);

        let comp = build_with(source, hoist.allow_not_equal(true)).unwrap();
        assert_eq!(comp.statements[1].source, "int t = a[0];");
        assert!(comp.statements[1].reads_from("a"));
        assert_eq!(comp.statements[2].iteration_space.to_string(), "{[]: t != 0}");
    }

    #[test]
    fn test_unsupported_statements() {
        let cases = [
            ("void f(int n) { while (n > 0) n--; }", "WhileStmt"),
            ("void f(int n) { do { n--; } while (n > 0); }", "DoStmt"),
            ("void f(int n) { for (int i = 0; i < n; i++) { break; } }", "BreakStmt"),
            ("void f(int n) { for (int i = 0; i < n; i++) continue; }", "ContinueStmt"),
            ("void f(int n) { g(n); }", "CallExpr"),
            ("void f(int n) { (g(n)); }", "CallExpr"),
            ("int f(int n) { return n; n = 1; }", "ReturnStmt"),
            ("void f(int n) { goto end; end: n = 0; }", "GotoStmt"),
        ];
        for (source, name) in cases {
            let err = build(source).unwrap_err();
            assert_eq!(err.kind, BuildErrorKind::UnsupportedConstruct, "{}", source);
            assert_eq!(err.message, format!("Unsupported stmt type {}", name));
        }
    }

    #[test]
    fn test_trailing_return_is_a_statement() {
        let comp = build("int f(int n, int a[n]) { int x = a[0]; return x; }").unwrap();
        assert_eq!(comp.num_stmts(), 2);
        assert!(comp.statements[1].reads_from("x"));
    }

    #[test]
    fn test_not_equal_is_configurable() {
        let source = "void f(int n, int a[n]) { for (int i = 0; i != n; i++) a[i] = 0; }";
        let err = build(source).unwrap_err();
        assert_eq!(err.kind, BuildErrorKind::MalformedLoopHeader(LoopHeaderPart::Condition));
        let comp = build_with(source, BuilderConfig::default().allow_not_equal(true)).unwrap();
        assert_eq!(comp.statements[0].iteration_space.to_string(), "{[i]: 0 <= i and i != n}");
    }

    #[test]
    fn test_configured_invariants() {
        let source = "void f(int n, int a[n], int b[n]) { for (int i = 0; i < n; i++) a[i] = b[i]; }";
        assert!(build(source).is_ok());
        let err = build_with(source, BuilderConfig::default().invariant(["a"])).unwrap_err();
        assert_eq!(err.kind, BuildErrorKind::InvariantViolation);
    }

    #[test]
    fn test_empty_function() {
        let comp = build("void f() { }").unwrap();
        assert_eq!(comp.num_stmts(), 0);
        assert_eq!(comp.schedule_dimension(), None);
        assert!(comp.is_complete());
    }

    #[test]
    fn test_hand_built_tree() {
        use crate::frontend::ast::{AssignOp, BinaryOp, Block, Expr, ForInit, UnaryOp, VarDecl};

        let body = Stmt::expr(Expr::assign(
            AssignOp::DivAssign,
            Expr::index("x", vec![Expr::var("j")]),
            Expr::index("l", vec![Expr::var("j"), Expr::var("j")]),
        ));
        let nest = Stmt::for_loop(
            ForInit::Declaration(vec![VarDecl::int("j", Some(Expr::int(0)))]),
            Expr::binary(BinaryOp::Lt, Expr::var("j"), Expr::var("n")),
            Expr::unary(UnaryOp::PreInc, Expr::var("j")),
            body,
        );
        let function = Function::new("scale", Block::new(vec![nest]));

        let comp = ComputationBuilder::default().build(&function).unwrap();
        let stmt = &comp.statements[0];
        assert_eq!(stmt.source, "x[j] /= l[j][j];");
        assert_eq!(stmt.writes[0].to_string(), "{[j]->[j]}");
        let reads: Vec<_> = stmt.reads.iter().map(|r| (r.space.as_str(), r.to_string())).collect();
        assert_eq!(
            reads,
            vec![("x", "{[j]->[j]}".to_string()), ("l", "{[j]->[j,j]}".to_string())]
        );
    }

    #[test]
    fn test_builder_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ComputationBuilder>();
    }
}

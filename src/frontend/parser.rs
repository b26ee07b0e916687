//! Parser for the C subset.
//!
//! This module implements a recursive descent parser that converts
//! a stream of tokens into a statement tree. The grammar covers function
//! definitions and every C statement kind; expressions use the usual C
//! precedence levels (assignment, ternary, logical, equality, relational,
//! additive, multiplicative, unary, postfix).

use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::frontend::ast::*;
use crate::utils::errors::{LexerError, ParseError, ParseErrorKind};
use anyhow::Result;
use log::trace;

/// A parser for C kernels.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    lookahead: Option<Token>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser from a lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let first_token = lexer.next_token()?;

        Ok(Self {
            lexer,
            current: first_token.clone(),
            previous: first_token,
            lookahead: None,
            errors: Vec::new(),
        })
    }

    /// Parse a complete translation unit.
    ///
    /// Errors inside a function body are collected and parsing resumes at
    /// the next statement; the first collected error is returned.
    pub fn parse_program(&mut self) -> Result<Program> {
        let start = self.current.span;
        let mut program = Program::new();

        while !self.is_at_end() {
            match self.parse_top_level() {
                Ok(Some(func)) => program.functions.push(func),
                Ok(None) => {}
                Err(e) => {
                    if e.downcast_ref::<LexerError>().is_some() {
                        return Err(e);
                    }
                    self.record_error(e);
                    self.synchronize();
                }
            }
        }

        program.span = start.merge(&self.previous.span);

        if !self.errors.is_empty() {
            let count = self.errors.len();
            let first = self.errors.remove(0);
            return Err(anyhow::Error::new(first).context(format!("{} parse error(s)", count)));
        }

        Ok(program)
    }

    /// A function definition, or `None` for a prototype.
    fn parse_top_level(&mut self) -> Result<Option<Function>> {
        let start = self.current.span;
        while self.check(TokenKind::Identifier)
            && matches!(self.current.lexeme.as_str(), "static" | "inline" | "extern")
        {
            self.advance()?;
        }

        let mut return_type = self.parse_type()?;
        while self.match_token(TokenKind::Star)? {
            return_type.pointer_depth += 1;
        }
        let name = self.consume_identifier("Expected function name")?;

        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;
        let params = self.parse_parameters()?;
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        if self.match_token(TokenKind::Semicolon)? {
            trace!("skipping prototype of {}", name);
            return Ok(None);
        }

        let body = self.parse_block()?;

        Ok(Some(Function {
            name,
            return_type,
            params,
            body,
            span: start.merge(&self.previous.span),
        }))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>> {
        let mut params = Vec::new();

        if self.check(TokenKind::Void) && self.peek_kind()? == TokenKind::RightParen {
            self.advance()?;
            return Ok(params);
        }

        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.parse_parameter()?);
                if !self.match_token(TokenKind::Comma)? {
                    break;
                }
            }
        }

        Ok(params)
    }

    fn parse_parameter(&mut self) -> Result<Parameter> {
        let start = self.current.span;
        let mut ty = self.parse_type()?;
        while self.match_token(TokenKind::Star)? {
            ty.pointer_depth += 1;
        }
        let name = self.consume_identifier("Expected parameter name")?;
        let dimensions = self.parse_dimensions()?;

        Ok(Parameter {
            name,
            ty,
            dimensions,
            span: start.merge(&self.previous.span),
        })
    }

    /// `[e0][]...` after a declared name.
    fn parse_dimensions(&mut self) -> Result<Vec<Option<Expr>>> {
        let mut dimensions = Vec::new();
        while self.match_token(TokenKind::LeftBracket)? {
            if self.check(TokenKind::RightBracket) {
                dimensions.push(None);
            } else {
                dimensions.push(Some(self.parse_expression()?));
            }
            self.consume(TokenKind::RightBracket, "Expected ']' after array dimension")?;
        }
        Ok(dimensions)
    }

    /// Qualifiers and a base type. Pointer stars belong to each declarator.
    fn parse_type(&mut self) -> Result<Type> {
        let mut is_const = false;
        let mut is_unsigned = false;
        let mut saw_sign = false;
        let mut scalar = None;

        while self.current.kind.is_type_keyword() {
            match self.current.kind {
                TokenKind::Const => is_const = true,
                TokenKind::Unsigned => {
                    is_unsigned = true;
                    saw_sign = true;
                }
                TokenKind::Signed => saw_sign = true,
                TokenKind::Void => scalar = Some(ScalarType::Void),
                TokenKind::Bool => scalar = Some(ScalarType::Bool),
                TokenKind::Char => scalar = Some(ScalarType::Char),
                TokenKind::Short => scalar = Some(ScalarType::Short),
                // `long int`, `long long` and `long double` keep the wider word.
                TokenKind::Int => {
                    if scalar.is_none() {
                        scalar = Some(ScalarType::Int);
                    }
                }
                TokenKind::Long => {
                    if scalar != Some(ScalarType::Double) {
                        scalar = Some(ScalarType::Long);
                    }
                }
                TokenKind::Float32 => scalar = Some(ScalarType::Float),
                TokenKind::Double => scalar = Some(ScalarType::Double),
                _ => break,
            }
            self.advance()?;
        }

        let scalar = match scalar {
            Some(s) => s,
            None if saw_sign => ScalarType::Int,
            None => {
                return Err(self.error(
                    ParseErrorKind::ExpectedType,
                    &format!("Expected type, found {}", self.current.kind),
                ));
            }
        };

        Ok(Type { scalar, is_unsigned, is_const, pointer_depth: 0 })
    }

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.current.span;
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.current.span.start_offset;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    if e.downcast_ref::<LexerError>().is_some() {
                        return Err(e);
                    }
                    self.record_error(e);
                    if self.current.span.start_offset == before {
                        self.advance()?;
                    }
                    self.synchronize_statement();
                }
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}'")?;

        Ok(Block {
            statements,
            span: start.merge(&self.previous.span),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let start = self.current.span;
        let current = self.current.kind;

        let kind = match current {
            TokenKind::LeftBracket if self.peek_kind()? == TokenKind::LeftBracket => {
                self.parse_attributed_statement()?
            }
            TokenKind::For => self.parse_for_statement()?,
            TokenKind::If => self.parse_if_statement()?,
            TokenKind::While => self.parse_while_statement()?,
            TokenKind::Do => self.parse_do_statement()?,
            TokenKind::Switch => self.parse_switch_statement()?,
            TokenKind::Case | TokenKind::Default => self.parse_case_label()?,
            TokenKind::Goto => {
                self.advance()?;
                let label = self.consume_identifier("Expected label after 'goto'")?;
                self.consume(TokenKind::Semicolon, "Expected ';' after goto")?;
                StmtKind::Goto(label)
            }
            TokenKind::Break => {
                self.advance()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after 'break'")?;
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after 'continue'")?;
                StmtKind::Continue
            }
            TokenKind::Return => self.parse_return_statement()?,
            TokenKind::LeftBrace => StmtKind::Compound(self.parse_block()?),
            TokenKind::Semicolon => {
                self.advance()?;
                StmtKind::Empty
            }
            kind if kind.is_type_keyword() => {
                let decls = self.parse_var_decls()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after declaration")?;
                StmtKind::Declaration(decls)
            }
            TokenKind::Identifier if self.peek_kind()? == TokenKind::Colon => {
                let name = self.consume_identifier("Expected label")?;
                self.advance()?;
                let body = self.parse_statement()?;
                StmtKind::Label { name, body: Box::new(body) }
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after expression")?;
                StmtKind::Expression(expr)
            }
        };

        Ok(Stmt {
            kind,
            span: start.merge(&self.previous.span),
        })
    }

    /// Declarators sharing one base type, without the trailing `;`.
    fn parse_var_decls(&mut self) -> Result<Vec<VarDecl>> {
        let base = self.parse_type()?;
        let mut decls = Vec::new();

        loop {
            let start = self.current.span;
            let mut ty = base.clone();
            while self.match_token(TokenKind::Star)? {
                ty.pointer_depth += 1;
            }
            let name = self.consume_identifier("Expected variable name")?;
            let dimensions = self.parse_dimensions()?;
            let init = if self.match_token(TokenKind::Equal)? {
                Some(self.parse_assignment_expr()?)
            } else {
                None
            };
            decls.push(VarDecl {
                name,
                ty,
                dimensions,
                init,
                span: start.merge(&self.previous.span),
            });
            if !self.match_token(TokenKind::Comma)? {
                break;
            }
        }

        Ok(decls)
    }

    fn parse_attributed_statement(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::LeftBracket, "Expected '['")?;
        self.consume(TokenKind::LeftBracket, "Expected '['")?;
        let mut attributes = Vec::new();
        if !self.check(TokenKind::RightBracket) {
            loop {
                attributes.push(self.consume_identifier("Expected attribute name")?);
                if !self.match_token(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBracket, "Expected ']' after attributes")?;
        self.consume(TokenKind::RightBracket, "Expected ']' after attributes")?;
        let body = self.parse_statement()?;
        Ok(StmtKind::Attributed { attributes, body: Box::new(body) })
    }

    fn parse_for_statement(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::For, "Expected 'for'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else if self.current.kind.is_type_keyword() {
            Some(ForInit::Declaration(self.parse_var_decls()?))
        } else {
            Some(ForInit::Expression(self.parse_expression()?))
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after for initializer")?;

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after for condition")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RightParen, "Expected ')' after for header")?;

        let body = self.parse_statement()?;

        Ok(StmtKind::For { init, condition, increment, body: Box::new(body) })
    }

    fn parse_if_statement(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::If, "Expected 'if'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;

        // `if (init; condition)` or `if (T x = e)`
        let mut init = None;
        let condition = if self.current.kind.is_type_keyword() {
            let start = self.current.span;
            let decls = self.parse_var_decls()?;
            let tested = match decls.as_slice() {
                [VarDecl { name, init: Some(_), span, .. }] if self.check(TokenKind::RightParen) => {
                    Some(Expr::new(
                        ExprKind::Binary {
                            op: BinaryOp::Ne,
                            left: Box::new(Expr::new(ExprKind::Variable(name.clone()), *span)),
                            right: Box::new(Expr::new(ExprKind::IntLiteral(0), *span)),
                        },
                        *span,
                    ))
                }
                _ => None,
            };
            if tested.is_none() {
                self.consume(TokenKind::Semicolon, "Expected ';' after if initializer")?;
            }
            init = Some(Box::new(Stmt {
                kind: StmtKind::Declaration(decls),
                span: start.merge(&self.previous.span),
            }));
            match tested {
                Some(condition) => condition,
                None => self.parse_expression()?,
            }
        } else {
            let first = self.parse_expression()?;
            if self.match_token(TokenKind::Semicolon)? {
                let span = first.span.merge(&self.previous.span);
                init = Some(Box::new(Stmt { kind: StmtKind::Expression(first), span }));
                self.parse_expression()?
            } else {
                first
            }
        };
        self.consume(TokenKind::RightParen, "Expected ')' after if condition")?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_token(TokenKind::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(StmtKind::If { init, condition, then_branch, else_branch })
    }

    fn parse_while_statement(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::While, "Expected 'while'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after while condition")?;
        let body = self.parse_statement()?;
        Ok(StmtKind::While { condition, body: Box::new(body) })
    }

    fn parse_do_statement(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Do, "Expected 'do'")?;
        let body = self.parse_statement()?;
        self.consume(TokenKind::While, "Expected 'while' after do body")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after do-while condition")?;
        self.consume(TokenKind::Semicolon, "Expected ';' after do-while")?;
        Ok(StmtKind::DoWhile { body: Box::new(body), condition })
    }

    fn parse_switch_statement(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Switch, "Expected 'switch'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'switch'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after switch condition")?;
        let body = self.parse_statement()?;
        Ok(StmtKind::Switch { condition, body: Box::new(body) })
    }

    /// `case e:` and `default:` are kept as labels.
    fn parse_case_label(&mut self) -> Result<StmtKind> {
        let name = if self.match_token(TokenKind::Default)? {
            "default".to_string()
        } else {
            self.consume(TokenKind::Case, "Expected 'case'")?;
            format!("case {}", self.parse_ternary_expr()?)
        };
        self.consume(TokenKind::Colon, "Expected ':' after case label")?;
        let body = self.parse_statement()?;
        Ok(StmtKind::Label { name, body: Box::new(body) })
    }

    fn parse_return_statement(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Return, "Expected 'return'")?;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after return")?;
        Ok(StmtKind::Return(value))
    }

    fn match_assign_op(&mut self) -> Result<Option<AssignOp>> {
        let op = match self.current.kind {
            TokenKind::Equal => Some(AssignOp::Assign),
            TokenKind::PlusEqual => Some(AssignOp::AddAssign),
            TokenKind::MinusEqual => Some(AssignOp::SubAssign),
            TokenKind::StarEqual => Some(AssignOp::MulAssign),
            TokenKind::SlashEqual => Some(AssignOp::DivAssign),
            TokenKind::PercentEqual => Some(AssignOp::ModAssign),
            _ => None,
        };
        if op.is_some() { self.advance()?; }
        Ok(op)
    }

    // Expression parsing with precedence climbing
    fn parse_expression(&mut self) -> Result<Expr> { self.parse_assignment_expr() }

    fn parse_assignment_expr(&mut self) -> Result<Expr> {
        let target = self.parse_ternary_expr()?;
        match self.match_assign_op()? {
            Some(op) => {
                let value = self.parse_assignment_expr()?;
                let span = target.span.merge(&value.span);
                Ok(Expr::new(
                    ExprKind::Assign { op, target: Box::new(target), value: Box::new(value) },
                    span,
                ))
            }
            None => Ok(target),
        }
    }

    fn parse_ternary_expr(&mut self) -> Result<Expr> {
        let condition = self.parse_or_expr()?;
        if !self.match_token(TokenKind::Question)? {
            return Ok(condition);
        }
        let then_expr = self.parse_expression()?;
        self.consume(TokenKind::Colon, "Expected ':' in conditional expression")?;
        let else_expr = self.parse_ternary_expr()?;
        let span = condition.span.merge(&else_expr.span);
        Ok(Expr::new(
            ExprKind::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expr()?;
        while self.match_token(TokenKind::PipePipe)? {
            let right = self.parse_and_expr()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality_expr()?;
        while self.match_token(TokenKind::AmpAmp)? {
            let right = self.parse_equality_expr()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison_expr()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::BangEqual => BinaryOp::Ne,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_comparison_expr()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::LessEqual => BinaryOp::Le,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::GreaterEqual => BinaryOp::Ge,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive_expr()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative_expr()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary_expr()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        let start = self.current.span;
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            _ => return self.parse_postfix_expr(),
        };
        self.advance()?;
        let operand = self.parse_unary_expr()?;
        let span = start.merge(&operand.span);
        Ok(Expr::new(ExprKind::Unary { op, operand: Box::new(operand) }, span))
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            match self.current.kind {
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RightBracket, "Expected ']'")?;
                    let span = expr.span.merge(&self.previous.span);
                    expr = match expr.kind {
                        ExprKind::ArrayAccess { array, mut indices } => {
                            indices.push(index);
                            Expr::new(ExprKind::ArrayAccess { array, indices }, span)
                        }
                        kind => {
                            let array = Box::new(Expr::new(kind, expr.span));
                            Expr::new(ExprKind::ArrayAccess { array, indices: vec![index] }, span)
                        }
                    };
                }
                TokenKind::LeftParen => {
                    let function = match expr.as_variable() {
                        Some(name) => name.to_string(),
                        None => {
                            return Err(self.error(
                                ParseErrorKind::UnexpectedToken,
                                "Only named functions can be called",
                            ));
                        }
                    };
                    self.advance()?;
                    let args = self.parse_args()?;
                    self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
                    let span = expr.span.merge(&self.previous.span);
                    expr = Expr::new(ExprKind::Call { function, args }, span);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.check(TokenKind::PlusPlus) {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    self.advance()?;
                    let span = expr.span.merge(&self.previous.span);
                    expr = Expr::new(ExprKind::Unary { op, operand: Box::new(expr) }, span);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        let start = self.current.span;

        match self.current.kind {
            TokenKind::Integer => {
                let value: i64 = self.current.lexeme.parse().map_err(|_| {
                    self.error(ParseErrorKind::UnexpectedToken, "Invalid integer literal")
                })?;
                self.advance()?;
                Ok(Expr::new(ExprKind::IntLiteral(value), start))
            }
            TokenKind::Float => {
                let value: f64 = self.current.lexeme.parse().map_err(|_| {
                    self.error(ParseErrorKind::UnexpectedToken, "Invalid float literal")
                })?;
                self.advance()?;
                Ok(Expr::new(ExprKind::FloatLiteral(value), start))
            }
            TokenKind::Identifier => {
                let name = self.current.lexeme.clone();
                self.advance()?;
                Ok(Expr::new(ExprKind::Variable(name), start))
            }
            TokenKind::LeftParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "Expected ')'")?;
                Ok(Expr::new(ExprKind::Grouped(Box::new(inner)), start.merge(&self.previous.span)))
            }
            TokenKind::Eof => Err(self.error(ParseErrorKind::UnexpectedEof, "Unexpected end of file")),
            _ => Err(self.error(
                ParseErrorKind::ExpectedExpression,
                &format!("Expected expression, found {}", self.current.kind),
            )),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_assignment_expr()?);
                if !self.match_token(TokenKind::Comma)? { break; }
            }
        }
        Ok(args)
    }

    // Helper methods
    fn check(&self, kind: TokenKind) -> bool { self.current.kind == kind }
    fn is_at_end(&self) -> bool { self.current.kind == TokenKind::Eof }

    fn peek_kind(&mut self) -> Result<TokenKind> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lexer.next_token()?);
        }
        Ok(self.lookahead.as_ref().map(|t| t.kind).unwrap_or(TokenKind::Eof))
    }

    fn advance(&mut self) -> Result<&Token> {
        let next = match self.lookahead.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        self.previous = std::mem::replace(&mut self.current, next);
        Ok(&self.previous)
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token> {
        if self.check(kind) {
            self.advance()
        } else if self.is_at_end() {
            Err(self.error(ParseErrorKind::UnexpectedEof, message))
        } else {
            Err(self.error(ParseErrorKind::UnexpectedToken, message))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<String> {
        if self.check(TokenKind::Identifier) {
            let name = self.current.lexeme.clone();
            self.advance()?;
            Ok(name)
        } else {
            Err(self.error(ParseErrorKind::ExpectedIdentifier, message))
        }
    }

    fn match_token(&mut self, kind: TokenKind) -> Result<bool> {
        if self.check(kind) { self.advance()?; Ok(true) } else { Ok(false) }
    }

    fn error(&self, kind: ParseErrorKind, message: &str) -> anyhow::Error {
        anyhow::Error::new(ParseError {
            message: message.to_string(),
            span: self.current.span,
            kind,
            found: Some(self.current.lexeme.clone()).filter(|s| !s.is_empty()),
        })
    }

    fn record_error(&mut self, error: anyhow::Error) {
        let error = match error.downcast::<ParseError>() {
            Ok(parse_error) => parse_error,
            Err(other) => ParseError {
                message: other.to_string(),
                span: self.current.span,
                kind: ParseErrorKind::UnexpectedToken,
                found: None,
            },
        };
        trace!("recovering from parse error: {}", error);
        self.errors.push(error);
    }

    /// Skip to the start of the next function definition.
    fn synchronize(&mut self) {
        if !self.is_at_end() && self.advance().is_err() {
            return;
        }

        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.previous.kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            if depth == 0
                && matches!(self.previous.kind, TokenKind::Semicolon | TokenKind::RightBrace)
                && self.current.kind.is_type_keyword()
            {
                return;
            }
            if self.advance().is_err() {
                return;
            }
        }
    }

    /// Skip to the start of the next statement in the enclosing block.
    fn synchronize_statement(&mut self) {
        while !self.is_at_end() && !self.check(TokenKind::RightBrace) {
            if self.previous.kind == TokenKind::Semicolon { return; }
            match self.current.kind {
                TokenKind::For | TokenKind::If | TokenKind::While |
                TokenKind::Return | TokenKind::LeftBrace => return,
                _ => {}
            }
            if self.advance().is_err() {
                return;
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(&right.span);
    Expr::new(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }, span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer)?;
        parser.parse_program()
    }

    fn body(source: &str) -> Vec<Stmt> {
        parse(source).unwrap().functions.remove(0).body.statements
    }

    #[test]
    fn test_empty_function() {
        let program = parse("void test() {}").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "test");
    }

    #[test]
    fn test_void_parameter_list_and_prototype() {
        let program = parse("int f(void); int f(void) { return 0; }").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert!(program.functions[0].params.is_empty());
    }

    #[test]
    fn test_array_params() {
        let program = parse("void test(int n, double A[n][n], double *x, const double b[]) {}").unwrap();
        let params = &program.functions[0].params;
        assert_eq!(params.len(), 4);
        assert!(!params[0].is_array());
        assert_eq!(params[1].ndims(), 2);
        assert_eq!(params[2].ndims(), 1);
        assert!(params[3].ty.is_const);
        assert!(params[3].dimensions[0].is_none());
    }

    #[test]
    fn test_for_loop_with_declaration() {
        let stmts = body("void f() { for (int i = 0; i < n; i++) { a[i] = i; } }");
        match &stmts[0].kind {
            StmtKind::For { init: Some(ForInit::Declaration(decls)), condition, increment, .. } => {
                assert_eq!(decls[0].name, "i");
                assert_eq!(condition.as_ref().unwrap().to_string(), "i < n");
                assert_eq!(increment.as_ref().unwrap().to_string(), "i++");
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop_with_expression_init() {
        let stmts = body("void f() { int i; for (i = 0; i < n; i += 1) a[i] = 0; }");
        assert!(matches!(stmts[0].kind, StmtKind::Declaration(_)));
        assert!(matches!(
            stmts[1].kind,
            StmtKind::For { init: Some(ForInit::Expression(_)), .. }
        ));
    }

    #[test]
    fn test_precedence() {
        let stmts = body("void f() { x = a + b * c < d && e; }");
        assert_eq!(stmts[0].to_string(), "x = a + b * c < d && e;");
        if let StmtKind::Expression(Expr { kind: ExprKind::Assign { value, .. }, .. }) = &stmts[0].kind {
            assert!(matches!(value.kind, ExprKind::Binary { op: BinaryOp::And, .. }));
        } else {
            panic!("Expected assignment");
        }
    }

    #[test]
    fn test_multi_dimensional_access() {
        let stmts = body("void f() { x[i] = l[i][j] * x[j]; }");
        if let StmtKind::Expression(Expr { kind: ExprKind::Assign { value, .. }, .. }) = &stmts[0].kind {
            if let ExprKind::Binary { left, .. } = &value.kind {
                if let ExprKind::ArrayAccess { indices, .. } = &left.kind {
                    assert_eq!(indices.len(), 2);
                    return;
                }
            }
        }
        panic!("Expected two-dimensional access");
    }

    #[test]
    fn test_if_else_and_if_init() {
        let stmts = body("void f() { if (a[i] > 0) x = 1; else x = 2; if (int t = 0; t < n) x = t; }");
        assert!(matches!(stmts[0].kind, StmtKind::If { else_branch: Some(_), init: None, .. }));
        assert!(matches!(stmts[1].kind, StmtKind::If { init: Some(_), .. }));
    }

    #[test]
    fn test_if_condition_declaration() {
        let stmts = body("void f() { if (int t = a[0]) x = t; }");
        match &stmts[0].kind {
            StmtKind::If { init: Some(init), condition, .. } => {
                assert!(matches!(init.kind, StmtKind::Declaration(_)));
                assert_eq!(condition.to_string(), "t != 0");
            }
            other => panic!("expected if with a declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_other_statement_kinds() {
        let source = r#"
            void f() {
                while (i < n) i++;
                do { i--; } while (i > 0);
                switch (i) { case 0: break; default: break; }
                top: goto top;
                [[likely]] x = 1;
                for (;;) continue;
                g(x);
                return;
            }
        "#;
        let stmts = body(source);
        let names: Vec<_> = stmts.iter().map(|s| s.kind.name()).collect();
        assert_eq!(names, vec![
            "WhileStmt", "DoStmt", "SwitchStmt", "LabelStmt", "AttributedStmt",
            "ForStmt", "CallExpr", "ReturnStmt",
        ]);
    }

    #[test]
    fn test_multi_declarator() {
        let stmts = body("void f() { int i, j = 0, *p; double s[10]; }");
        if let StmtKind::Declaration(decls) = &stmts[0].kind {
            assert_eq!(decls.len(), 3);
            assert!(decls[0].init.is_none());
            assert!(decls[1].init.is_some());
            assert_eq!(decls[2].ty.pointer_depth, 1);
        } else {
            panic!("Expected declaration");
        }
        assert!(matches!(&stmts[1].kind, StmtKind::Declaration(d) if d[0].dimensions.len() == 1));
    }

    #[test]
    fn test_parse_error_reports_location() {
        let err = parse("void f() {\n  x = ;\n}").unwrap_err();
        let parse_error = err.downcast_ref::<ParseError>().unwrap();
        assert_eq!(parse_error.kind, ParseErrorKind::ExpectedExpression);
        assert_eq!(parse_error.span.start_line, 2);
    }

    #[test]
    fn test_recovers_to_report_first_error() {
        let err = parse("void f() { x = ; y = 1; z = ]; }").unwrap_err();
        assert!(err.to_string().contains("2 parse error(s)"));
    }
}

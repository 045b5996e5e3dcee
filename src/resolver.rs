//! Static resolver pass for the **Lox** interpreter.
//!
//! One walk over the syntax tree that:
//! 1. Mirrors the runtime's lexical scopes with a stack of
//!    `HashMap<name, bool>` (false = declared, true = defined).
//! 2. Reports static errors (redeclaration, reading a local in its own
//!    initializer, misplaced `return`, `this` or `super`). Errors are collected
//!    and the walk carries on, so one pass reports all of them.
//! 3. Records, for every variable‑like expression that binds to a local, how
//!    many frames out the binding lives. Expressions absent from the table are
//!    globals and are looked up dynamically at runtime.
//!
//! Globals are never tracked in a scope: the outermost frame is dynamic.

use crate::ast::{ClassDecl, Expr, ExprId, ExprKind, FunctionDecl, Stmt};
use crate::class::INITIALIZER;
use crate::error::LoxError;
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;
use std::mem;

/// Hop distance per resolved expression.
pub type Resolutions = HashMap<ExprId, usize>;

/// What kind of function body we are in; validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body we are in; validates `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    resolutions: Resolutions,
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            resolutions: Resolutions::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Resolve a whole program. The table is only handed out when the
    /// program is free of static errors.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Resolutions, Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        if self.errors.is_empty() {
            info!("Resolved {} local reference(s)", self.resolutions.len());
            Ok(self.resolutions)
        } else {
            Err(self.errors)
        }
    }

    /// Resolve a lone expression evaluated at the top level.
    pub fn resolve_expression(mut self, expr: &Expr) -> Result<Resolutions, Vec<LoxError>> {
        self.resolve_expr(expr);

        if self.errors.is_empty() {
            Ok(self.resolutions)
        } else {
            Err(self.errors)
        }
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.resolve_stmt_inner(stmt))
    }

    fn resolve_stmt_inner(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Defined before the body so the function can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Class(class) => self.resolve_class(class),

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch.as_deref() {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(&mut self, class: &ClassDecl) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&class.name);
        self.define(&class.name);

        if let Some(superclass) = &class.superclass {
            if let ExprKind::Variable(super_name) = &superclass.kind {
                if super_name.lexeme == class.name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.bind_hidden("super");
        }

        self.begin_scope();
        self.bind_hidden("this");

        for method in &class.methods {
            let kind = if method.name.lexeme == INITIALIZER {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if class.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    /// Fresh scope for parameters and body; restores the enclosing function
    /// kind afterwards so nested declarations validate correctly.
    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) {
        let enclosing = mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.resolve_expr_inner(expr))
    }

    fn resolve_expr_inner(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}

            ExprKind::Grouping(inner) => self.resolve_expr(inner),

            ExprKind::Unary { right, .. } => self.resolve_expr(right),

            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            ExprKind::Variable(name) => {
                let in_own_initializer = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

                if in_own_initializer {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(expr.id, name);
            }

            ExprKind::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr.id, name);
            }

            ExprKind::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            ExprKind::Get { object, .. } => self.resolve_expr(object),

            ExprKind::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            ExprKind::This(keyword) => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(expr.id, keyword);
            }

            ExprKind::Super { keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class.");
                    }
                    ClassType::Class => {
                        self.error(keyword, "Can't use 'super' in a class with no superclass.");
                    }
                    ClassType::Subclass => {}
                }
                self.resolve_local(expr.id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// `this` / `super`: defined on sight in the innermost scope.
    fn bind_hidden(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    /// Record `id` as a local at the depth of the innermost scope holding
    /// `name`; leave it out of the table if no scope does (global).
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' ({}) at depth {}", name.lexeme, id, depth);
                self.resolutions.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' ({}) as global", name.lexeme, id);
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }
}

//! Syntax tree consumed by the resolver and the interpreter.
//!
//! Every [`Expr`] carries an [`ExprId`] handed out by the parser when the node
//! is built. Two syntactically identical expressions at different positions
//! get different ids, and the resolver's side table is keyed on that id, never
//! on node contents.

use std::fmt;
use std::rc::Rc;

use crate::stack::ensure_sufficient_stack;
use crate::token::Token;

/// Identity of one expression node.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExprId(pub usize);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self.0)
    }
}

/// A literal constant copied out of its token at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),
    Str(String),
    True,
    False,
    Nil,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(LiteralValue),

    /// `!x`, `-x`
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Arithmetic, comparison and equality operators.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Grouping(Box<Expr>),

    Variable(Token),

    Assign {
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)`; its line is used for call errors.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get {
        object: Box<Expr>,
        name: Token,
    },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This(Token),

    /// `super.method`
    Super {
        keyword: Token,
        method: Token,
    },
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    /// Move the node's kind out, leaving a `nil` literal behind.
    pub fn take_kind(&mut self) -> ExprKind {
        std::mem::replace(&mut self.kind, ExprKind::Literal(LiteralValue::Nil))
    }
}

// Long operator chains nest one box per operand; dropping them recurses just
// as deep as evaluating them does.
impl Drop for Expr {
    fn drop(&mut self) {
        let kind = self.take_kind();
        ensure_sufficient_stack(move || drop(kind));
    }
}

/// A function or method declaration. Shared between the syntax tree and every
/// function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,
    /// Always an `ExprKind::Variable` when present.
    pub superclass: Option<Expr>,
    pub methods: Vec<Rc<FunctionDecl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `for` loops are desugared into `While` by the parser.
    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Function(Rc<FunctionDecl>),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Class(ClassDecl),
}

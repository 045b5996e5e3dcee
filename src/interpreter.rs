//! Tree‑walking evaluator.
//!
//! Statements execute to a [`Flow`]: `Normal`, or `Return(value)` while a
//! `return` unwinds. Blocks and loops pass `Return` outward untouched; only a
//! function call turns it back into a value. Runtime errors travel separately
//! as `Err(LoxError)` and abort the current `interpret` call.
//!
//! Variable reads and writes use the resolver's distance table when it has an
//! entry for the expression, and the global frame otherwise.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ClassDecl, Expr, ExprId, ExprKind, LiteralValue, Stmt};
use crate::callable::{self, Callable, LoxFunction};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Resolutions;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Default for the deepest call nesting before the program is stopped with
/// `Stack overflow.`. Native stack is grown on demand, so this is what bounds
/// recursion, not the host thread's stack size.
pub const MAX_CALL_DEPTH: usize = 20_000;

/// Outcome of executing a statement.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<W: Write = io::Stdout> {
    globals: EnvRef,
    environment: EnvRef,
    locals: Resolutions,
    output: W,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter<io::Stdout> {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<W: Write> Interpreter<W> {
    /// Interpreter printing to `output`, with the native functions defined.
    pub fn with_output(output: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        let clock = callable::clock();
        debug!("Defining native function '{}'", clock.name);
        globals
            .borrow_mut()
            .define(clock.name, Value::Callable(Callable::Native(Rc::new(clock))));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            call_depth: 0,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }

    /// Replace the call depth limit.
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run a resolved program against the global frame.
    ///
    /// Tables from earlier calls are kept: functions defined by a previous
    /// program still refer to their own (older) expression ids. Entries are
    /// never evicted, so a long REPL session grows the table with every
    /// line, including lines whose code can no longer run. The first
    /// runtime error stops the program; globals defined before it survive.
    pub fn interpret(&mut self, statements: &[Stmt], resolutions: Resolutions) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        self.locals.extend(resolutions);

        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                Flow::Return(_) => unreachable!("'return' escaped to the top level"),
            }
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Evaluate a single resolved expression in the global frame.
    pub fn evaluate_expression(&mut self, expr: &Expr, resolutions: Resolutions) -> Result<Value> {
        self.locals.extend(resolutions);
        self.evaluate(expr)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_inner(stmt))
    }

    fn execute_inner(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let env = Environment::child_of(&self.environment);
                return self.execute_block(statements, env);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function =
                    LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment), false);
                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }

            Stmt::Class(class) => self.declare_class(class)?,
        }

        Ok(Flow::Normal)
    }

    /// Run `statements` with `env` as the current frame, restoring the
    /// previous frame afterwards whether they complete, return or fail.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, env);

        let mut result = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn declare_class(&mut self, class: &ClassDecl) -> Result<()> {
        debug!("Declaring class '{}'", class.name.lexeme);

        // Placeholder so methods can mention the class before it exists.
        self.environment
            .borrow_mut()
            .define(&class.name.lexeme, Value::Nil);

        let superclass = match &class.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(superclass)) => Some(superclass),
                _ => {
                    let token = match &expr.kind {
                        ExprKind::Variable(name) => name,
                        _ => &class.name,
                    };
                    return Err(LoxError::runtime(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        let method_env = match &superclass {
            Some(superclass) => {
                let env = Environment::child_of(&self.environment);
                env.borrow_mut().define(
                    "super",
                    Value::Callable(Callable::Class(Rc::clone(superclass))),
                );
                env
            }
            None => Rc::clone(&self.environment),
        };

        let methods = class
            .methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == INITIALIZER;
                let function =
                    LoxFunction::new(Rc::clone(method), Rc::clone(&method_env), is_initializer);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class_value = LoxClass::new(class.name.lexeme.clone(), superclass, methods);

        self.environment.borrow_mut().assign(
            &class.name,
            Value::Callable(Callable::Class(Rc::new(class_value))),
        )?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_inner(expr))
    }

    fn evaluate_inner(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => unreachable!("parser produced unary '{}'", operator.lexeme),
                }
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let decided = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Variable(name) => self.look_up_variable(expr.id, name),

            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(&expr.id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let args = arguments
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>>>()?;

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if args.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            args.len()
                        ),
                    ));
                }

                self.invoke(&callable, paren, args)
            }

            ExprKind::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            ExprKind::This(keyword) => self.look_up_variable(expr.id, keyword),

            ExprKind::Super { method, .. } => {
                let distance = self.resolved_distance(expr.id);

                let superclass = match Environment::get_at(&self.environment, distance, "super") {
                    Value::Callable(Callable::Class(superclass)) => superclass,
                    other => unreachable!("'super' bound to {}", other.type_name()),
                };

                // `this` lives in the frame just inside the one holding `super`.
                let instance = match Environment::get_at(&self.environment, distance - 1, "this") {
                    Value::Instance(instance) => instance,
                    other => unreachable!("'this' bound to {}", other.type_name()),
                };

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Callable(Callable::Function(Rc::new(
                        found.bind(instance),
                    )))),
                    None => Err(LoxError::runtime(
                        method,
                        format!("Undefined property '{}'.", method.lexeme),
                    )),
                }
            }
        }
    }

    fn invoke(&mut self, callable: &Callable, paren: &Token, args: Vec<Value>) -> Result<Value> {
        if self.call_depth >= self.max_call_depth {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = callable.call(self, paren, args);
        self.call_depth -= 1;

        result
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(
                &self.environment,
                distance,
                &name.lexeme,
            )),
            None => self.globals.borrow().get(name),
        }
    }

    fn resolved_distance(&self, id: ExprId) -> usize {
        match self.locals.get(&id) {
            Some(&distance) => distance,
            None => unreachable!("{} was never resolved", id),
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    let value = match operator.token_type {
        TokenType::PLUS => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(a), Value::String(b)) => Value::from(format!("{}{}", a, b)),
            _ => {
                return Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                ))
            }
        },

        TokenType::EQUAL_EQUAL => Value::Bool(left == right),
        TokenType::BANG_EQUAL => Value::Bool(left != right),

        _ => {
            let (a, b) = number_operands(operator, &left, &right)?;

            match operator.token_type {
                TokenType::MINUS => Value::Number(a - b),
                TokenType::STAR => Value::Number(a * b),
                TokenType::SLASH => Value::Number(a / b),
                TokenType::GREATER => Value::Bool(a > b),
                TokenType::GREATER_EQUAL => Value::Bool(a >= b),
                TokenType::LESS => Value::Bool(a < b),
                TokenType::LESS_EQUAL => Value::Bool(a <= b),
                _ => unreachable!("parser produced binary '{}'", operator.lexeme),
            }
        }
    };

    Ok(value)
}

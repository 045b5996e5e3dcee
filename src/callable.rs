//! Everything that can appear in callee position: natives, user functions
//! (including bound methods) and classes.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// A function implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

/// `clock()`: seconds since the Unix epoch.
pub fn clock() -> NativeFunction {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: |_args| {
            let millis = Utc::now().timestamp_millis();
            Ok(Value::Number(millis as f64 / 1000.0))
        },
    }
}

/// A user‑defined function or method together with the frame it closed over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure is a fresh frame binding `this`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let env = Environment::child_of(&self.closure);
        env.borrow_mut().define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }

    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling function '{}'", self.name());

        let env = Environment::child_of(&self.closure);

        for (param, arg) in self.declaration.params.iter().zip(args) {
            env.borrow_mut().define(&param.lexeme, arg);
        }

        let flow = interpreter.execute_block(&self.declaration.body, env)?;

        // An initializer always yields its instance, even after `return;`.
        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this"));
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }
}

#[derive(Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invoke with already evaluated arguments; the caller has checked arity.
    /// `paren` locates errors raised by natives.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        paren: &Token,
        args: Vec<Value>,
    ) -> Result<Value> {
        match self {
            Callable::Native(native) => {
                let result = (native.func)(&args);
                info!("Native function '{}' returned {:?}", native.name, result);
                result.map_err(|message| LoxError::runtime(paren, message))
            }
            Callable::Function(function) => function.call(interpreter, args),
            Callable::Class(class) => LoxClass::instantiate(class, interpreter, args),
        }
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(_) => write!(f, "<native fn>"),
            Callable::Function(function) => write!(f, "<fn {}>", function.name()),
            Callable::Class(class) => write!(f, "{}", class.name),
        }
    }
}

//! Classes, instances and method lookup.
//!
//! Property reads check the instance's own fields, then the runtime class's
//! method table, then each superclass in turn. A class never shares a method
//! table with its parent, so no table is visited twice.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, LoxFunction};
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Name of the method that runs when a class is called.
pub const INITIALIZER: &str = "init";

pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            methods,
        }
    }

    /// Own table first, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Arity of the initializer, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }

    /// Calling a class: build an instance, run `init` on it if there is one,
    /// and hand back the instance whatever `init` did.
    pub fn instantiate<W: Write>(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter<W>,
        args: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method(INITIALIZER) {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, args)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Field, else method bound to `instance`, else an error.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match this.class.find_method(&name.lexeme) {
            Some(method) => {
                let bound = method.bind(Rc::clone(instance));
                Ok(Value::Callable(Callable::Function(Rc::new(bound))))
            }
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Fields need no declaration; writing creates them.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

//! Scope frames.
//!
//! Frames are shared through `Rc<RefCell<_>>`: a frame lives as long as the
//! active call stack or any closure still points at it, and a write through
//! one handle is visible through every other.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A global frame: no enclosing frame.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap `enclosing` in a fresh shared child frame.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<&EnvRef> {
        self.enclosing.as_ref()
    }

    /// Bind (or rebind) `name` in this frame only. Never fails.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup through the chain; used for unresolved (global) names.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The frame exactly `distance` links out from `env`.
    ///
    /// # Panics
    /// If the chain is shorter than `distance`: the resolver computed the
    /// distance against the same nesting, so this is an interpreter bug.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut frame = Rc::clone(env);

        for hop in 0..distance {
            let next = match frame.borrow().enclosing() {
                Some(parent) => Rc::clone(parent),
                None => unreachable!(
                    "scope chain ended after {} of {} hops",
                    hop, distance
                ),
            };
            frame = next;
        }

        frame
    }

    /// Read `name` from the frame `distance` hops out, with no fallback.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Value {
        let frame = Self::ancestor(env, distance);
        let value = frame.borrow().values.get(name).cloned();

        match value {
            Some(value) => value,
            None => unreachable!("resolved name '{}' missing at distance {}", name, distance),
        }
    }

    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) {
        Self::ancestor(env, distance)
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), value);
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

//! Scan → parse → resolve → interpret, for one source text at a time.
//!
//! A [`Session`] keeps the interpreter (and so the global frame) alive across
//! runs, which is what a REPL needs: each line sees the globals of the lines
//! before it, and a failing line leaves them intact.

use std::io::{self, Write};

use log::{debug, info};

use crate::ast::ExprId;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::value::Value;

/// Exit code for static (lex, parse, resolve) errors.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit code for runtime errors.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Result of running one source text.
#[derive(Debug)]
pub enum Outcome {
    Success,
    /// Nothing was executed.
    StaticErrors(Vec<LoxError>),
    /// Execution stopped at this error.
    RuntimeError(LoxError),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::StaticErrors(_) => EXIT_STATIC_ERROR,
            Outcome::RuntimeError(_) => EXIT_RUNTIME_ERROR,
        }
    }

    /// Every diagnostic, in report order.
    pub fn diagnostics(&self) -> Vec<&LoxError> {
        match self {
            Outcome::Success => Vec::new(),
            Outcome::StaticErrors(errors) => errors.iter().collect(),
            Outcome::RuntimeError(error) => vec![error],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

pub struct Session<W: Write = io::Stdout> {
    interpreter: Interpreter<W>,
    next_id: ExprId,
}

impl Default for Session<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl Session<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<W: Write> Session<W> {
    pub fn with_output(output: W) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
            next_id: ExprId(0),
        }
    }

    /// Replace the interpreter's call depth limit.
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.interpreter = self.interpreter.with_max_call_depth(max_call_depth);
        self
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }

    /// Run a complete program.
    pub fn run(&mut self, source: &[u8]) -> Outcome {
        let (tokens, mut errors) = Scanner::new(source).scan_all();

        let mut parser = Parser::starting_at(tokens, self.next_id);
        let parsed = parser.parse();
        self.next_id = parser.next_id();

        let statements = match parsed {
            Ok(statements) if errors.is_empty() => statements,
            Ok(_) => return Outcome::StaticErrors(errors),
            Err(parse_errors) => {
                errors.extend(parse_errors);
                return Outcome::StaticErrors(errors);
            }
        };

        let resolutions = match Resolver::new().resolve(&statements) {
            Ok(resolutions) => resolutions,
            Err(resolve_errors) => return Outcome::StaticErrors(resolve_errors),
        };

        match self.interpreter.interpret(&statements, resolutions) {
            Ok(()) => {
                info!("Run finished");
                Outcome::Success
            }
            Err(error) => {
                debug!("Runtime error: {}", error);
                Outcome::RuntimeError(error)
            }
        }
    }

    /// Parse, resolve and evaluate a single expression.
    pub fn evaluate(&mut self, source: &[u8]) -> Result<Value, Outcome> {
        let (tokens, errors) = Scanner::new(source).scan_all();

        if !errors.is_empty() {
            return Err(Outcome::StaticErrors(errors));
        }

        let mut parser = Parser::starting_at(tokens, self.next_id);
        let parsed = parser.parse_expression();
        self.next_id = parser.next_id();

        let expr = parsed.map_err(|error| Outcome::StaticErrors(vec![error]))?;

        let resolutions = Resolver::new()
            .resolve_expression(&expr)
            .map_err(Outcome::StaticErrors)?;

        self.interpreter
            .evaluate_expression(&expr, resolutions)
            .map_err(Outcome::RuntimeError)
    }
}

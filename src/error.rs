//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Scanner, parser, resolver and runtime all report through [`LoxError`].
//! Static diagnostics render as `[line L] Error<location>: message`; runtime
//! errors render as the message followed by `[line L]` on its own line.
//!
//! The module **does not** print diagnostics itself; the driver decides where
//! they go and which exit code they map to.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error. The scanner has no token to point at, so the
    /// location is always empty.
    #[error("[line {line}] Error: {message}")]
    Lex { message: String, line: usize },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// `""`, `" at end"` or `" at 'lexeme'"`.
        location: String,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error; aborts the current run.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Enables `?` on the output sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Location suffix for a diagnostic anchored at `token`.
fn location_of(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Bare message without line or location decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Static errors (exit code 65) as opposed to runtime ones (70).
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

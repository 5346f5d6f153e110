// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Plugin Language
//!
//! Plugins are small source units written in a bounded, dynamically typed
//! language: a sequence of `fn name(params) { ... }` definitions. Candidate
//! sources are parsed locally by the safety gate and requirement expressions
//! are evaluated by the interpreter runner against a fuel budget.
//!
//! | Module | Purpose |
//! |---|---|
//! | [`token`] | Lexer and byte spans |
//! | [`ast`] | Syntax tree with spans |
//! | [`parser`] | Recursive-descent parser for units and requirement expressions |
//! | [`value`] | Runtime values |
//! | [`interpreter`] | Fuel-bounded evaluator |

pub mod ast;
pub mod interpreter;
pub mod parser;
pub mod token;
pub mod value;

use thiserror::Error;

pub use ast::{Expr, Function, FunctionSummary, Module};
pub use interpreter::{Interpreter, Limits};
pub use parser::{parse_expression, parse_module};
pub use token::Span;
pub use value::Value;

use crate::domain::outcome::ErrorSignature;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("syntax error at byte {offset}: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("function '{name}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("call depth exceeded {0}")]
    RecursionLimit(usize),

    #[error("evaluation fuel exhausted")]
    FuelExhausted,

    #[error("value larger than {0}")]
    ValueTooLarge(usize),

    #[error("expression nesting exceeded {0}")]
    NestingLimit(usize),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl EvalError {
    pub fn signature(&self) -> ErrorSignature {
        match self {
            EvalError::UnknownName(_) => ErrorSignature::UnknownName,
            EvalError::TypeMismatch(_) => ErrorSignature::TypeMismatch,
            EvalError::DivisionByZero => ErrorSignature::DivisionByZero,
            EvalError::Overflow => ErrorSignature::ArithmeticOverflow,
            EvalError::IndexOutOfRange { .. } => ErrorSignature::IndexOutOfRange,
            EvalError::ArityMismatch { .. } => ErrorSignature::ArityMismatch,
            EvalError::RecursionLimit(_) => ErrorSignature::RecursionLimit,
            EvalError::NestingLimit(_) => ErrorSignature::RecursionLimit,
            EvalError::FuelExhausted | EvalError::ValueTooLarge(_) => ErrorSignature::Timeout,
            EvalError::Parse(_) => ErrorSignature::SyntaxError,
        }
    }
}

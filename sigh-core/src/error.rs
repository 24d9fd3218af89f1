use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::span::Span;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("no source files were found at {0}")]
    MissingSources(PathBuf),
    #[error("lexing failed with {} error(s)", .0.len())]
    LexErrors(Vec<Diagnostic>),
    #[error("parse error: {0}")]
    ParseError(Diagnostic),
    #[error("semantic analysis failed with {} error(s)", .0.len())]
    SemanticErrors(Vec<Diagnostic>),
    #[error("runtime error at {span}: {error}")]
    Runtime { error: RuntimeError, span: Span },
}

impl CoreError {
    /// Diagnostics carried by this error, if it stems from the front-end.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            CoreError::LexErrors(diags) | CoreError::SemanticErrors(diags) => diags.clone(),
            CoreError::ParseError(diag) => vec![diag.clone()],
            CoreError::Runtime { error, span } => {
                vec![Diagnostic::error(error.to_string(), *span).with_code("E0300")]
            }
            CoreError::SourceIo(_) | CoreError::MissingSources(_) => Vec::new(),
        }
    }
}

/// Failures raised while evaluating a well-typed program.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("null pointer: {0}")]
    NullPointer(&'static str),
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("unsupported operands: {0}")]
    UnsupportedOperands(String),
    #[error("failed to write program output: {0}")]
    Output(String),
    #[error("internal interpreter error: {0}")]
    Internal(&'static str),
}

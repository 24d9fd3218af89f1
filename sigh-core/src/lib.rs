//! Core of the Sigh language toolchain.
//!
//! The pipeline is:
//!
//!   source .si
//!     -> lexer       (tokens)
//!     -> parser      (surface AST)
//!     -> name_resolve + typecheck (types + HIR)
//!     -> interpreter (values, program output)
//!
//! Higher-level tools (the CLI, tests) should depend on this crate rather
//! than reimplementing the pipeline; `runner` holds the usual entry points.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types, name resolution, type checking, HIR
// ---------------------------------------------------------------------

pub mod types;
pub mod builtins;
pub mod name_resolve;
pub mod typecheck;
pub mod hir;

// ---------------------------------------------------------------------
// Back-end: evaluation
// ---------------------------------------------------------------------

pub mod value;
pub mod environment;
pub mod ops;
pub mod interpreter;

// ---------------------------------------------------------------------
// Sources and orchestration
// ---------------------------------------------------------------------

pub mod sources;
pub mod runner;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use error::{CoreError, RuntimeError};
pub use runner::{check, parse_program, run};
pub use sources::{SourceFile, load_sources};
pub use value::Value;

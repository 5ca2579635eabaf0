//! Gossan backend: CPS tree → holes → lifted lambdas + lowered fragments → C++
//!
//! The pipeline, leaves first:
//! 1. Free-variable ("hole") analysis per lambda node
//! 2. Lambda lifting: each lambda becomes a named callable class
//!    capturing exactly its holes
//! 3. Structural lowering of every expression into ordered
//!    declaration/operation fragments with fresh temporaries
//! 4. Assembly of the fixed runtime boilerplate (tagged value, closure
//!    base, thunk, trampoline) around the generated text
//!
//! The whole thing is a pure function of the input tree: no I/O, no
//! shared state across compilations.

pub mod emit;
pub mod holes;
pub mod lift;
pub mod lower;
pub mod pretty;
pub mod primops;

pub use emit::{compile, emit_cpp};
pub use holes::{compute_holes, HoleMap};
pub use lift::{halt, LambdaLifter, HALT_NAME};
pub use lower::{Fragment, Lowerer, Step};
pub use pretty::reindent;
pub use primops::{apply_primop, is_primop, ValueTag};

use thiserror::Error;

/// Compile-time failures. All of these abort the compilation; there is
/// no partial output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// Node kind recognized by the grammar but deliberately not
    /// implemented in this version (begin, set! forms, void literal)
    #[error("unimplemented expression type: {0}")]
    Unsupported(&'static str),

    /// Application callee name absent from both primitive tables
    #[error("unimplemented primitive operation: {0}")]
    UnknownPrimitive(String),

    /// Operator found in a table, but invoked with an arity the table
    /// does not define for it
    #[error("primitive {op} applied to {got} operand(s)")]
    PrimitiveArity { op: String, got: usize },

    /// Application whose callee is neither a primitive name nor a plain
    /// variable bound to a closure
    #[error("application target is not a plain variable or primitive: {0}")]
    UncallableTarget(String),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

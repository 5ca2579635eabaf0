//! Gossan - C++ back end for a small CPS-form Scheme compiler
//!
//! Given a program already expressed in continuation-passing style,
//! gossan performs closure conversion (lambda lifting with explicit
//! free-variable capture), lowers every expression into an imperative
//! sequence of declarations and operations, and emits one
//! self-contained C++ translation unit: a tagged-union runtime value,
//! a closure base class dispatched by arity, and a trampolined
//! execution loop that gives the program proper tail calls.

pub mod ast;
pub mod codegen;

pub use ast::{Expr, Ident, Lambda, NameGen};
pub use codegen::{
    apply_primop, compile, compute_holes, emit_cpp, halt, is_primop, reindent, CodegenError,
    Fragment, HoleMap, LambdaLifter, Lowerer, ValueTag, HALT_NAME,
};

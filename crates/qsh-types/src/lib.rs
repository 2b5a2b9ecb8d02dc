//! Pure data types for qsh: the value model shared by the kernel and REPL.
//!
//! This crate is a leaf dependency with no async runtime and no I/O. It
//! defines [`Value`], the tagged union every session variable holds, and the
//! conversions between wire text and typed values.

pub mod literal;
pub mod value;

pub use literal::*;
pub use value::*;

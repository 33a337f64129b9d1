//! Runtime-checked structural types for dynamically-typed collections.
//!
//! The pipeline, front to back:
//!
//! - **Parse / AST**: the declaration syntax (`array{id: int}`,
//!   `array<string, User>`) becomes a [`TypeExpr`] tree.
//! - **Compile**: a [`CompileContext`] lowers the tree into interned,
//!   immutable [`Descriptor`]s; structurally identical types share one
//!   `DescriptorId`, so equality is an integer compare.
//! - **Validate**: a [`Validator`] checks dynamic [`Value`]s against
//!   descriptors, with a per-collection cache tag that makes re-checking
//!   an unmutated collection O(1).
//! - **Variance**: [`covariant_ok`] / [`contravariant_ok`] decide whether
//!   one descriptor may replace another across an override boundary.
//! - **Format / Reflect**: descriptors render back to declaration syntax
//!   and export owned summaries for tooling.

pub mod ast;
pub mod boundary;
pub mod compile;
pub mod diagnostics;
pub mod format;
pub mod host;
pub mod intern;
pub mod parse;
pub mod reflect;
pub mod types;
pub mod validate;
pub mod value;
pub mod variance;

pub use ast::{KeyLiteral, ScalarKind, ShapeField, TypeExpr};
pub use boundary::{BoundaryError, check_argument, check_return};
pub use compile::CompileContext;
pub use diagnostics::{CompileError, KeyPath, ValidationFailure};
pub use format::render;
pub use host::{NullHost, TypeHost};
pub use intern::DescriptorInterner;
pub use parse::{ParseError, parse};
pub use reflect::{TypeSummary, describe};
pub use types::{Descriptor, DescriptorId, ScalarMask, ShapeKey};
pub use validate::Validator;
pub use value::{Value, ValueKind, ZArray};
pub use variance::{contravariant_ok, covariant_ok};

#[cfg(test)]
#[path = "../tests/compile_tests.rs"]
mod compile_tests;

#[cfg(test)]
#[path = "../tests/validate_tests.rs"]
mod validate_tests;

#[cfg(test)]
#[path = "../tests/cache_tests.rs"]
mod cache_tests;

#[cfg(test)]
#[path = "../tests/variance_tests.rs"]
mod variance_tests;

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod format_tests;

#[cfg(test)]
#[path = "../tests/boundary_tests.rs"]
mod boundary_tests;

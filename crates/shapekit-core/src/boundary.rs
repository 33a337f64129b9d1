//! Argument and return-value checks at call boundaries.
//!
//! These wrap the validator with the message conventions of the host's
//! typed-failure errors: argument failures name the parameter position
//! and name, return failures say "Return value". A failing value is
//! never coerced or dropped; the caller raises from the message here.

use crate::diagnostics::ValidationFailure;
use crate::format::render;
use crate::host::TypeHost;
use crate::intern::DescriptorInterner;
use crate::types::DescriptorId;
use crate::validate::Validator;
use crate::value::Value;
use tracing::debug;

/// A boundary check failure: the underlying validation failure plus the
/// fully formatted host error message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryError {
    pub message: String,
    pub failure: ValidationFailure,
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BoundaryError {}

/// Check an argument value against its declared type.
///
/// `index` is 1-based, matching the host convention: the first parameter
/// reports as `Argument #1 ($name)`.
pub fn check_argument(
    interner: &DescriptorInterner,
    host: &dyn TypeHost,
    index: u32,
    name: &str,
    value: &Value,
    ty: DescriptorId,
) -> Result<(), BoundaryError> {
    Validator::new(interner, host)
        .check(value, ty)
        .map_err(|failure| {
            let message = argument_message(interner, index, name, value, ty, &failure);
            debug!(argument = index, name, %message, "argument check failed");
            BoundaryError { message, failure }
        })
}

/// Check a return value against the declared return type.
pub fn check_return(
    interner: &DescriptorInterner,
    host: &dyn TypeHost,
    value: &Value,
    ty: DescriptorId,
) -> Result<(), BoundaryError> {
    Validator::new(interner, host)
        .check(value, ty)
        .map_err(|failure| {
            let message = return_message(interner, value, ty, &failure);
            debug!(%message, "return check failed");
            BoundaryError { message, failure }
        })
}

fn argument_message(
    interner: &DescriptorInterner,
    index: u32,
    name: &str,
    value: &Value,
    ty: DescriptorId,
    failure: &ValidationFailure,
) -> String {
    match failure {
        // A top-level kind mismatch uses the host's classic form.
        ValidationFailure::TypeMismatch { path, .. }
        | ValidationFailure::NotACollection { path, .. }
            if path.is_root() =>
        {
            format!(
                "Argument #{index} (${name}) must be of type {}, {} given",
                render(interner, ty),
                value.kind().name()
            )
        }
        _ => format!("Argument #{index} (${name}) {}", failure.message(interner)),
    }
}

fn return_message(
    interner: &DescriptorInterner,
    value: &Value,
    ty: DescriptorId,
    failure: &ValidationFailure,
) -> String {
    match failure {
        ValidationFailure::TypeMismatch { path, .. }
        | ValidationFailure::NotACollection { path, .. }
            if path.is_root() =>
        {
            format!(
                "Return value must be of type {}, {} given",
                render(interner, ty),
                value.kind().name()
            )
        }
        _ => format!("Return value {}", failure.message(interner)),
    }
}

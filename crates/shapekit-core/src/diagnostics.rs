//! Error taxonomy: fatal compile errors and runtime validation failures.
//!
//! Compile errors are raised while turning a parse tree into a
//! descriptor and are never recovered. Validation failures are reported
//! to the boundary caller, which decides whether to raise a host typed
//! failure; this layer never coerces or drops a mismatched value.

use crate::intern::DescriptorInterner;
use crate::types::{DescriptorId, ShapeKey};
use crate::value::ValueKind;
use serde::Serialize;
use std::fmt;

/// Fatal error during descriptor compilation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CompileError {
    /// The same key declared twice in one shape.
    DuplicateKey(String),
    /// A shape key literal that is neither a string nor an integer.
    InvalidKeyLiteral(String),
    /// A name used as an alias (e.g. in `extends`) with no registered
    /// declaration.
    UnresolvedAlias(String),
    /// A child shape override that fails the covariance rule during
    /// inheritance flattening.
    InheritanceNarrowing { parent: String, key: String },
    /// Type expression nested beyond the compiler's depth limit.
    NestingTooDeep,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::DuplicateKey(key) => {
                write!(f, "Duplicate shape key \"{key}\"")
            }
            CompileError::InvalidKeyLiteral(literal) => {
                write!(f, "Shape key must be a string or integer, got {literal}")
            }
            CompileError::UnresolvedAlias(name) => {
                write!(f, "Unresolved type alias \"{name}\"")
            }
            CompileError::InheritanceNarrowing { parent, key } => {
                write!(
                    f,
                    "Shape element \"{key}\" is not compatible with its declaration in parent \"{parent}\""
                )
            }
            CompileError::NestingTooDeep => {
                write!(f, "Type expression nesting exceeds the compiler limit")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Location of a failure inside a nested value, as a sequence of keys
/// from the boundary value down ("address" then "zip").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KeyPath {
    pub segments: Vec<ShapeKey>,
}

impl KeyPath {
    pub fn root() -> KeyPath {
        KeyPath::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn push(&mut self, key: ShapeKey) {
        self.segments.push(key);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }

    /// This path with one more trailing key.
    pub fn with(&self, key: ShapeKey) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.push(key);
        KeyPath { segments }
    }

    /// Render as `a.b.0.c`. The root path renders as an empty string.
    pub fn render(&self, interner: &DescriptorInterner) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match segment {
                ShapeKey::Int(n) => out.push_str(&n.to_string()),
                ShapeKey::Str(atom) => out.push_str(&interner.strings.resolve(*atom)),
            }
        }
        out
    }
}

fn render_key(key: ShapeKey, interner: &DescriptorInterner) -> String {
    match key {
        ShapeKey::Int(n) => n.to_string(),
        ShapeKey::Str(atom) => format!("'{}'", interner.strings.resolve(atom)),
    }
}

fn render_path_key(path: &KeyPath, key: ShapeKey, interner: &DescriptorInterner) -> String {
    let full = path.with(key).render(interner);
    match key {
        ShapeKey::Int(_) if path.is_root() => full,
        _ => format!("'{full}'"),
    }
}

/// Why a value failed validation against a descriptor.
///
/// Exactly one failure is reported per validation, and for a fixed
/// (value, descriptor) pair it is always the same one: shape elements are
/// checked in declaration order, collection elements in enumeration
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ValidationFailure {
    /// A collection descriptor was applied to a non-collection value.
    NotACollection { path: KeyPath, found: ValueKind },
    /// A required shape key is absent.
    MissingField { path: KeyPath, key: ShapeKey },
    /// A closed shape saw a runtime key outside its declared set.
    UnexpectedField { path: KeyPath, key: ShapeKey },
    /// A homogeneous-collection element has the wrong type.
    ElementTypeMismatch {
        path: KeyPath,
        key: ShapeKey,
        expected: DescriptorId,
        found: ValueKind,
    },
    /// A shape field value has the wrong type.
    FieldTypeMismatch {
        path: KeyPath,
        key: ShapeKey,
        expected: DescriptorId,
        found: ValueKind,
    },
    /// A collection key does not conform to the declared key type.
    KeyTypeMismatch {
        path: KeyPath,
        key: ShapeKey,
        expected: DescriptorId,
    },
    /// The whole value failed a non-collection descriptor (scalar,
    /// nominal, union, intersection) at the boundary.
    TypeMismatch {
        path: KeyPath,
        expected: DescriptorId,
        found: ValueKind,
    },
    /// Value nesting exceeded the validator's recursion limit.
    DepthLimitExceeded { path: KeyPath },
}

impl ValidationFailure {
    /// The location of the failure.
    pub fn path(&self) -> &KeyPath {
        match self {
            ValidationFailure::NotACollection { path, .. }
            | ValidationFailure::MissingField { path, .. }
            | ValidationFailure::UnexpectedField { path, .. }
            | ValidationFailure::ElementTypeMismatch { path, .. }
            | ValidationFailure::FieldTypeMismatch { path, .. }
            | ValidationFailure::KeyTypeMismatch { path, .. }
            | ValidationFailure::TypeMismatch { path, .. }
            | ValidationFailure::DepthLimitExceeded { path } => path,
        }
    }

    /// Human-readable description, with the full key path so a nested
    /// failure reads like: field 'address.zip' must be of type string.
    pub fn message(&self, interner: &DescriptorInterner) -> String {
        use crate::format::render;
        match self {
            ValidationFailure::NotACollection { path, found } if path.is_root() => {
                format!("value must be an array, {} given", found.name())
            }
            ValidationFailure::NotACollection { path, found } => {
                format!(
                    "field '{}' must be an array, {} given",
                    path.render(interner),
                    found.name()
                )
            }
            ValidationFailure::MissingField { path, key } => {
                format!(
                    "missing required key {}",
                    render_path_key(path, *key, interner)
                )
            }
            ValidationFailure::UnexpectedField { path, key } => {
                format!(
                    "unexpected key {} not allowed by closed shape",
                    render_path_key(path, *key, interner)
                )
            }
            ValidationFailure::ElementTypeMismatch {
                path,
                key,
                expected,
                found,
            } => {
                format!(
                    "element {} must be of type {}, {} given",
                    render_path_key(path, *key, interner),
                    render(interner, *expected),
                    found.name()
                )
            }
            ValidationFailure::FieldTypeMismatch {
                path,
                key,
                expected,
                found,
            } => {
                format!(
                    "key {} must be of type {}, {} given",
                    render_path_key(path, *key, interner),
                    render(interner, *expected),
                    found.name()
                )
            }
            ValidationFailure::KeyTypeMismatch {
                path,
                key,
                expected,
            } => {
                let rendered = render_key(*key, interner);
                if path.is_root() {
                    format!(
                        "array key {} must be of type {}",
                        rendered,
                        render(interner, *expected)
                    )
                } else {
                    format!(
                        "array key {} of field '{}' must be of type {}",
                        rendered,
                        path.render(interner),
                        render(interner, *expected)
                    )
                }
            }
            ValidationFailure::TypeMismatch {
                path,
                expected,
                found,
            } if path.is_root() => {
                format!(
                    "value must be of type {}, {} given",
                    render(interner, *expected),
                    found.name()
                )
            }
            ValidationFailure::TypeMismatch {
                path,
                expected,
                found,
            } => {
                format!(
                    "field '{}' must be of type {}, {} given",
                    path.render(interner),
                    render(interner, *expected),
                    found.name()
                )
            }
            ValidationFailure::DepthLimitExceeded { path } if path.is_root() => {
                "value nesting exceeds the validation depth limit".to_string()
            }
            ValidationFailure::DepthLimitExceeded { path } => {
                format!(
                    "value nesting at '{}' exceeds the validation depth limit",
                    path.render(interner)
                )
            }
        }
    }
}

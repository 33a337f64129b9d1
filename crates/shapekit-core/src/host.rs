//! Hooks into the host's nominal type system.
//!
//! Scalar kinds are checked directly against the value model, but class
//! and interface semantics (instance-of, subclass relations) belong to
//! the host interpreter. The validator and variance checker call through
//! this trait; the defaults treat nominal types as equal-by-name only.

use shapekit_common::Atom;

/// External collaborator for nominal (class/interface) decisions.
pub trait TypeHost {
    /// Does an instance of `value_class` satisfy the declared type
    /// `expected`?
    fn is_instance_of(&self, value_class: Atom, expected: Atom) -> bool {
        value_class == expected
    }

    /// Is nominal type `new` a valid covariant replacement for `base`?
    /// (Typically: `new` is `base` or a subclass of it.)
    fn nominal_covariant(&self, new: Atom, base: Atom) -> bool {
        new == base
    }
}

/// Host with no class hierarchy: names match only themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost;

impl TypeHost for NullHost {}

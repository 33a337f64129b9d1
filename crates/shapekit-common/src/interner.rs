//! String interner for key and type-name deduplication.
//!
//! Shape keys and class names repeat heavily across declarations ("id",
//! "name", "value", ...). Interning stores each distinct string once and
//! hands out a `u32` handle (`Atom`), so key comparison during validation
//! is an integer compare instead of a string compare, and every shape
//! element sharing a key shares one allocation for the whole program.

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with `==` in
/// O(1). To get the actual string back, use `resolve` on the interner that
/// produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Strings pre-interned at startup: the scalar type names the compiler
/// matches on, plus shape keys that show up in virtually every codebase.
const COMMON_STRINGS: &[&str] = &[
    // Scalar type names
    "null",
    "bool",
    "true",
    "false",
    "int",
    "float",
    "string",
    "array",
    "object",
    "mixed",
    // Common shape keys
    "id",
    "name",
    "value",
    "key",
    "type",
    "data",
    "email",
    "title",
    "status",
    "count",
    "items",
    "user",
    "address",
    "city",
    "zip",
];

/// Thread-safe string interner shared across compilation contexts.
///
/// Lookups go through a lock-free `DashMap`; only the first interning of
/// a new string takes the `strings` mutex to assign the next index.
pub struct ShardedInterner {
    map: DashMap<Arc<str>, Atom, FxBuildHasher>,
    strings: Mutex<Vec<Arc<str>>>,
}

impl Default for ShardedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardedInterner {
    /// Create a new interner with the empty string at index 0 and the
    /// common strings pre-interned.
    pub fn new() -> Self {
        let interner = ShardedInterner {
            map: DashMap::with_hasher(FxBuildHasher),
            strings: Mutex::new(Vec::with_capacity(256)),
        };
        {
            let mut strings = interner.strings.lock().expect("interner lock poisoned");
            let empty: Arc<str> = Arc::from("");
            strings.push(empty.clone());
            interner.map.insert(empty, Atom::NONE);
        }
        for s in COMMON_STRINGS {
            interner.intern(s);
        }
        interner
    }

    /// Intern a string, returning its Atom handle.
    pub fn intern(&self, s: &str) -> Atom {
        if let Some(atom) = self.map.get(s) {
            return *atom;
        }
        let mut strings = self.strings.lock().expect("interner lock poisoned");
        // Re-check under the lock: another thread may have won the race.
        if let Some(atom) = self.map.get(s) {
            return *atom;
        }
        let atom = Atom(strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        strings.push(owned.clone());
        self.map.insert(owned, atom);
        atom
    }

    /// Resolve an Atom back to its string value.
    /// Returns the empty string if the atom is out of bounds.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let strings = self.strings.lock().expect("interner lock poisoned");
        strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Number of interned strings (including the empty string).
    pub fn len(&self) -> usize {
        self.strings.lock().expect("interner lock poisoned").len()
    }

    /// Check if the interner holds only the pre-interned strings.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates() {
        let interner = ShardedInterner::new();
        let a1 = interner.intern("user_id");
        let a2 = interner.intern("user_id");
        assert_eq!(a1, a2);
        assert_eq!(interner.resolve(a1).as_ref(), "user_id");
    }

    #[test]
    fn none_atom_is_empty_string() {
        let interner = ShardedInterner::new();
        assert_eq!(interner.resolve(Atom::NONE).as_ref(), "");
        assert!(Atom::NONE.is_none());
    }

    #[test]
    fn distinct_strings_get_distinct_atoms() {
        let interner = ShardedInterner::new();
        let a = interner.intern("name");
        let b = interner.intern("email");
        assert_ne!(a, b);
        assert_eq!(interner.resolve(a).as_ref(), "name");
        assert_eq!(interner.resolve(b).as_ref(), "email");
    }

    #[test]
    fn sharded_interner_is_consistent() {
        let interner = ShardedInterner::new();
        let a1 = interner.intern("address");
        let a2 = interner.intern("address");
        assert_eq!(a1, a2);
        assert_eq!(interner.resolve(a1).as_ref(), "address");
    }

    #[test]
    fn sharded_interner_survives_threads() {
        let interner = std::sync::Arc::new(ShardedInterner::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = interner.clone();
                std::thread::spawn(move || interner.intern("shared_key"))
            })
            .collect();
        let atoms: Vec<Atom> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(atoms.windows(2).all(|w| w[0] == w[1]));
    }
}

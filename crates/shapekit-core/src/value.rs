//! The dynamic value model the validator checks against descriptors.
//!
//! `ZArray` is the host's ordered associative collection: int or
//! interned-string keys, insertion-order enumeration. It carries the
//! per-instance validation-cache slot; every structural mutation clears
//! the slot eagerly, at the mutation site, so a stale tag can never
//! produce a false pass.

use crate::types::ShapeKey;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use shapekit_common::Atom;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The runtime kind of a value, for failure reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Lowercase kind name as it appears in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

/// An instance of a nominal class, reduced to what validation needs:
/// the class name. Instance-of decisions go through the host hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectHandle {
    pub class: Atom,
}

/// A dynamically-typed host value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Array(ZArray),
    Object(ObjectHandle),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn as_array(&self) -> Option<&ZArray> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ZArray> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn object(class: Atom) -> Value {
        Value::Object(ObjectHandle { class })
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(Arc::from(s.into_boxed_str()))
    }
}

impl From<ZArray> for Value {
    fn from(arr: ZArray) -> Value {
        Value::Array(arr)
    }
}

/// Tag value meaning "nothing validated yet".
const CACHE_EMPTY: u64 = 0;

/// Ordered associative collection with a validation-cache slot.
///
/// The cache slot stores the element-kind tag of the last homogeneous
/// collection descriptor this instance fully validated against. Reads
/// and writes are atomic so concurrent read-only validators stay safe;
/// mutation requires `&mut self`, which gives the single-writer
/// discipline the invalidation relies on.
#[derive(Debug, Default)]
pub struct ZArray {
    entries: IndexMap<ShapeKey, Value, FxBuildHasher>,
    /// Next auto-index for `push`, mirroring the host's append rule.
    next_index: i64,
    cache: AtomicU64,
}

impl ZArray {
    pub fn new() -> ZArray {
        ZArray::default()
    }

    pub fn with_capacity(capacity: usize) -> ZArray {
        ZArray {
            entries: IndexMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            next_index: 0,
            cache: AtomicU64::new(CACHE_EMPTY),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or update an entry. Invalidates the validation cache.
    ///
    /// An integer key at `i64::MAX` pins the auto-index rather than
    /// wrapping it, so a later `push` never reuses a small key.
    pub fn insert(&mut self, key: ShapeKey, value: impl Into<Value>) {
        self.invalidate();
        if let ShapeKey::Int(n) = key {
            if n >= self.next_index {
                self.next_index = n.checked_add(1).unwrap_or(i64::MAX);
            }
        }
        self.entries.insert(key, value.into());
    }

    /// Append with the next auto-index key. Invalidates the cache.
    pub fn push(&mut self, value: impl Into<Value>) {
        let key = ShapeKey::Int(self.next_index);
        self.insert(key, value);
    }

    /// Remove an entry, preserving the order of the rest. Invalidates
    /// the cache.
    pub fn remove(&mut self, key: ShapeKey) -> Option<Value> {
        self.invalidate();
        self.entries.shift_remove(&key)
    }

    /// Remove all entries. Invalidates the cache.
    pub fn clear(&mut self) {
        self.invalidate();
        self.next_index = 0;
        self.entries.clear();
    }

    pub fn get(&self, key: ShapeKey) -> Option<&Value> {
        self.entries.get(&key)
    }

    /// Mutable access to an entry. Conservatively invalidates the cache:
    /// the caller may rewrite the value through the returned reference.
    pub fn get_mut(&mut self, key: ShapeKey) -> Option<&mut Value> {
        self.invalidate();
        self.entries.get_mut(&key)
    }

    pub fn contains_key(&self, key: ShapeKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Entries in enumeration order (insertion order).
    pub fn iter(&self) -> impl Iterator<Item = (&ShapeKey, &Value)> {
        self.entries.iter()
    }

    #[inline]
    fn invalidate(&mut self) {
        self.cache.store(CACHE_EMPTY, Ordering::Relaxed);
    }

    /// The element-kind tag of the last fully successful homogeneous
    /// collection validation, or 0 if none.
    pub(crate) fn cache_tag(&self) -> u64 {
        self.cache.load(Ordering::Relaxed)
    }

    pub(crate) fn set_cache_tag(&self, tag: u64) {
        self.cache.store(tag, Ordering::Relaxed);
    }
}

impl Clone for ZArray {
    fn clone(&self) -> ZArray {
        // The clone is a distinct instance; it starts with a cold cache.
        ZArray {
            entries: self.entries.clone(),
            next_index: self.next_index,
            cache: AtomicU64::new(CACHE_EMPTY),
        }
    }
}

impl PartialEq for ZArray {
    fn eq(&self, other: &ZArray) -> bool {
        self.entries == other.entries
    }
}

impl FromIterator<(ShapeKey, Value)> for ZArray {
    fn from_iter<I: IntoIterator<Item = (ShapeKey, Value)>>(iter: I) -> ZArray {
        let mut arr = ZArray::new();
        for (key, value) in iter {
            arr.insert(key, value);
        }
        arr
    }
}

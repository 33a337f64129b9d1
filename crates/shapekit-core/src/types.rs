//! The descriptor model: compiled, immutable representations of declared
//! types.
//!
//! A `Descriptor` is a small copyable enum; anything bigger than a couple
//! of words (union member lists, shape records, array-of records) lives in
//! the [`DescriptorInterner`](crate::intern::DescriptorInterner) arena and
//! is referenced by index. Nested descriptors are shared, never
//! deep-copied, so compilation and comparison stay proportional to the
//! size of the type expression.

use bitflags::bitflags;
use serde::Serialize;
use shapekit_common::Atom;

bitflags! {
    /// Bitmask of primitive kinds a scalar descriptor accepts.
    ///
    /// A single mask can represent a union of several scalar kinds
    /// (`int|string` is one mask with two bits), which keeps scalar
    /// unions out of the list arena entirely.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ScalarMask: u32 {
        const NULL   = 1 << 0;
        const FALSE  = 1 << 1;
        const TRUE   = 1 << 2;
        const INT    = 1 << 3;
        const FLOAT  = 1 << 4;
        const STRING = 1 << 5;
        const ARRAY  = 1 << 6;
        const OBJECT = 1 << 7;

        const BOOL = Self::FALSE.bits() | Self::TRUE.bits();
        const MIXED = Self::NULL.bits()
            | Self::BOOL.bits()
            | Self::INT.bits()
            | Self::FLOAT.bits()
            | Self::STRING.bits()
            | Self::ARRAY.bits()
            | Self::OBJECT.bits();
    }
}

impl ScalarMask {
    /// The mask without its NULL bit.
    #[inline]
    pub fn without_null(self) -> ScalarMask {
        self & !ScalarMask::NULL
    }

    /// Whether the mask covers exactly one displayable kind.
    ///
    /// `bool` counts as one kind even though it occupies two bits.
    pub fn is_single_kind(self) -> bool {
        if self == ScalarMask::BOOL {
            return true;
        }
        self.bits().count_ones() == 1
    }
}

/// Handle to an interned descriptor.
///
/// Two identical type expressions compile to the same `DescriptorId`, so
/// id equality implies structural equality. The converse does not hold
/// for unions (member order is preserved for display but insignificant
/// for equality); use [`DescriptorInterner::equivalent`] for semantic
/// comparison.
///
/// [`DescriptorInterner::equivalent`]: crate::intern::DescriptorInterner::equivalent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
pub struct DescriptorId(pub u32);

/// Handle to an interned union/intersection member list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ListId(pub u32);

/// Handle to an interned shape record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ShapeId(pub u32);

/// Handle to an interned array-of record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ArrayOfId(pub u32);

/// A compiled type descriptor.
///
/// Immutable once constructed. Composite variants hold arena indices
/// rather than owned children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Descriptor {
    /// Primitive kind bitmask, possibly a union of several kinds.
    Scalar(ScalarMask),
    /// A named class/interface type, resolved lazily by the host.
    Nominal(Atom),
    /// Union of descriptors (`T|U`). Non-empty.
    Union(ListId),
    /// Intersection of descriptors (`A&B`). Non-empty.
    Intersection(ListId),
    /// Homogeneous collection (`array<T>` / `array<K, V>`).
    ArrayOf(ArrayOfId),
    /// Structural record (`array{key: T, ...}`).
    Shape(ShapeId),
}

/// A shape element key: interned string or integer literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
pub enum ShapeKey {
    Int(i64),
    Str(Atom),
}

/// One `key: type` pair of a shape record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeElement {
    pub key: ShapeKey,
    pub ty: DescriptorId,
    /// Declared with `key?: type`; absence of the key is permitted.
    pub optional: bool,
}

/// A structural record type: a fixed set of keyed, independently typed,
/// optionally-optional elements.
///
/// Element order is significant for display and for the deterministic
/// first-failure rule, but not for equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeRecord {
    pub elements: Vec<ShapeElement>,
    /// A closed shape rejects runtime keys outside the declared set.
    pub closed: bool,
    /// DJB2 digest over count, keys, pure type masks, and optional flags.
    /// Equal hashes make two shapes candidates for equality; full
    /// comparison is still required.
    pub hash: u32,
}

impl ShapeRecord {
    /// Number of non-optional elements.
    pub fn required_count(&self) -> usize {
        self.elements.iter().filter(|e| !e.optional).count()
    }

    /// Find an element by key. Linear scan; shapes are small and the
    /// validator walks them in declaration order anyway.
    pub fn find(&self, key: ShapeKey) -> Option<&ShapeElement> {
        self.elements.iter().find(|e| e.key == key)
    }
}

/// A homogeneous collection type: every element (and optionally every
/// key) conforms to one declared descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArrayOf {
    pub element: DescriptorId,
    /// Declared key type, when the syntax was `array<K, V>`.
    pub key: Option<DescriptorId>,
    /// Count of directly nested array-of layers: `array<int>` has depth
    /// 1, `array<array<int>>` depth 2. A shape element does not count.
    pub depth: u8,
}

/// DJB2 hash, seeded and mixed exactly like the shape digest of the
/// engine this model descends from: `h = (h << 5) + h ^ v`.
#[inline]
pub(crate) fn djb2_mix(hash: u32, value: u32) -> u32 {
    (hash.wrapping_shl(5).wrapping_add(hash)) ^ value
}

pub(crate) const DJB2_SEED: u32 = 5381;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_is_a_single_display_kind() {
        assert!(ScalarMask::BOOL.is_single_kind());
        assert!(ScalarMask::INT.is_single_kind());
        assert!(!(ScalarMask::INT | ScalarMask::STRING).is_single_kind());
        assert!(!(ScalarMask::BOOL | ScalarMask::INT).is_single_kind());
    }

    #[test]
    fn mixed_covers_every_kind() {
        assert!(ScalarMask::MIXED.contains(ScalarMask::NULL));
        assert!(ScalarMask::MIXED.contains(ScalarMask::BOOL));
        assert!(ScalarMask::MIXED.contains(ScalarMask::ARRAY));
        assert!(ScalarMask::MIXED.contains(ScalarMask::OBJECT));
    }

    #[test]
    fn without_null_strips_only_null() {
        let mask = ScalarMask::NULL | ScalarMask::STRING;
        assert_eq!(mask.without_null(), ScalarMask::STRING);
    }
}

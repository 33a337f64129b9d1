//! Variance checking between compiled descriptors.
//!
//! `covariant_ok(new, base)` answers "may `new` stand where `base` was
//! promised?" — return positions and shape-field overrides. The
//! contravariant direction is the mirror question for parameter
//! positions. Both are conservative: when neither rule applies, the
//! answer is no.
//!
//! Shapes compare structurally by key, not by position, and the
//! open/closed flag does not participate: it is an extra-key policy for
//! runtime values, not part of the declared field set.

use crate::host::TypeHost;
use crate::intern::DescriptorInterner;
use crate::types::{Descriptor, DescriptorId, ScalarMask, ShapeElement, ShapeId, ShapeKey};
use rustc_hash::FxHashMap;

/// May `new` replace `base` in a covariant (output) position?
pub fn covariant_ok(
    interner: &DescriptorInterner,
    host: &dyn TypeHost,
    new: DescriptorId,
    base: DescriptorId,
) -> bool {
    if interner.equivalent(new, base) {
        return true;
    }
    match (interner.descriptor(new), interner.descriptor(base)) {
        // Everything narrows mixed.
        (_, Descriptor::Scalar(mask)) if mask == ScalarMask::MIXED => true,
        (Descriptor::Scalar(n), Descriptor::Scalar(b)) => b.contains(n),
        (Descriptor::Nominal(n), Descriptor::Nominal(b)) => host.nominal_covariant(n, b),
        // A union replacement: every member must fit the base.
        (Descriptor::Union(list), _) => interner
            .list(list)
            .iter()
            .all(|&m| covariant_ok(interner, host, m, base)),
        // A union base: the replacement must fit some member.
        (_, Descriptor::Union(list)) => interner
            .list(list)
            .iter()
            .any(|&m| covariant_ok(interner, host, new, m)),
        // An intersection base: the replacement must fit every member.
        (_, Descriptor::Intersection(list)) => interner
            .list(list)
            .iter()
            .all(|&m| covariant_ok(interner, host, new, m)),
        // An intersection replacement: some member fitting the base is
        // enough, since a conforming value satisfies all members.
        (Descriptor::Intersection(list), _) => interner
            .list(list)
            .iter()
            .any(|&m| covariant_ok(interner, host, m, base)),
        (Descriptor::ArrayOf(n), Descriptor::ArrayOf(b)) => {
            let (an, ab) = (interner.array_of(n), interner.array_of(b));
            if !covariant_ok(interner, host, an.element, ab.element) {
                return false;
            }
            match (an.key, ab.key) {
                (None, None) => true,
                // An unkeyed base accepts any key type.
                (_, None) => true,
                (Some(kn), Some(kb)) => covariant_ok(interner, host, kn, kb),
                (None, Some(_)) => false,
            }
        }
        (Descriptor::Shape(n), Descriptor::Shape(b)) => shape_covariant(interner, host, n, b),
        // A shape narrows any non-shape base; a non-shape never narrows
        // a shape.
        (Descriptor::Shape(_), _) => true,
        (_, Descriptor::Shape(_)) => false,
        // Array-of values are collections, so they narrow a scalar base
        // that admits arrays.
        (Descriptor::ArrayOf(_), Descriptor::Scalar(mask)) => mask.contains(ScalarMask::ARRAY),
        _ => false,
    }
}

/// May `new` replace `base` in a contravariant (parameter) position?
/// `new` must accept everything `base` accepted.
pub fn contravariant_ok(
    interner: &DescriptorInterner,
    host: &dyn TypeHost,
    new: DescriptorId,
    base: DescriptorId,
) -> bool {
    match (interner.descriptor(new), interner.descriptor(base)) {
        (Descriptor::Shape(n), Descriptor::Shape(b)) => shape_contravariant(interner, host, n, b),
        // Outside shape pairs, widening is covariance read backwards.
        _ => covariant_ok(interner, host, base, new),
    }
}

/// Shape covariance: the replacement keeps every declared field of the
/// base, required fields stay required, and each kept field's type
/// narrows. Extra fields in the replacement are fine.
fn shape_covariant(
    interner: &DescriptorInterner,
    host: &dyn TypeHost,
    new: ShapeId,
    base: ShapeId,
) -> bool {
    let (sn, sb) = (interner.shape(new), interner.shape(base));
    let by_key: FxHashMap<ShapeKey, &ShapeElement> =
        sn.elements.iter().map(|e| (e.key, e)).collect();
    sb.elements.iter().all(|be| match by_key.get(&be.key) {
        Some(ne) => {
            (be.optional || !ne.optional) && covariant_ok(interner, host, ne.ty, be.ty)
        }
        // A base-optional field may be dropped entirely.
        None => be.optional,
    })
}

/// Shape contravariance: the replacement may not demand anything the
/// base did not. Every field the replacement requires must be required
/// by the base with a type the replacement widens; optional replacement
/// fields impose no constraint.
fn shape_contravariant(
    interner: &DescriptorInterner,
    host: &dyn TypeHost,
    new: ShapeId,
    base: ShapeId,
) -> bool {
    let (sn, sb) = (interner.shape(new), interner.shape(base));
    let by_key: FxHashMap<ShapeKey, &ShapeElement> =
        sb.elements.iter().map(|e| (e.key, e)).collect();
    sn.elements.iter().all(|ne| {
        if ne.optional {
            return true;
        }
        match by_key.get(&ne.key) {
            // A field required here that the base never guaranteed would
            // break existing callers.
            Some(be) => !be.optional && covariant_ok(interner, host, be.ty, ne.ty),
            None => false,
        }
    })
}

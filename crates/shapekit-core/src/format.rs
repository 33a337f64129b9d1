//! Canonical text rendering of descriptors.
//!
//! The output is the declaration syntax itself: `array<int>`,
//! `array<string, User>`, `array{id: int, name?: string}` (with a
//! trailing `!` on closed shapes), `int|string`, `A&B`, and `?T` when a
//! type admits null plus exactly one other kind. Rendering a compiled
//! descriptor and re-compiling the text yields an equivalent descriptor.

use crate::intern::DescriptorInterner;
use crate::types::{Descriptor, DescriptorId, ScalarMask, ShapeKey};
use std::fmt::Write;

const KIND_NAMES: &[(ScalarMask, &str)] = &[
    (ScalarMask::BOOL, "bool"),
    (ScalarMask::TRUE, "true"),
    (ScalarMask::FALSE, "false"),
    (ScalarMask::INT, "int"),
    (ScalarMask::FLOAT, "float"),
    (ScalarMask::STRING, "string"),
    (ScalarMask::ARRAY, "array"),
    (ScalarMask::OBJECT, "object"),
];

/// Render a descriptor in canonical declaration syntax.
pub fn render(interner: &DescriptorInterner, id: DescriptorId) -> String {
    let mut out = String::new();
    write_descriptor(interner, id, &mut out, false);
    out
}

fn write_descriptor(interner: &DescriptorInterner, id: DescriptorId, out: &mut String, nested: bool) {
    match interner.descriptor(id) {
        Descriptor::Scalar(mask) => write_scalar(mask, out),
        Descriptor::Nominal(name) => out.push_str(&interner.strings.resolve(name)),
        Descriptor::Union(list) => {
            let members = interner.list(list);
            // `T|null` pairs render with the null-prefix form.
            if let Some(other) = null_union_partner(interner, members) {
                out.push('?');
                write_descriptor(interner, other, out, true);
                return;
            }
            if nested {
                out.push('(');
            }
            for (i, &member) in members.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                write_descriptor(interner, member, out, true);
            }
            if nested {
                out.push(')');
            }
        }
        Descriptor::Intersection(list) => {
            if nested {
                out.push('(');
            }
            for (i, &member) in interner.list(list).iter().enumerate() {
                if i > 0 {
                    out.push('&');
                }
                write_descriptor(interner, member, out, true);
            }
            if nested {
                out.push(')');
            }
        }
        Descriptor::ArrayOf(arr) => {
            let record = interner.array_of(arr);
            out.push_str("array<");
            if let Some(key) = record.key {
                write_descriptor(interner, key, out, false);
                out.push_str(", ");
            }
            write_descriptor(interner, record.element, out, false);
            out.push('>');
        }
        Descriptor::Shape(shape) => {
            let record = interner.shape(shape);
            out.push_str("array{");
            for (i, element) in record.elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_key(interner, element.key, out);
                if element.optional {
                    out.push('?');
                }
                out.push_str(": ");
                write_descriptor(interner, element.ty, out, false);
            }
            out.push('}');
            if record.closed {
                out.push('!');
            }
        }
    }
}

fn write_scalar(mask: ScalarMask, out: &mut String) {
    if mask == ScalarMask::MIXED {
        out.push_str("mixed");
        return;
    }
    if mask.is_empty() {
        out.push_str("never");
        return;
    }
    let body = mask.without_null();
    if mask.contains(ScalarMask::NULL) {
        if body.is_empty() {
            out.push_str("null");
            return;
        }
        if body.is_single_kind() {
            out.push('?');
        }
    }
    let mut first = true;
    let mut remaining = body;
    for &(kind, name) in KIND_NAMES {
        if remaining.contains(kind) {
            if !first {
                out.push('|');
            }
            out.push_str(name);
            remaining &= !kind;
            first = false;
        }
    }
    // Multi-kind nullable masks spell the null member out.
    if mask.contains(ScalarMask::NULL) && !body.is_single_kind() {
        out.push_str("|null");
    }
}

fn write_key(interner: &DescriptorInterner, key: ShapeKey, out: &mut String) {
    match key {
        ShapeKey::Int(n) => {
            let _ = write!(out, "{n}");
        }
        ShapeKey::Str(atom) => {
            let s = interner.strings.resolve(atom);
            if is_bare_key(&s) {
                out.push_str(&s);
            } else {
                let _ = write!(out, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"));
            }
        }
    }
}

fn is_bare_key(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// For a two-member union where one side is the bare null scalar,
/// the other member; otherwise `None`.
fn null_union_partner(
    interner: &DescriptorInterner,
    members: &[DescriptorId],
) -> Option<DescriptorId> {
    if members.len() != 2 {
        return None;
    }
    let is_null = |id: DescriptorId| {
        matches!(interner.descriptor(id), Descriptor::Scalar(mask) if mask == ScalarMask::NULL)
    };
    if is_null(members[0]) {
        Some(members[1])
    } else if is_null(members[1]) {
        Some(members[0])
    } else {
        None
    }
}

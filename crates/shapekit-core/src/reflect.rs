//! Structured introspection of compiled descriptors.
//!
//! Where [`crate::format`] produces the declaration syntax for error
//! messages, this module produces an owned, serializable tree for
//! tooling: reflection APIs, debuggers, and dumps.

use crate::format;
use crate::intern::DescriptorInterner;
use crate::types::{Descriptor, DescriptorId, ScalarMask, ShapeKey};
use serde::Serialize;

/// An owned snapshot of a descriptor, detached from the arena.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeSummary {
    Scalar {
        kinds: Vec<&'static str>,
        nullable: bool,
    },
    Nominal {
        name: String,
    },
    Union {
        members: Vec<TypeSummary>,
    },
    Intersection {
        members: Vec<TypeSummary>,
    },
    ArrayOf {
        key: Option<Box<TypeSummary>>,
        element: Box<TypeSummary>,
        depth: u8,
    },
    Shape {
        fields: Vec<FieldSummary>,
        /// Number of non-optional fields.
        required: usize,
        closed: bool,
        hash: u32,
    },
}

/// One shape field in a [`TypeSummary`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldSummary {
    pub key: String,
    pub ty: TypeSummary,
    pub optional: bool,
}

/// Build an owned summary of a descriptor.
pub fn describe(interner: &DescriptorInterner, id: DescriptorId) -> TypeSummary {
    match interner.descriptor(id) {
        Descriptor::Scalar(mask) => TypeSummary::Scalar {
            kinds: kind_names(mask.without_null()),
            nullable: mask.contains(ScalarMask::NULL),
        },
        Descriptor::Nominal(name) => TypeSummary::Nominal {
            name: interner.strings.resolve(name).to_string(),
        },
        Descriptor::Union(list) => TypeSummary::Union {
            members: interner
                .list(list)
                .iter()
                .map(|&m| describe(interner, m))
                .collect(),
        },
        Descriptor::Intersection(list) => TypeSummary::Intersection {
            members: interner
                .list(list)
                .iter()
                .map(|&m| describe(interner, m))
                .collect(),
        },
        Descriptor::ArrayOf(arr) => {
            let record = interner.array_of(arr);
            TypeSummary::ArrayOf {
                key: record.key.map(|k| Box::new(describe(interner, k))),
                element: Box::new(describe(interner, record.element)),
                depth: record.depth,
            }
        }
        Descriptor::Shape(shape) => {
            let record = interner.shape(shape);
            TypeSummary::Shape {
                required: record.required_count(),
                fields: record
                    .elements
                    .iter()
                    .map(|e| FieldSummary {
                        key: match e.key {
                            ShapeKey::Int(n) => n.to_string(),
                            ShapeKey::Str(atom) => interner.strings.resolve(atom).to_string(),
                        },
                        ty: describe(interner, e.ty),
                        optional: e.optional,
                    })
                    .collect(),
                closed: record.closed,
                hash: record.hash,
            }
        }
    }
}

/// Canonical declaration syntax for a descriptor. Shorthand for
/// [`format::render`].
pub fn stringify(interner: &DescriptorInterner, id: DescriptorId) -> String {
    format::render(interner, id)
}

/// Count of directly nested homogeneous-collection layers; 0 for
/// non-collection descriptors and for shapes.
pub fn nesting_depth(interner: &DescriptorInterner, id: DescriptorId) -> u8 {
    match interner.descriptor(id) {
        Descriptor::ArrayOf(arr) => interner.array_of(arr).depth,
        _ => 0,
    }
}

fn kind_names(mask: ScalarMask) -> Vec<&'static str> {
    const ORDER: &[(ScalarMask, &str)] = &[
        (ScalarMask::BOOL, "bool"),
        (ScalarMask::TRUE, "true"),
        (ScalarMask::FALSE, "false"),
        (ScalarMask::INT, "int"),
        (ScalarMask::FLOAT, "float"),
        (ScalarMask::STRING, "string"),
        (ScalarMask::ARRAY, "array"),
        (ScalarMask::OBJECT, "object"),
    ];
    let mut names = Vec::new();
    let mut remaining = mask;
    for &(kind, name) in ORDER {
        if remaining.contains(kind) {
            names.push(name);
            remaining &= !kind;
        }
    }
    names
}

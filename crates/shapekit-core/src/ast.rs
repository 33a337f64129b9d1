//! The type-expression parse tree consumed by the compiler.
//!
//! This tree is normally produced by the host grammar; the compiler
//! assumes it is syntactically valid but still guards the cases a
//! grammar cannot express (duplicate shape keys, non-string/non-int key
//! literals, unresolved alias names). Names and keys are plain strings
//! here; the compiler interns them.

use crate::types::ScalarMask;

/// A type expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeExpr {
    /// A built-in scalar kind (`int`, `string`, `mixed`, ...).
    Scalar(ScalarKind),
    /// A name: a registered type alias, or otherwise a class/interface
    /// reference resolved lazily by the host.
    Name(String),
    /// `?T`
    Nullable(Box<TypeExpr>),
    /// `T|U|V`
    Union(Vec<TypeExpr>),
    /// `A&B`
    Intersection(Vec<TypeExpr>),
    /// `array<T>` or `array<K, V>`
    ArrayOf {
        key: Option<Box<TypeExpr>>,
        element: Box<TypeExpr>,
    },
    /// `array{key: T, key2?: U}` with optional `extends` parent alias
    /// and open/closed extra-key policy.
    Shape {
        fields: Vec<ShapeField>,
        closed: bool,
        extends: Option<String>,
    },
}

/// One `key: type` field of a shape expression.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeField {
    pub key: KeyLiteral,
    pub ty: TypeExpr,
    pub optional: bool,
}

/// A shape key literal as parsed. Only string and integer keys are
/// legal; the other variants exist so the compiler can reject them with
/// `CompileError::InvalidKeyLiteral` instead of trusting the producer.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyLiteral {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Built-in scalar kind names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Null,
    Bool,
    True,
    False,
    Int,
    Float,
    String,
    Array,
    Object,
    Mixed,
}

impl ScalarKind {
    /// The mask bits this kind contributes.
    pub fn mask(self) -> ScalarMask {
        match self {
            ScalarKind::Null => ScalarMask::NULL,
            ScalarKind::Bool => ScalarMask::BOOL,
            ScalarKind::True => ScalarMask::TRUE,
            ScalarKind::False => ScalarMask::FALSE,
            ScalarKind::Int => ScalarMask::INT,
            ScalarKind::Float => ScalarMask::FLOAT,
            ScalarKind::String => ScalarMask::STRING,
            ScalarKind::Array => ScalarMask::ARRAY,
            ScalarKind::Object => ScalarMask::OBJECT,
            ScalarKind::Mixed => ScalarMask::MIXED,
        }
    }

    /// Parse a scalar kind name; `None` for class/alias names.
    pub fn from_name(name: &str) -> Option<ScalarKind> {
        Some(match name {
            "null" => ScalarKind::Null,
            "bool" => ScalarKind::Bool,
            "true" => ScalarKind::True,
            "false" => ScalarKind::False,
            "int" => ScalarKind::Int,
            "float" => ScalarKind::Float,
            "string" => ScalarKind::String,
            "array" => ScalarKind::Array,
            "object" => ScalarKind::Object,
            "mixed" => ScalarKind::Mixed,
            _ => return None,
        })
    }
}

impl TypeExpr {
    /// Convenience constructor for `array<T>`.
    pub fn array_of(element: TypeExpr) -> TypeExpr {
        TypeExpr::ArrayOf {
            key: None,
            element: Box::new(element),
        }
    }

    /// Convenience constructor for `array<K, V>`.
    pub fn keyed_array_of(key: TypeExpr, element: TypeExpr) -> TypeExpr {
        TypeExpr::ArrayOf {
            key: Some(Box::new(key)),
            element: Box::new(element),
        }
    }

    /// Convenience constructor for an open shape without a parent.
    pub fn shape(fields: Vec<ShapeField>) -> TypeExpr {
        TypeExpr::Shape {
            fields,
            closed: false,
            extends: None,
        }
    }
}

impl ShapeField {
    pub fn required(key: impl Into<KeyLiteral>, ty: TypeExpr) -> ShapeField {
        ShapeField {
            key: key.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(key: impl Into<KeyLiteral>, ty: TypeExpr) -> ShapeField {
        ShapeField {
            key: key.into(),
            ty,
            optional: true,
        }
    }
}

impl From<&str> for KeyLiteral {
    fn from(s: &str) -> KeyLiteral {
        KeyLiteral::Str(s.to_string())
    }
}

impl From<i64> for KeyLiteral {
    fn from(n: i64) -> KeyLiteral {
        KeyLiteral::Int(n)
    }
}

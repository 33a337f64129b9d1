use crate::ast::{ScalarKind, ShapeField, TypeExpr};
use crate::compile::CompileContext;
use crate::diagnostics::CompileError;
use crate::parse::parse;
use crate::types::{Descriptor, DescriptorId, ScalarMask, ShapeKey};

fn compile(ctx: &mut CompileContext, src: &str) -> DescriptorId {
    let expr = parse(src).expect("parses");
    ctx.compile(&expr).expect("compiles")
}

#[test]
fn test_identical_expressions_intern_to_same_id() {
    let mut ctx = CompileContext::new();
    let a = compile(&mut ctx, "array{id: int, name: string}");
    let b = compile(&mut ctx, "array{id: int, name: string}");
    assert_eq!(a, b);
}

#[test]
fn test_distinct_shapes_get_distinct_ids() {
    let mut ctx = CompileContext::new();
    let a = compile(&mut ctx, "array{id: int}");
    let b = compile(&mut ctx, "array{id: string}");
    assert_ne!(a, b);
}

#[test]
fn test_scalar_union_folds_into_one_mask() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "int|string");
    match ctx.interner.descriptor(id) {
        Descriptor::Scalar(mask) => {
            assert_eq!(mask, ScalarMask::INT | ScalarMask::STRING);
        }
        other => panic!("expected folded scalar, got {other:?}"),
    }
}

#[test]
fn test_union_with_class_keeps_scalar_and_nominal_members() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "int|string|User");
    let Descriptor::Union(list) = ctx.interner.descriptor(id) else {
        panic!("expected union");
    };
    let members = ctx.interner.list(list);
    assert_eq!(members.len(), 2);
    assert!(matches!(
        ctx.interner.descriptor(members[0]),
        Descriptor::Scalar(mask) if mask == ScalarMask::INT | ScalarMask::STRING
    ));
    assert!(matches!(ctx.interner.descriptor(members[1]), Descriptor::Nominal(_)));
}

#[test]
fn test_nullable_scalar_sets_null_bit() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "?int");
    assert!(matches!(
        ctx.interner.descriptor(id),
        Descriptor::Scalar(mask) if mask == ScalarMask::NULL | ScalarMask::INT
    ));
}

#[test]
fn test_nullable_class_becomes_union_with_null() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "?User");
    let Descriptor::Union(list) = ctx.interner.descriptor(id) else {
        panic!("expected union");
    };
    assert_eq!(ctx.interner.list(list).len(), 2);
    assert!(ctx.interner.allows_null(id));
}

#[test]
fn test_nullable_of_already_nullable_union_is_idempotent() {
    let mut ctx = CompileContext::new();
    let once = compile(&mut ctx, "?User");
    let expr = TypeExpr::Nullable(Box::new(parse("?User").expect("parses")));
    let twice = ctx.compile(&expr).expect("compiles");
    assert_eq!(once, twice);
}

#[test]
fn test_duplicate_shape_key_rejected() {
    let mut ctx = CompileContext::new();
    let expr = parse("array{id: int, id: string}").expect("parses");
    assert_eq!(
        ctx.compile(&expr),
        Err(CompileError::DuplicateKey("id".to_string()))
    );
}

#[test]
fn test_float_key_literal_rejected() {
    let mut ctx = CompileContext::new();
    let expr = TypeExpr::shape(vec![ShapeField {
        key: crate::ast::KeyLiteral::Float(1.5),
        ty: TypeExpr::Scalar(ScalarKind::Int),
        optional: false,
    }]);
    assert!(matches!(
        ctx.compile(&expr),
        Err(CompileError::InvalidKeyLiteral(_))
    ));
}

#[test]
fn test_unresolved_extends_rejected() {
    let mut ctx = CompileContext::new();
    let expr = TypeExpr::Shape {
        fields: vec![ShapeField::required("id", TypeExpr::Scalar(ScalarKind::Int))],
        closed: false,
        extends: Some("Missing".to_string()),
    };
    assert_eq!(
        ctx.compile(&expr),
        Err(CompileError::UnresolvedAlias("Missing".to_string()))
    );
}

#[test]
fn test_extends_flattens_parent_fields_first() {
    let mut ctx = CompileContext::new();
    let base = parse("array{id: int}").expect("parses");
    ctx.define_alias("Base", &base).expect("compiles");

    let child = TypeExpr::Shape {
        fields: vec![ShapeField::required(
            "name",
            TypeExpr::Scalar(ScalarKind::String),
        )],
        closed: false,
        extends: Some("Base".to_string()),
    };
    let id = ctx.compile(&child).expect("compiles");
    let Descriptor::Shape(shape) = ctx.interner.descriptor(id) else {
        panic!("expected shape");
    };
    let record = ctx.interner.shape(shape);
    let keys: Vec<ShapeKey> = record.elements.iter().map(|e| e.key).collect();
    assert_eq!(
        keys,
        vec![ctx.interner.str_key("id"), ctx.interner.str_key("name")]
    );
}

#[test]
fn test_override_replaces_parent_field_in_place() {
    let mut ctx = CompileContext::new();
    let base = parse("array{id: int|string, name: string}").expect("parses");
    ctx.define_alias("Base", &base).expect("compiles");

    let child = TypeExpr::Shape {
        fields: vec![ShapeField::required("id", TypeExpr::Scalar(ScalarKind::Int))],
        closed: false,
        extends: Some("Base".to_string()),
    };
    let id = ctx.compile(&child).expect("compiles");
    let Descriptor::Shape(shape) = ctx.interner.descriptor(id) else {
        panic!("expected shape");
    };
    let record = ctx.interner.shape(shape);
    assert_eq!(record.elements.len(), 2);
    // Overridden field keeps its parent position.
    assert_eq!(record.elements[0].key, ctx.interner.str_key("id"));
    assert!(matches!(
        ctx.interner.descriptor(record.elements[0].ty),
        Descriptor::Scalar(mask) if mask == ScalarMask::INT
    ));
}

#[test]
fn test_override_must_narrow_not_widen() {
    let mut ctx = CompileContext::new();
    let base = parse("array{id: int}").expect("parses");
    ctx.define_alias("Base", &base).expect("compiles");

    let child = TypeExpr::Shape {
        fields: vec![ShapeField::required(
            "id",
            TypeExpr::Scalar(ScalarKind::String),
        )],
        closed: false,
        extends: Some("Base".to_string()),
    };
    assert!(matches!(
        ctx.compile(&child),
        Err(CompileError::InheritanceNarrowing { .. })
    ));
}

#[test]
fn test_override_cannot_relax_required_to_optional() {
    let mut ctx = CompileContext::new();
    let base = parse("array{id: int}").expect("parses");
    ctx.define_alias("Base", &base).expect("compiles");

    let child = TypeExpr::Shape {
        fields: vec![ShapeField::optional("id", TypeExpr::Scalar(ScalarKind::Int))],
        closed: false,
        extends: Some("Base".to_string()),
    };
    assert!(matches!(
        ctx.compile(&child),
        Err(CompileError::InheritanceNarrowing { .. })
    ));
}

#[test]
fn test_alias_reference_resolves_to_same_descriptor() {
    let mut ctx = CompileContext::new();
    let base = parse("array{id: int}").expect("parses");
    let defined = ctx.define_alias("User", &base).expect("compiles");
    let referenced = compile(&mut ctx, "User");
    assert_eq!(defined, referenced);
}

#[test]
fn test_nesting_depth_limit() {
    let mut ctx = CompileContext::new();
    let mut expr = TypeExpr::Scalar(ScalarKind::Int);
    for _ in 0..80 {
        expr = TypeExpr::array_of(expr);
    }
    assert_eq!(ctx.compile(&expr), Err(CompileError::NestingTooDeep));
}

#[test]
fn test_array_of_depth_counts_only_array_layers() {
    let mut ctx = CompileContext::new();
    let flat = compile(&mut ctx, "array<int>");
    let nested = compile(&mut ctx, "array<array<int>>");
    let with_shape = compile(&mut ctx, "array<array{id: int}>");

    let depth = |id| match ctx.interner.descriptor(id) {
        Descriptor::ArrayOf(arr) => ctx.interner.array_of(arr).depth,
        _ => panic!("expected array-of"),
    };
    assert_eq!(depth(flat), 1);
    assert_eq!(depth(nested), 2);
    // A shape element does not add a collection layer.
    assert_eq!(depth(with_shape), 1);
}

#[test]
fn test_union_equivalence_ignores_member_order() {
    let mut ctx = CompileContext::new();
    let a = ctx.interner.strings.intern("A");
    let b = ctx.interner.strings.intern("B");
    let na = ctx.interner.intern_nominal(a);
    let nb = ctx.interner.intern_nominal(b);
    let ab = ctx.interner.intern_union(vec![na, nb]);
    let ba = ctx.interner.intern_union(vec![nb, na]);
    assert_ne!(ab, ba);
    assert!(ctx.interner.equivalent(ab, ba));
}

#[test]
fn test_shape_hash_matches_for_equal_shapes() {
    let mut ctx = CompileContext::new();
    let a = compile(&mut ctx, "array{id: int, name: string}");
    let b = compile(&mut ctx, "array{id: int, name: string}");
    let c = compile(&mut ctx, "array{id: int, name?: string}");
    assert!(ctx.interner.equivalent(a, b));

    let shape_hash = |id| match ctx.interner.descriptor(id) {
        Descriptor::Shape(shape) => ctx.interner.shape(shape).hash,
        _ => panic!("expected shape"),
    };
    assert_eq!(shape_hash(a), shape_hash(b));
    // Optionality participates in the digest.
    assert_ne!(shape_hash(a), shape_hash(c));
}

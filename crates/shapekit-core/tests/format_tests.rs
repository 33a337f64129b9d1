use crate::compile::CompileContext;
use crate::format::render;
use crate::parse::parse;
use crate::reflect::{TypeSummary, describe, nesting_depth};
use crate::types::DescriptorId;

fn compile(ctx: &mut CompileContext, src: &str) -> DescriptorId {
    let expr = parse(src).expect("parses");
    ctx.compile(&expr).expect("compiles")
}

#[test]
fn test_canonical_round_trip() {
    let mut ctx = CompileContext::new();
    for src in [
        "int",
        "mixed",
        "?int",
        "?User",
        "int|string",
        "int|string|null",
        "User|int",
        "A&B",
        "array<int>",
        "array<string, User>",
        "array<array<int>>",
        "array{id: int, name?: string}",
        "array{id: int}!",
        "array{0: string, 1: int}",
        "array{address: array{zip: string}}",
        "?array<int>",
    ] {
        let id = compile(&mut ctx, src);
        assert_eq!(render(&ctx.interner, id), src, "round trip of {src}");
    }
}

#[test]
fn test_render_then_recompile_is_equivalent() {
    let mut ctx = CompileContext::new();
    for src in [
        "array{id: int, tags: array<string>, meta?: array<string, mixed>}",
        "array{id: int}&array{name: string}",
        "?array{id: int}",
    ] {
        let id = compile(&mut ctx, src);
        let rendered = render(&ctx.interner, id);
        let again = compile(&mut ctx, &rendered);
        assert!(
            ctx.interner.equivalent(id, again),
            "{src} rendered as {rendered}"
        );
    }
}

#[test]
fn test_nullable_bool_renders_with_prefix() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "?bool");
    assert_eq!(render(&ctx.interner, id), "?bool");
}

#[test]
fn test_quoted_key_round_trip() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "array{'my key': int}");
    assert_eq!(render(&ctx.interner, id), "array{'my key': int}");
}

#[test]
fn test_intersection_inside_union_is_parenthesized() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "(A&B)|C");
    assert_eq!(render(&ctx.interner, id), "(A&B)|C");
}

#[test]
fn test_describe_shape() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "array{id: int, name?: string}!");
    let TypeSummary::Shape {
        fields,
        required,
        closed,
        ..
    } = describe(&ctx.interner, id)
    else {
        panic!("expected shape summary");
    };
    assert!(closed);
    assert_eq!(fields.len(), 2);
    assert_eq!(required, 1);
    assert_eq!(fields[0].key, "id");
    assert!(!fields[0].optional);
    assert_eq!(fields[1].key, "name");
    assert!(fields[1].optional);
}

#[test]
fn test_describe_required_count_mixed_fields() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "array{a: int, b?: int, c: string, d?: bool}");
    let TypeSummary::Shape { fields, required, .. } = describe(&ctx.interner, id) else {
        panic!("expected shape summary");
    };
    assert_eq!(fields.len(), 4);
    assert_eq!(required, 2);

    let all_required = compile(&mut ctx, "array{a: int, b: int}");
    let TypeSummary::Shape { required, .. } = describe(&ctx.interner, all_required) else {
        panic!("expected shape summary");
    };
    assert_eq!(required, 2);
}

#[test]
fn test_describe_scalar_nullability() {
    let mut ctx = CompileContext::new();
    let id = compile(&mut ctx, "?int");
    assert_eq!(
        describe(&ctx.interner, id),
        TypeSummary::Scalar {
            kinds: vec!["int"],
            nullable: true,
        }
    );
}

#[test]
fn test_nesting_depth_reporting() {
    let mut ctx = CompileContext::new();
    let nested = compile(&mut ctx, "array<array<array<int>>>");
    assert_eq!(nesting_depth(&ctx.interner, nested), 3);
    let shape = compile(&mut ctx, "array{id: int}");
    assert_eq!(nesting_depth(&ctx.interner, shape), 0);
}

#[test]
fn test_parse_rejects_trailing_garbage() {
    assert!(parse("int|").is_err());
    assert!(parse("array<int").is_err());
    assert!(parse("array{id int}").is_err());
    assert!(parse("").is_err());
}

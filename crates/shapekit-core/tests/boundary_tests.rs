use crate::boundary::{check_argument, check_return};
use crate::compile::CompileContext;
use crate::host::NullHost;
use crate::parse::parse;
use crate::types::DescriptorId;
use crate::value::{Value, ZArray};

fn compile(ctx: &mut CompileContext, src: &str) -> DescriptorId {
    let expr = parse(src).expect("parses");
    ctx.compile(&expr).expect("compiles")
}

#[test]
fn test_conforming_argument_passes() {
    let mut ctx = CompileContext::new();
    let ty = compile(&mut ctx, "array{id: int}");
    let mut arr = ZArray::new();
    arr.insert(ctx.interner.str_key("id"), 1);
    let value = Value::Array(arr);
    assert!(check_argument(&ctx.interner, &NullHost, 1, "user", &value, ty).is_ok());
}

#[test]
fn test_argument_kind_mismatch_uses_classic_message() {
    let mut ctx = CompileContext::new();
    let ty = compile(&mut ctx, "array{id: int}");
    let err = check_argument(&ctx.interner, &NullHost, 1, "user", &Value::from("nope"), ty)
        .expect_err("fails");
    assert_eq!(
        err.message,
        "Argument #1 ($user) must be of type array{id: int}, string given"
    );
}

#[test]
fn test_argument_scalar_mismatch_message() {
    let mut ctx = CompileContext::new();
    let ty = compile(&mut ctx, "int|string");
    let err = check_argument(&ctx.interner, &NullHost, 2, "count", &Value::from(1.5), ty)
        .expect_err("fails");
    assert_eq!(
        err.message,
        "Argument #2 ($count) must be of type int|string, float given"
    );
}

#[test]
fn test_argument_nested_failure_message() {
    let mut ctx = CompileContext::new();
    let ty = compile(&mut ctx, "array{id: int}");
    let value = Value::Array(ZArray::new());
    let err = check_argument(&ctx.interner, &NullHost, 1, "user", &value, ty).expect_err("fails");
    assert_eq!(err.message, "Argument #1 ($user) missing required key 'id'");
}

#[test]
fn test_argument_nested_type_failure_message() {
    let mut ctx = CompileContext::new();
    let ty = compile(&mut ctx, "array{id: int}");
    let mut arr = ZArray::new();
    arr.insert(ctx.interner.str_key("id"), "seven");
    let value = Value::Array(arr);
    let err = check_argument(&ctx.interner, &NullHost, 1, "user", &value, ty).expect_err("fails");
    assert_eq!(
        err.message,
        "Argument #1 ($user) key 'id' must be of type int, string given"
    );
}

#[test]
fn test_return_value_messages() {
    let mut ctx = CompileContext::new();
    let ty = compile(&mut ctx, "array<int>");
    let err = check_return(&ctx.interner, &NullHost, &Value::Null, ty).expect_err("fails");
    assert_eq!(err.message, "Return value must be of type array<int>, null given");

    let mut arr = ZArray::new();
    arr.push("one");
    let err = check_return(&ctx.interner, &NullHost, &Value::Array(arr), ty).expect_err("fails");
    assert_eq!(
        err.message,
        "Return value element 0 must be of type int, string given"
    );
}

#[test]
fn test_boundary_error_carries_failure_detail() {
    let mut ctx = CompileContext::new();
    let ty = compile(&mut ctx, "array{id: int}");
    let value = Value::Array(ZArray::new());
    let err = check_argument(&ctx.interner, &NullHost, 1, "user", &value, ty).expect_err("fails");
    assert!(err.failure.path().is_root());
    assert_eq!(err.to_string(), err.message);
}

use std::ffi::{c_void, CString};
use std::ptr;

use dynffi::{
    stats, CallInterface, Callable, Closure, Error, Function, Kind, Role, Signature, Type, Value,
};

use crate::common::init_tracing;

/// A callable whose signature is assembled at runtime.
struct Scripted {
    signature: Signature,
}

impl Callable for Scripted {
    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn call(&self, args: &[Value]) -> Vec<Value> {
        let sum: i64 = args.iter().filter_map(Value::as_i64).sum();
        vec![Value::Int64(sum)]
    }
}

#[test]
fn add_closure_through_fresh_interface() {
    init_tracing();
    let add = Closure::from_fn(|a: i32, b: i32| a.wrapping_add(b)).unwrap();
    let interface = CallInterface::prepare(Type::INT32, &[Type::INT32, Type::INT32]).unwrap();
    for (a, b) in [(20, 22), (i32::MAX, 2), (-1, -1)] {
        let mut out = Value::Int32(0);
        unsafe {
            dynffi::call_with(
                &interface,
                add.code_ptr(),
                Some(&mut out),
                &[Value::Int32(a), Value::Int32(b)],
            )
        }
        .unwrap();
        assert_eq!(out, Value::Int32(a.wrapping_add(b)));
    }
}

#[test]
fn closure_pointer_is_a_c_function() {
    let triple = Closure::from_fn(|n: i64| n * 3).unwrap();
    let f: extern "C" fn(i64) -> i64 = unsafe { std::mem::transmute(triple.pointer()) };
    assert_eq!(f(14), 42);
}

#[test]
fn closure_receives_foreign_text() {
    let len = Closure::from_fn(|s: String| s.chars().count() as u32).unwrap();
    let f: extern "C" fn(*const std::ffi::c_char) -> u32 =
        unsafe { std::mem::transmute(len.pointer()) };
    let text = CString::new("h\u{e9}llo").unwrap();
    assert_eq!(f(text.as_ptr()), 5);
    assert_eq!(f(ptr::null()), 0);
}

#[test]
fn scripted_callable() {
    init_tracing();
    let sig = Signature::parse(Some("int64"), &["int8", "uint16", "int"]).unwrap();
    let sum = Closure::new(Scripted { signature: sig }).unwrap();
    let mut out = Value::Int64(0);
    sum.call(
        Some(&mut out),
        &[Value::Int8(-8), Value::UInt16(50), Value::Int(0)],
    )
    .unwrap();
    assert_eq!(out, Value::Int64(42));
}

#[test]
fn variadic_fails_without_allocating() {
    let before = stats().trampoline_allocs;
    let err = Closure::new(Scripted {
        signature: Signature::new([Kind::Pointer], [Kind::Int]).variadic(),
    })
    .unwrap_err();
    assert_eq!(err, Error::Variadic);
    assert_eq!(stats().trampoline_allocs, before);
}

#[test]
fn multiple_results_fail_without_allocating() {
    let before = stats().trampoline_allocs;
    let err = Closure::from_fn(|a: u8, b: u8| (a, b, a ^ b)).unwrap_err();
    assert_eq!(err, Error::MultipleResults(3));
    assert_eq!(err.to_string(), "closures can return at most one result, signature declares 3");
    assert_eq!(stats().trampoline_allocs, before);
}

#[test]
fn pointers_pass_through_unchanged() {
    let offset = Closure::from_fn(|p: *mut c_void, n: usize| p.wrapping_byte_add(n)).unwrap();
    let mut out = Value::null();
    let base = 0x1000usize as *mut c_void;
    offset
        .call(Some(&mut out), &[Value::Pointer(base), Value::Usize(0x20)])
        .unwrap();
    assert_eq!(out.as_pointer(), Some(0x1020usize as *mut c_void));
}

#[test]
fn dispose_then_drop_releases_once() {
    let before = stats();
    let a = Closure::from_fn(|| 1.5f32).unwrap();
    let b = Closure::from_fn(|| 2.5f64).unwrap();
    assert_eq!(stats().trampoline_allocs, before.trampoline_allocs + 2);
    assert_eq!(stats().trampoline_releases, before.trampoline_releases);
    a.dispose();
    assert_eq!(stats().trampoline_releases, before.trampoline_releases + 1);
    drop(b);
    assert_eq!(stats().trampoline_releases, before.trampoline_releases + 2);
}

#[test]
fn text_parameter_refuses_raw_pointer() {
    let len = Closure::from_fn(|s: String| s.len() as u64).unwrap();
    let mut out = Value::UInt64(0);
    let err = len
        .call(Some(&mut out), &[Value::Pointer(0x10usize as *mut c_void)])
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { role: Role::Argument, index: 0, .. }));

    len.call(Some(&mut out), &[Value::from("four")]).unwrap();
    assert_eq!(out, Value::UInt64(4));
}

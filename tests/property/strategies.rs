// Shared proptest strategies.

use std::ffi::c_void;

use dynffi::{Kind, Value};
use proptest::prelude::*;

/// Text without interior NUL bytes.
pub fn c_text() -> impl Strategy<Value = String> {
    "[^\\x00]{0,64}"
}

pub fn kind() -> impl Strategy<Value = Kind> {
    proptest::sample::select(Kind::ALL.to_vec())
}

/// Any value of any kind, floats included as raw bit patterns.
pub fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i8>().prop_map(Value::Int8),
        any::<i16>().prop_map(Value::Int16),
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        any::<u8>().prop_map(Value::UInt8),
        any::<u16>().prop_map(Value::UInt16),
        any::<u32>().prop_map(Value::UInt32),
        any::<u64>().prop_map(Value::UInt64),
        any::<i32>().prop_map(Value::Int),
        any::<u32>().prop_map(Value::UInt),
        any::<usize>().prop_map(Value::Usize),
        any::<u32>().prop_map(|bits| Value::Float32(f32::from_bits(bits))),
        any::<u64>().prop_map(|bits| Value::Float64(f64::from_bits(bits))),
        c_text().prop_map(Value::Text),
        any::<usize>().prop_map(|addr| Value::Pointer(addr as *mut c_void)),
    ]
}

/// Equality that compares floats by bit pattern so NaN round-trips count.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float32(x), Value::Float32(y)) => x.to_bits() == y.to_bits(),
        (Value::Float64(x), Value::Float64(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

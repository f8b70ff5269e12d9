//! Per-kind encode/decode rules.
//!
//! Argument slots hold values at their native width. Return slots follow the
//! libffi convention: integers narrower than `ffi_arg` are widened to a full
//! `ffi_arg` (zero-extended) or `ffi_sarg` (sign-extended).

use std::alloc::{handle_alloc_error, Layout};
use std::ffi::{c_char, c_void, CStr};
use std::mem;
use std::ptr;

use libffi::raw::{ffi_arg, ffi_sarg};

use super::slot::Slot;
use crate::error::{Error, Result, Role};
use crate::memory::OwnedText;
use crate::value::{Kind, Value};

/// Encode one argument into a slot.
///
/// Text is copied into an owned NUL-terminated buffer whose address goes into
/// the slot; the returned [`OwnedText`] must outlive the call.
pub fn encode_argument(value: &Value) -> Result<(Slot, Option<OwnedText>)> {
    let slot = match *value {
        Value::Int8(n) => Slot::new(n),
        Value::Int16(n) => Slot::new(n),
        Value::Int32(n) => Slot::new(n),
        Value::Int64(n) => Slot::new(n),
        Value::UInt8(n) => Slot::new(n),
        Value::UInt16(n) => Slot::new(n),
        Value::UInt32(n) => Slot::new(n),
        Value::UInt64(n) => Slot::new(n),
        Value::Int(n) => Slot::new(n),
        Value::UInt(n) => Slot::new(n),
        Value::Usize(n) => Slot::new(n),
        Value::Float32(f) => Slot::new(f),
        Value::Float64(f) => Slot::new(f),
        Value::Pointer(p) => Slot::new(p),
        Value::Text(ref s) => {
            let text = OwnedText::new(s, Role::Argument)?;
            let slot = Slot::new(text.as_c_str().as_ptr().cast_mut().cast::<c_void>());
            return Ok((slot, Some(text)));
        }
    };
    Ok((slot, None))
}

/// Decode an argument slot at the width implied by `kind`.
///
/// Text is copied out of the pointed-to buffer; the buffer itself is left to
/// whoever produced it.
///
/// # Safety
/// `slot` must point to a readable value laid out as `kind`'s descriptor, and
/// for [`Kind::Text`] that value must be null or a valid C string.
pub unsafe fn decode_argument(kind: Kind, slot: *const c_void) -> Value {
    match kind {
        Kind::Int8 => Value::Int8(read(slot)),
        Kind::Int16 => Value::Int16(read(slot)),
        Kind::Int32 => Value::Int32(read(slot)),
        Kind::Int64 => Value::Int64(read(slot)),
        Kind::UInt8 => Value::UInt8(read(slot)),
        Kind::UInt16 => Value::UInt16(read(slot)),
        Kind::UInt32 => Value::UInt32(read(slot)),
        Kind::UInt64 => Value::UInt64(read(slot)),
        Kind::Int => Value::Int(read(slot)),
        Kind::UInt => Value::UInt(read(slot)),
        Kind::Usize => Value::Usize(read(slot)),
        Kind::Float32 => Value::Float32(read(slot)),
        Kind::Float64 => Value::Float64(read(slot)),
        Kind::Text => Value::Text(copy_c_string(read(slot))),
        Kind::Pointer => Value::Pointer(read(slot)),
    }
}

/// Decode a return slot filled by `ffi_call`.
///
/// # Safety
/// Same as [`decode_argument`], with narrow integers stored widened.
pub unsafe fn decode_return(kind: Kind, slot: *const c_void) -> Value {
    macro_rules! widened {
        ($t:ty, $variant:ident, $wide:ty) => {
            if mem::size_of::<$t>() < mem::size_of::<ffi_arg>() {
                Value::$variant(read::<$wide>(slot) as $t)
            } else {
                Value::$variant(read::<$t>(slot))
            }
        };
    }

    match kind {
        Kind::Int8 => widened!(i8, Int8, ffi_sarg),
        Kind::Int16 => widened!(i16, Int16, ffi_sarg),
        Kind::Int32 => widened!(i32, Int32, ffi_sarg),
        Kind::Int64 => widened!(i64, Int64, ffi_sarg),
        Kind::UInt8 => widened!(u8, UInt8, ffi_arg),
        Kind::UInt16 => widened!(u16, UInt16, ffi_arg),
        Kind::UInt32 => widened!(u32, UInt32, ffi_arg),
        Kind::UInt64 => widened!(u64, UInt64, ffi_arg),
        Kind::Int => widened!(i32, Int, ffi_sarg),
        Kind::UInt => widened!(u32, UInt, ffi_arg),
        Kind::Usize => widened!(usize, Usize, ffi_arg),
        Kind::Float32 | Kind::Float64 | Kind::Text | Kind::Pointer => decode_argument(kind, slot),
    }
}

/// Encode a closure result into the trampoline's return slot.
///
/// Text is handed over as a `malloc`ed copy the foreign caller owns.
///
/// # Safety
/// `ret` must point to writable storage large enough for the value's
/// descriptor, or for an `ffi_arg` when the value is a narrow integer.
pub unsafe fn encode_return(value: &Value, ret: *mut c_void) -> Result<()> {
    macro_rules! widened {
        ($n:expr, $t:ty, $wide:ty) => {
            if mem::size_of::<$t>() < mem::size_of::<ffi_arg>() {
                write::<$wide>(ret, $n as $wide)
            } else {
                write::<$t>(ret, $n)
            }
        };
    }

    match *value {
        Value::Int8(n) => widened!(n, i8, ffi_sarg),
        Value::Int16(n) => widened!(n, i16, ffi_sarg),
        Value::Int32(n) => widened!(n, i32, ffi_sarg),
        Value::Int64(n) => widened!(n, i64, ffi_sarg),
        Value::UInt8(n) => widened!(n, u8, ffi_arg),
        Value::UInt16(n) => widened!(n, u16, ffi_arg),
        Value::UInt32(n) => widened!(n, u32, ffi_arg),
        Value::UInt64(n) => widened!(n, u64, ffi_arg),
        Value::Int(n) => widened!(n, i32, ffi_sarg),
        Value::UInt(n) => widened!(n, u32, ffi_arg),
        Value::Usize(n) => widened!(n, usize, ffi_arg),
        Value::Float32(f) => write(ret, f),
        Value::Float64(f) => write(ret, f),
        Value::Pointer(p) => write(ret, p),
        Value::Text(ref s) => write(ret, malloc_c_string(s)?),
    }
    Ok(())
}

/// Copy a C string into an owned `String`. Null decodes to the empty string;
/// invalid UTF-8 is replaced.
///
/// # Safety
/// `p` must be null or point to a NUL-terminated buffer.
pub unsafe fn copy_c_string(p: *const c_char) -> String {
    if p.is_null() {
        return String::new();
    }
    CStr::from_ptr(p).to_string_lossy().into_owned()
}

/// A `malloc`ed NUL-terminated copy of `s`, to be released with `free`.
pub fn malloc_c_string(s: &str) -> Result<*mut c_void> {
    if let Some(offset) = s.bytes().position(|b| b == 0) {
        return Err(Error::InteriorNul {
            role: Role::Return,
            offset,
        });
    }
    let len = s.len() + 1;
    unsafe {
        let buf = libc::malloc(len).cast::<u8>();
        if buf.is_null() {
            handle_alloc_error(Layout::array::<u8>(len).unwrap_or(Layout::new::<u8>()));
        }
        ptr::copy_nonoverlapping(s.as_ptr(), buf, s.len());
        *buf.add(s.len()) = 0;
        Ok(buf.cast())
    }
}

unsafe fn read<T: Copy>(p: *const c_void) -> T {
    ptr::read(p.cast::<T>())
}

unsafe fn write<T>(p: *mut c_void, v: T) {
    ptr::write(p.cast::<T>(), v)
}

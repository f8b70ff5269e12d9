use std::ffi::c_void;
use std::fmt;
use std::mem;
use std::ptr;

use libffi::raw::ffi_arg;

const SLOT_SIZE: usize = 8;

const _: () = assert!(mem::size_of::<ffi_arg>() <= SLOT_SIZE);
const _: () = assert!(mem::size_of::<*mut c_void>() <= SLOT_SIZE);

/// Plain data that fits in a [`Slot`] and has no invalid bit patterns.
pub trait Scalar: Copy + sealed::Sealed {}

mod sealed {
    pub trait Sealed {}
}

macro_rules! scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}
            impl Scalar for $t {}
        )*
    };
}

scalar!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, *mut c_void);

/// Untyped storage for one marshalled value.
///
/// Eight bytes, eight-aligned: wide enough for every catalog type and for a
/// widened `ffi_arg` return.
#[derive(Clone, Copy)]
#[repr(C, align(8))]
pub struct Slot {
    bytes: [u8; SLOT_SIZE],
}

impl Slot {
    pub const fn zeroed() -> Self {
        Slot {
            bytes: [0; SLOT_SIZE],
        }
    }

    /// A slot holding `v` at its native width, starting at offset 0.
    pub fn new<T: Scalar>(v: T) -> Self {
        let mut slot = Slot::zeroed();
        slot.set(v);
        slot
    }

    pub fn set<T: Scalar>(&mut self, v: T) {
        unsafe { ptr::write(self.bytes.as_mut_ptr().cast::<T>(), v) }
    }

    pub fn get<T: Scalar>(&self) -> T {
        unsafe { ptr::read(self.bytes.as_ptr().cast::<T>()) }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.bytes.as_ptr().cast()
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        self.bytes.as_mut_ptr().cast()
    }
}

impl Default for Slot {
    fn default() -> Self {
        Slot::zeroed()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({:02x?})", self.bytes)
    }
}

//! Prepared call interfaces.
//!
//! A [`CallInterface`] freezes one return descriptor and an ordered list of
//! argument descriptors into a libffi `ffi_cif`. Once prepared it can be
//! invoked any number of times with fresh slots.

use std::cell::UnsafeCell;
use std::ffi::{c_uint, c_void};
use std::fmt;
use std::mem;
use std::ptr;

use libffi::low::{ffi_cif, ffi_type, CodePtr};
use libffi::raw;

use crate::error::{Error, Result, Status};
use crate::types::Type;
use crate::value::Signature;

/// A calling convention understood by libffi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Abi(raw::ffi_abi);

impl Abi {
    /// The platform's standard C calling convention.
    pub const DEFAULT: Abi = Abi(raw::ffi_abi_FFI_DEFAULT_ABI);

    /// Wrap a raw `ffi_abi` value. Values outside the platform's range are
    /// rejected at preparation time with [`Status::BadAbi`].
    pub const fn from_raw(abi: raw::ffi_abi) -> Self {
        Abi(abi)
    }

    pub fn as_raw(self) -> raw::ffi_abi {
        self.0
    }
}

impl Default for Abi {
    fn default() -> Self {
        Abi::DEFAULT
    }
}

/// A frozen signature ready to be called through.
///
/// `CallInterface` may move between threads but is not `Sync`: a single
/// instance must not be invoked from two threads at once.
pub struct CallInterface {
    cif: UnsafeCell<ffi_cif>,
    abi: Abi,
    ret: Type,
    args: Vec<Type>,
    // Backing storage for `cif.arg_types`; never resized after preparation.
    arg_types: Box<[*mut ffi_type]>,
}

// The raw pointers reference libffi's immutable statics and the boxed slice
// owned by this value.
unsafe impl Send for CallInterface {}

impl CallInterface {
    /// Prepare an interface for the default calling convention.
    pub fn prepare(ret: Type, args: &[Type]) -> Result<Self> {
        Self::prepare_with_abi(Abi::DEFAULT, ret, args)
    }

    pub fn prepare_with_abi(abi: Abi, ret: Type, args: &[Type]) -> Result<Self> {
        let arg_types: Box<[*mut ffi_type]> = args.iter().map(|t| t.as_raw()).collect();
        let mut interface = CallInterface {
            cif: UnsafeCell::new(unsafe { mem::zeroed() }),
            abi,
            ret,
            args: args.to_vec(),
            arg_types,
        };

        let status = unsafe {
            prep_cif(
                interface.cif.get_mut(),
                abi,
                ret.as_raw(),
                &mut interface.arg_types,
            )
        };
        if !status.is_ok() {
            tracing::debug!(signature = %interface, %status, "call interface rejected");
            return Err(Error::Prepare(status));
        }

        tracing::debug!(signature = %interface, "prepared call interface");
        Ok(interface)
    }

    /// Prepare from a signature: first result (or void) and the parameters.
    pub fn from_signature(sig: &Signature) -> Result<Self> {
        Self::prepare(sig.return_type(), &sig.argument_types())
    }

    pub fn return_type(&self) -> Type {
        self.ret
    }

    pub fn argument_types(&self) -> &[Type] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn abi(&self) -> Abi {
        self.abi
    }

    pub(crate) fn as_raw_ptr(&self) -> *mut ffi_cif {
        self.cif.get()
    }

    /// Call `fptr` through this interface.
    ///
    /// `ret` must point to storage for the return descriptor (widened to
    /// `ffi_arg` for narrow integers) or be null for `void`. `args` holds one
    /// slot address per prepared argument, in order.
    ///
    /// # Safety
    /// `fptr` must be a function with exactly this signature, and every slot
    /// must hold a value laid out as its descriptor requires.
    pub unsafe fn invoke(
        &self,
        fptr: CodePtr,
        ret: *mut c_void,
        args: &mut [*mut c_void],
    ) -> Result<()> {
        if fptr.as_ptr().is_null() {
            return Err(Error::NullFunction);
        }
        if args.len() != self.args.len() {
            return Err(Error::arity_mismatch(self.args.len(), args.len()));
        }

        tracing::trace!(signature = %self, fptr = ?fptr.as_ptr(), "dispatch");

        let avalue = if args.is_empty() {
            ptr::null_mut()
        } else {
            args.as_mut_ptr()
        };
        raw::ffi_call(self.as_raw_ptr(), Some(*fptr.as_fun()), ret, avalue);
        Ok(())
    }
}

/// Run `ffi_prep_cif` over raw descriptors.
///
/// # Safety
/// `rtype` and every entry of `atypes` must point to valid `ffi_type`s, and
/// `atypes` must outlive every use of `cif`.
pub(crate) unsafe fn prep_cif(
    cif: *mut ffi_cif,
    abi: Abi,
    rtype: *mut ffi_type,
    atypes: &mut [*mut ffi_type],
) -> Status {
    let atypes_ptr = if atypes.is_empty() {
        ptr::null_mut()
    } else {
        atypes.as_mut_ptr()
    };
    Status::from_raw(raw::ffi_prep_cif(
        cif,
        abi.as_raw(),
        atypes.len() as c_uint,
        rtype,
        atypes_ptr,
    ))
}

impl fmt::Display for CallInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (*)(", self.ret)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for CallInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallInterface")
            .field("signature", &format_args!("{}", self))
            .field("abi", &self.abi)
            .finish()
    }
}

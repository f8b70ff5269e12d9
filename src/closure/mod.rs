//! Closures: native functions exposed as C function pointers.
//!
//! A [`Closure`] owns a libffi trampoline whose address foreign code can call
//! with the standard calling convention. Each invocation decodes the argument
//! slots, runs the [`Callable`], and encodes its result into the return slot.
//!
//! The trampoline address is valid until the closure is disposed or dropped.
//! Calling it afterwards is undefined behavior; foreign code that stored the
//! address must be done with it first.

mod callable;

pub use callable::{Callable, IntoCallable, NativeFn, NativeType, Results};

use std::ffi::c_void;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::ptr;

use libffi::low::{self, ffi_cif, CodePtr};
use libffi::raw::{self, ffi_arg};
use smallvec::SmallVec;

use crate::call;
use crate::error::{Error, Result, Status};
use crate::function::Function;
use crate::interface::CallInterface;
use crate::marshal::{decode_argument, encode_return, ArgumentFrame};
use crate::memory;
use crate::value::{Kind, Signature, Value};

/// State reachable from the trampoline's user-data pointer.
struct Trampoline {
    interface: CallInterface,
    signature: Signature,
    callable: Box<dyn Callable>,
}

impl Trampoline {
    /// # Safety
    /// `args` must hold one valid slot address per declared parameter and
    /// `ret` must be libffi's return storage for this interface.
    unsafe fn run(&self, ret: *mut c_void, args: *mut *mut c_void) {
        let values: SmallVec<[Value; 6]> = self
            .signature
            .params
            .iter()
            .enumerate()
            .map(|(i, &kind)| decode_argument(kind, *args.add(i)))
            .collect();

        let results = self.callable.call(&values);

        let Some(&declared) = self.signature.results.first() else {
            return;
        };
        match results.first() {
            Some(value) if value.descriptor().same_layout(declared.descriptor()) => {
                if let Err(e) = encode_return(value, ret) {
                    tracing::error!(signature = %self.interface, error = %e, "closure result could not be encoded");
                    zero_return(ret, declared);
                }
            }
            other => {
                tracing::warn!(
                    signature = %self.interface,
                    expected = %declared,
                    got = ?other.map(|v| v.kind()),
                    "closure result does not match its declared kind"
                );
                zero_return(ret, declared);
            }
        }
    }
}

unsafe fn zero_return(ret: *mut c_void, kind: Kind) {
    let len = kind.descriptor().size().max(mem::size_of::<ffi_arg>());
    ptr::write_bytes(ret.cast::<u8>(), 0, len);
}

/// The routine libffi enters on every foreign call of a trampoline.
unsafe extern "C" fn dispatch(
    _cif: *mut ffi_cif,
    ret: *mut c_void,
    args: *mut *mut c_void,
    userdata: *mut c_void,
) {
    let trampoline = &*(userdata as *const Trampoline);
    tracing::trace!(signature = %trampoline.interface, "closure entered");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| trampoline.run(ret, args)));
    if outcome.is_err() {
        // Unwinding into foreign frames is undefined.
        tracing::error!(signature = %trampoline.interface, "closure panicked, aborting");
        process::abort();
    }
}

/// A callable value behind a C function pointer.
pub struct Closure {
    raw: *mut low::ffi_closure,
    code: CodePtr,
    state: Box<Trampoline>,
}

// The trampoline only reads `state`, and `Callable` is `Send + Sync`.
unsafe impl Send for Closure {}

impl Closure {
    /// Build a closure for `callable`.
    ///
    /// Fails with [`Error::Variadic`] or [`Error::MultipleResults`] before any
    /// trampoline is allocated when the signature cannot be expressed.
    pub fn new<C: Callable>(callable: C) -> Result<Self> {
        let signature = callable.signature();
        if signature.variadic {
            return Err(Error::Variadic);
        }
        if signature.results.len() > 1 {
            return Err(Error::MultipleResults(signature.results.len()));
        }

        let interface = CallInterface::from_signature(&signature)?;
        let state = Box::new(Trampoline {
            interface,
            signature,
            callable: Box::new(callable),
        });

        let (raw, code) = low::closure_alloc();
        if raw.is_null() {
            return Err(Error::TrampolineAlloc);
        }

        let userdata = ptr::addr_of!(*state).cast_mut().cast::<c_void>();
        let status = Status::from_raw(unsafe {
            raw::ffi_prep_closure_loc(
                raw,
                state.interface.as_raw_ptr(),
                Some(dispatch),
                userdata,
                code.as_mut_ptr(),
            )
        });
        if !status.is_ok() {
            unsafe { low::closure_free(raw) };
            tracing::debug!(signature = %state.interface, %status, "closure rejected");
            return Err(Error::Prepare(status));
        }

        memory::trampoline_allocated();
        tracing::debug!(signature = %state.interface, code = ?code.as_ptr(), "closure allocated");
        Ok(Closure { raw, code, state })
    }

    /// Build a closure from a plain Rust function of up to six parameters.
    ///
    /// ```
    /// use dynffi::{Closure, Function, Value};
    ///
    /// let add = Closure::from_fn(|a: i32, b: i32| a.wrapping_add(b))?;
    /// let mut out = Value::Int32(0);
    /// add.call(Some(&mut out), &[Value::Int32(40), Value::Int32(2)])?;
    /// assert_eq!(out, Value::Int32(42));
    /// # Ok::<(), dynffi::Error>(())
    /// ```
    pub fn from_fn<M, F: IntoCallable<M>>(f: F) -> Result<Self> {
        Self::new(f.into_callable())
    }

    pub fn signature(&self) -> &Signature {
        &self.state.signature
    }

    /// Release the trampoline now.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.raw.is_null() {
            return;
        }
        tracing::debug!(signature = %self.state.interface, code = ?self.code.as_ptr(), "closure released");
        unsafe { low::closure_free(self.raw) };
        self.raw = ptr::null_mut();
        memory::trampoline_released();
    }
}

impl Function for Closure {
    fn code_ptr(&self) -> CodePtr {
        self.code
    }

    fn interface(&self) -> &CallInterface {
        &self.state.interface
    }

    /// Same as [`Function::call`], except that values are also checked
    /// against the declared kinds, and a text result is freed after it has
    /// been copied into `ret`: the caller here is this crate.
    fn call(&self, ret: Option<&mut Value>, args: &[Value]) -> Result<()> {
        call::check_values(&self.state.interface, ret.as_deref(), args)?;
        call::check_kinds(&self.state.signature, ret.as_deref(), args)?;
        let mut frame = ArgumentFrame::marshal(args)?;
        let rslot = unsafe { call::dispatch(&self.state.interface, self.code, ret, &mut frame) }?;
        if self.state.signature.results.first() == Some(&Kind::Text) {
            unsafe { libc::free(rslot.get::<*mut c_void>()) };
        }
        Ok(())
    }
}

impl Drop for Closure {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("code", &self.code.as_ptr())
            .field("signature", &format_args!("{}", self.state.interface))
            .finish()
    }
}

//! Callable code addresses.
//!
//! Anything that pairs an address with a prepared [`CallInterface`] is a
//! [`Function`]: a symbol resolved from a library and a closure trampoline
//! are called the same way.

use std::ffi::c_void;
use std::fmt;

use libffi::low::CodePtr;

use crate::call;
use crate::error::Result;
use crate::interface::CallInterface;
use crate::marshal::ArgumentFrame;
use crate::types::Type;
use crate::value::Value;

pub trait Function {
    fn code_ptr(&self) -> CodePtr;

    fn interface(&self) -> &CallInterface;

    /// The address foreign code stores and calls.
    fn pointer(&self) -> usize {
        self.code_ptr().as_ptr() as usize
    }

    /// Invoke with raw slots; see [`CallInterface::invoke`].
    ///
    /// # Safety
    /// The slots must match the interface's descriptors.
    unsafe fn call_raw(&self, ret: *mut c_void, args: &mut [*mut c_void]) -> Result<()> {
        self.interface().invoke(self.code_ptr(), ret, args)
    }

    /// Invoke with native values, checked against the interface.
    fn call(&self, ret: Option<&mut Value>, args: &[Value]) -> Result<()> {
        call::check_values(self.interface(), ret.as_deref(), args)?;
        let mut frame = ArgumentFrame::marshal(args)?;
        // The address and interface were paired when `self` was built.
        unsafe { call::dispatch(self.interface(), self.code_ptr(), ret, &mut frame) }?;
        Ok(())
    }
}

/// A foreign address paired with the interface it is called through.
pub struct ForeignFunction {
    code: CodePtr,
    interface: CallInterface,
}

// `CodePtr` is a plain address.
unsafe impl Send for ForeignFunction {}

impl ForeignFunction {
    /// # Safety
    /// `code` must be a function whose C signature matches `interface` for as
    /// long as this value is used.
    pub unsafe fn new(code: CodePtr, interface: CallInterface) -> Self {
        ForeignFunction { code, interface }
    }

    /// Prepare an interface for `ret`/`args` and pair it with `code`.
    ///
    /// # Safety
    /// Same as [`ForeignFunction::new`].
    pub unsafe fn prepare(code: CodePtr, ret: Type, args: &[Type]) -> Result<Self> {
        let interface = CallInterface::prepare(ret, args)?;
        Ok(Self::new(code, interface))
    }
}

impl Function for ForeignFunction {
    fn code_ptr(&self) -> CodePtr {
        self.code
    }

    fn interface(&self) -> &CallInterface {
        &self.interface
    }
}

impl fmt::Debug for ForeignFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignFunction")
            .field("code", &self.code.as_ptr())
            .field("signature", &format_args!("{}", self.interface))
            .finish()
    }
}

//! # dynffi - Dynamic Foreign Function Calls
//!
//! dynffi calls C functions whose signature is only known at runtime, and
//! turns Rust functions into C function pointers. It sits directly on top of
//! libffi, which supplies the per-architecture calling-convention code.
//!
//! ## Quick Start
//!
//! ```
//! use dynffi::{CallInterface, Closure, Function, Type, Value};
//!
//! // A Rust function behind a C function pointer...
//! let add = Closure::from_fn(|a: i32, b: i32| a.wrapping_add(b))?;
//!
//! // ...called back through a separately prepared interface.
//! let interface = CallInterface::prepare(Type::INT32, &[Type::INT32, Type::INT32])?;
//! let mut out = Value::Int32(0);
//! unsafe {
//!     dynffi::call_with(&interface, add.code_ptr(), Some(&mut out), &[Value::Int32(40), Value::Int32(2)])?;
//! }
//! assert_eq!(out, Value::Int32(42));
//! # Ok::<(), dynffi::Error>(())
//! ```
//!
//! ## Architecture
//!
//! 1. **Types** - fixed catalog of primitive descriptors backed by libffi
//! 2. **Interface** - a prepared, reusable signature (`ffi_cif`)
//! 3. **Marshal** - values to argument slots and back
//! 4. **Call** - one-shot calls with native values
//! 5. **Closure** - trampolines that dispatch into Rust callables
//!
//! Diagnostics go through `tracing`; the crate never installs a subscriber.

pub mod call;
pub mod closure;
pub mod error;
pub mod function;
pub mod interface;
pub mod library;
pub mod marshal;
pub mod memory;
pub mod types;
pub mod value;

pub use call::{call, call_with};
pub use closure::{Callable, Closure, IntoCallable, NativeType, Results};
pub use error::{Error, Result, Role, Status};
pub use function::{ForeignFunction, Function};
pub use interface::{Abi, CallInterface};
pub use library::Library;
pub use memory::{stats, MemoryStats};
pub use types::Type;
pub use value::{Kind, Signature, Value};

pub use libffi::low::CodePtr;

//! Shared test helpers.

use std::ffi::{c_char, c_void, CStr};
use std::sync::Once;

use dynffi::CodePtr;

static TRACING: Once = Once::new();

/// Install a test subscriber once per process.
///
/// Output is captured by the test harness and filtered with `RUST_LOG`,
/// e.g. `RUST_LOG=dynffi=trace cargo test`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub extern "C" fn identity_i32(n: i32) -> i32 {
    n
}

pub extern "C" fn byte_len(s: *const c_char) -> u64 {
    if s.is_null() {
        return 0;
    }
    unsafe { CStr::from_ptr(s).to_bytes().len() as u64 }
}

pub extern "C" fn add_i32(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

pub fn code(addr: usize) -> CodePtr {
    CodePtr(addr as *mut c_void)
}

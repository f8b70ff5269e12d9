//! Accounting for native resources owned by this crate.
//!
//! Outbound text buffers live for exactly one call on the calling thread, so
//! they are counted per thread. Trampolines can be released on any thread, so
//! the live count is process-wide; allocations and releases are also tallied
//! per thread.

use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result, Role};

thread_local! {
    static TEXT_BUFFERS: Cell<usize> = const { Cell::new(0) };
    static TRAMPOLINE_ALLOCS: Cell<u64> = const { Cell::new(0) };
    static TRAMPOLINE_RELEASES: Cell<u64> = const { Cell::new(0) };
}

static TRAMPOLINES: AtomicUsize = AtomicUsize::new(0);

/// Snapshot of live native resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    /// Outbound text buffers not yet released on this thread.
    pub text_buffers: usize,
    /// Closure trampolines not yet freed in this process.
    pub trampolines: usize,
    /// Trampolines ever allocated by this thread.
    pub trampoline_allocs: u64,
    /// Trampolines ever freed by this thread.
    pub trampoline_releases: u64,
}

pub fn stats() -> MemoryStats {
    MemoryStats {
        text_buffers: TEXT_BUFFERS.with(Cell::get),
        trampolines: TRAMPOLINES.load(Ordering::SeqCst),
        trampoline_allocs: TRAMPOLINE_ALLOCS.with(Cell::get),
        trampoline_releases: TRAMPOLINE_RELEASES.with(Cell::get),
    }
}

/// A NUL-terminated copy of an outbound text value.
///
/// The buffer is released exactly once, when this value is dropped.
#[derive(Debug)]
pub struct OwnedText {
    buf: CString,
}

impl OwnedText {
    pub fn new(text: &str, role: Role) -> Result<Self> {
        let buf = CString::new(text).map_err(|e| Error::InteriorNul {
            role,
            offset: e.nul_position(),
        })?;
        TEXT_BUFFERS.with(|n| n.set(n.get() + 1));
        Ok(OwnedText { buf })
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.buf
    }
}

impl Drop for OwnedText {
    fn drop(&mut self) {
        TEXT_BUFFERS.with(|n| n.set(n.get().saturating_sub(1)));
    }
}

pub(crate) fn trampoline_allocated() {
    TRAMPOLINE_ALLOCS.with(|n| n.set(n.get() + 1));
    TRAMPOLINES.fetch_add(1, Ordering::SeqCst);
}

pub(crate) fn trampoline_released() {
    TRAMPOLINE_RELEASES.with(|n| n.set(n.get() + 1));
    TRAMPOLINES.fetch_sub(1, Ordering::SeqCst);
}

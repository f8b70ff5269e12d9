use std::ffi::c_void;

use smallvec::SmallVec;

use super::conversions::encode_argument;
use super::slot::Slot;
use crate::error::Result;
use crate::memory::OwnedText;
use crate::types::Type;
use crate::value::Value;

/// Marshalled arguments for a single call.
///
/// Holds one slot per argument plus every text buffer the slots point into.
/// Buffers are released when the frame is dropped, so a frame must outlive the
/// dispatch that reads it.
#[derive(Debug, Default)]
pub struct ArgumentFrame {
    slots: SmallVec<[Slot; 8]>,
    owned: SmallVec<[OwnedText; 2]>,
    types: SmallVec<[Type; 8]>,
}

impl ArgumentFrame {
    /// Encode `args` in order. On failure any buffers already produced are
    /// released before returning.
    pub fn marshal(args: &[Value]) -> Result<Self> {
        let mut frame = ArgumentFrame {
            slots: SmallVec::with_capacity(args.len()),
            owned: SmallVec::new(),
            types: SmallVec::with_capacity(args.len()),
        };
        for arg in args {
            let (slot, text) = encode_argument(arg)?;
            frame.slots.push(slot);
            frame.types.push(arg.descriptor());
            if let Some(text) = text {
                frame.owned.push(text);
            }
        }
        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Descriptors of the marshalled values, in argument order.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn owned_buffers(&self) -> usize {
        self.owned.len()
    }

    /// The `avalue` array libffi expects: one address per slot.
    pub fn pointers(&mut self) -> SmallVec<[*mut c_void; 8]> {
        self.slots.iter_mut().map(Slot::as_mut_ptr).collect()
    }
}

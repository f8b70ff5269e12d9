//! Value marshalling between [`Value`](crate::Value) and raw libffi slots.

mod conversions;
mod frame;
mod slot;

pub use conversions::{
    copy_c_string, decode_argument, decode_return, encode_argument, encode_return,
    malloc_c_string,
};
pub use frame::ArgumentFrame;
pub use slot::{Scalar, Slot};

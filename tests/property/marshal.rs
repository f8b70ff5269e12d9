// Property tests for the value marshaller.
//
// Round-trips through argument slots and return slots for every kind, and
// buffer accounting for text arguments.

use dynffi::marshal::{decode_argument, decode_return, encode_argument, encode_return, ArgumentFrame, Slot};
use dynffi::{stats, Value};
use proptest::prelude::*;

use super::strategies::{c_text, kind, same_value, value};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn argument_slot_roundtrip(v in value()) {
        let (slot, _owned) = encode_argument(&v).unwrap();
        let back = unsafe { decode_argument(v.kind(), slot.as_ptr()) };
        prop_assert!(same_value(&v, &back), "{:?} != {:?}", v, back);
    }

    #[test]
    fn return_slot_roundtrip(v in value()) {
        let mut slot = Slot::zeroed();
        unsafe { encode_return(&v, slot.as_mut_ptr()) }.unwrap();
        let back = unsafe { decode_return(v.kind(), slot.as_ptr()) };
        if let Value::Text(_) = v {
            unsafe { libc::free(slot.get::<*mut std::ffi::c_void>()) };
        }
        prop_assert!(same_value(&v, &back), "{:?} != {:?}", v, back);
    }

    #[test]
    fn zero_values_roundtrip(k in kind()) {
        let zero = Value::zero(k);
        let (slot, _owned) = encode_argument(&zero).unwrap();
        prop_assert_eq!(unsafe { decode_argument(k, slot.as_ptr()) }, zero);
    }

    #[test]
    fn frame_releases_every_text_buffer(texts in prop::collection::vec(c_text(), 0..8)) {
        let before = stats().text_buffers;
        let args: Vec<Value> = texts.iter().map(|t| Value::from(t.as_str())).collect();
        let frame = ArgumentFrame::marshal(&args).unwrap();
        prop_assert_eq!(frame.owned_buffers(), texts.len());
        prop_assert_eq!(stats().text_buffers, before + texts.len());
        drop(frame);
        prop_assert_eq!(stats().text_buffers, before);
    }

    #[test]
    fn interior_nul_is_rejected(prefix in c_text(), suffix in c_text()) {
        let before = stats().text_buffers;
        let text = format!("{}\0{}", prefix, suffix);
        let result = ArgumentFrame::marshal(&[Value::from(prefix.as_str()), Value::Text(text)]);
        prop_assert!(result.is_err());
        prop_assert_eq!(stats().text_buffers, before);
    }
}

use dynffi::{Error, Kind, Role, Signature, Type, Value};

#[test]
fn every_kind_has_a_zero_value() {
    for kind in Kind::ALL {
        let zero = Value::zero(kind);
        assert_eq!(zero.kind(), kind);
        assert_eq!(zero.descriptor(), kind.descriptor());
    }
}

#[test]
fn text_and_pointer_share_the_pointer_descriptor() {
    assert_eq!(Value::from("abc").descriptor(), Type::POINTER);
    assert_eq!(Value::null().descriptor(), Type::POINTER);
}

#[test]
fn native_int_is_32_bit() {
    assert_eq!(Kind::Int.descriptor().size(), 4);
    assert!(Kind::Int.descriptor().is_signed());
    assert_eq!(Kind::UInt.descriptor().size(), 4);
    assert!(!Kind::UInt.descriptor().is_signed());
}

#[test]
fn parse_dynamic_signature() {
    let sig = Signature::parse(Some("usize"), &["ptr", "uint8", "float64"]).unwrap();
    assert_eq!(
        sig.params.as_slice(),
        &[Kind::Pointer, Kind::UInt8, Kind::Float64]
    );
    assert_eq!(sig.results.as_slice(), &[Kind::Usize]);
    assert!(!sig.variadic);
}

#[test]
fn parse_rejects_unknown_kind_by_role() {
    assert_eq!(
        Signature::parse(None, &["int32", "map"]).unwrap_err(),
        Error::UnsupportedType {
            role: Role::Argument,
            kind: "map".to_string(),
        }
    );
    assert_eq!(
        Signature::parse(Some("chan"), &[]).unwrap_err(),
        Error::UnsupportedType {
            role: Role::Return,
            kind: "chan".to_string(),
        }
    );
}

#[test]
fn signature_descriptors() {
    let sig = Signature::new([Kind::Text, Kind::Int16], [Kind::Float32]);
    assert_eq!(sig.return_type(), Type::FLOAT);
    assert_eq!(sig.argument_types(), vec![Type::POINTER, Type::INT16]);
    assert!(Signature::new([Kind::Int8], []).variadic().variadic);
}

use dynffi::{Abi, CallInterface, Error, Status, Type};

#[test]
fn status_strings() {
    assert_eq!(Status::Ok.to_string(), "OK");
    assert_eq!(Status::BadTypedef.to_string(), "bad-typedef");
    assert_eq!(Status::BadAbi.to_string(), "bad-ABI");
}

#[test]
fn bad_abi_is_reported_through_prepare() {
    let err = CallInterface::prepare_with_abi(Abi::from_raw(0), Type::VOID, &[]).unwrap_err();
    assert_eq!(err.status(), Some(Status::BadAbi));
    assert_eq!(err.to_string(), "status: bad-ABI");
}

#[test]
fn non_preparation_errors_have_no_status() {
    assert_eq!(Error::NullFunction.status(), None);
    assert_eq!(Error::arity_mismatch(2, 3).to_string(), "expected 2 arguments, got 3");
    assert_eq!(Error::arity_mismatch(1, 0).to_string(), "expected 1 argument, got 0");
}

use dynffi::{stats, Function, Library, Type, Value};

#[test]
fn libc_strlen_through_library() {
    let mut libc = Library::this();
    let strlen = unsafe { libc.function("strlen", Type::ULONG, &[Type::POINTER]) }.unwrap();
    let before = stats().text_buffers;
    let mut out = Value::Usize(0);
    strlen
        .call(Some(&mut out), &[Value::from("hello, world")])
        .unwrap();
    assert_eq!(out, Value::Usize(12));
    assert_eq!(stats().text_buffers, before);
}

#[test]
fn libc_labs_widens_correctly() {
    let mut libc = Library::this();
    let labs = unsafe { libc.function("labs", Type::LONG, &[Type::LONG]) }.unwrap();
    let mut out = Value::Int64(0);
    labs.call(Some(&mut out), &[Value::Int64(-(1 << 40))]).unwrap();
    assert_eq!(out, Value::Int64(1 << 40));
}

#[test]
fn symbols_are_cached() {
    let mut libc = Library::this();
    let first = libc.symbol("abs").unwrap();
    let again = libc.symbol("abs").unwrap();
    assert_eq!(first.as_ptr(), again.as_ptr());
    assert_eq!(libc.cached_symbols(), 1);
}

// Integration tests harness
mod call {
    include!("call.rs");
}
mod closure {
    include!("closure.rs");
}
#[cfg(unix)]
mod library {
    include!("library.rs");
}

//! Error types for the call/closure layer.
//!
//! Preparation and dispatch failures come back as explicit values. Unsupported
//! kinds are reported before any native resource is touched.

use std::fmt;

use libffi::raw;

use crate::types::Type;

/// Status code reported by libffi when preparing an interface or a trampoline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    BadTypedef,
    BadAbi,
    /// A status this crate does not know about (newer libffi releases).
    Unknown(u32),
}

impl Status {
    /// Map a raw `ffi_status` onto the enumerated space.
    pub fn from_raw(status: raw::ffi_status) -> Self {
        match status {
            raw::ffi_status_FFI_OK => Status::Ok,
            raw::ffi_status_FFI_BAD_TYPEDEF => Status::BadTypedef,
            raw::ffi_status_FFI_BAD_ABI => Status::BadAbi,
            other => Status::Unknown(other as u32),
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// `Ok(())` for [`Status::Ok`], otherwise a preparation error.
    pub fn into_result(self) -> Result<()> {
        match self {
            Status::Ok => Ok(()),
            failed => Err(Error::Prepare(failed)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::BadTypedef => write!(f, "bad-typedef"),
            Status::BadAbi => write!(f, "bad-ABI"),
            Status::Unknown(_) => write!(f, "unknown"),
        }
    }
}

/// Which side of a signature a value or kind sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Argument,
    Return,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Argument => write!(f, "argument"),
            Role::Return => write!(f, "return"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// libffi rejected the signature or the calling convention.
    #[error("status: {0}")]
    Prepare(Status),

    /// The kind has no descriptor or marshalling rule.
    #[error("unsupported {role} type: {kind}")]
    UnsupportedType { role: Role, kind: String },

    #[error("expected {expected} argument{}, got {got}", plural(.expected))]
    ArityMismatch { expected: usize, got: usize },

    /// A value does not match the descriptor the interface was prepared with.
    #[error("{role} {index}: expected {expected}, got {got}")]
    TypeMismatch {
        role: Role,
        index: usize,
        expected: Type,
        got: Type,
    },

    #[error("cannot call through a null function address")]
    NullFunction,

    #[error("{role} text contains an interior NUL byte at offset {offset}")]
    InteriorNul { role: Role, offset: usize },

    #[error("closures with a variable number of arguments are not supported")]
    Variadic,

    #[error("closures can return at most one result, signature declares {0}")]
    MultipleResults(usize),

    #[error("failed to allocate a closure trampoline")]
    TrampolineAlloc,

    #[error("failed to load library '{path}': {message}")]
    Library { path: String, message: String },

    #[error("symbol '{symbol}' not found in {library}")]
    SymbolNotFound { library: String, symbol: String },
}

impl Error {
    pub fn unsupported(role: Role, kind: impl Into<String>) -> Self {
        Error::UnsupportedType {
            role,
            kind: kind.into(),
        }
    }

    pub fn arity_mismatch(expected: usize, got: usize) -> Self {
        Error::ArityMismatch { expected, got }
    }

    /// The preparation status, if this error came from libffi.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Prepare(status) => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}

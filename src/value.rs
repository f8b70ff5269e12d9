//! Native values that cross the call boundary.
//!
//! [`Kind`] is the closed set of value categories the marshaller understands,
//! [`Value`] carries one payload per kind. A [`Signature`] is an ordered list of
//! kinds describing a callable.

use std::ffi::{c_int, c_uint, c_void};
use std::fmt;
use std::ptr;

use smallvec::SmallVec;

use crate::error::{Error, Result, Role};
use crate::types::Type;

/// The category of a native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    /// C `int`
    Int,
    /// C `unsigned int`
    UInt,
    /// Pointer-sized unsigned index
    Usize,
    Float32,
    Float64,
    /// Owned text, passed as a NUL-terminated `char *`
    Text,
    /// Untyped address
    Pointer,
}

impl Kind {
    pub const ALL: [Kind; 15] = [
        Kind::Int8,
        Kind::Int16,
        Kind::Int32,
        Kind::Int64,
        Kind::UInt8,
        Kind::UInt16,
        Kind::UInt32,
        Kind::UInt64,
        Kind::Int,
        Kind::UInt,
        Kind::Usize,
        Kind::Float32,
        Kind::Float64,
        Kind::Text,
        Kind::Pointer,
    ];

    /// The fixed descriptor this kind is marshalled as.
    pub fn descriptor(self) -> Type {
        match self {
            Kind::Int8 => Type::INT8,
            Kind::Int16 => Type::INT16,
            Kind::Int32 => Type::INT32,
            Kind::Int64 => Type::INT64,
            Kind::UInt8 => Type::UINT8,
            Kind::UInt16 => Type::UINT16,
            Kind::UInt32 => Type::UINT32,
            Kind::UInt64 => Type::UINT64,
            Kind::Int => Type::INT,
            Kind::UInt => Type::UINT,
            #[cfg(target_pointer_width = "64")]
            Kind::Usize => Type::ULONG,
            #[cfg(target_pointer_width = "32")]
            Kind::Usize => Type::UINT32,
            Kind::Float32 => Type::FLOAT,
            Kind::Float64 => Type::DOUBLE,
            Kind::Text | Kind::Pointer => Type::POINTER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::UInt8 => "uint8",
            Kind::UInt16 => "uint16",
            Kind::UInt32 => "uint32",
            Kind::UInt64 => "uint64",
            Kind::Int => "int",
            Kind::UInt => "uint",
            Kind::Usize => "usize",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Text => "text",
            Kind::Pointer => "pointer",
        }
    }

    /// Parse a kind name, as a scripting front end would spell it.
    pub fn from_name(name: &str) -> Option<Kind> {
        match name {
            "string" => Some(Kind::Text),
            "ptr" => Some(Kind::Pointer),
            "uintptr" => Some(Kind::Usize),
            _ => Kind::ALL.iter().copied().find(|k| k.name() == name),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A native value of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int(c_int),
    UInt(c_uint),
    Usize(usize),
    Float32(f32),
    Float64(f64),
    Text(String),
    Pointer(*mut c_void),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int8(_) => Kind::Int8,
            Value::Int16(_) => Kind::Int16,
            Value::Int32(_) => Kind::Int32,
            Value::Int64(_) => Kind::Int64,
            Value::UInt8(_) => Kind::UInt8,
            Value::UInt16(_) => Kind::UInt16,
            Value::UInt32(_) => Kind::UInt32,
            Value::UInt64(_) => Kind::UInt64,
            Value::Int(_) => Kind::Int,
            Value::UInt(_) => Kind::UInt,
            Value::Usize(_) => Kind::Usize,
            Value::Float32(_) => Kind::Float32,
            Value::Float64(_) => Kind::Float64,
            Value::Text(_) => Kind::Text,
            Value::Pointer(_) => Kind::Pointer,
        }
    }

    pub fn descriptor(&self) -> Type {
        self.kind().descriptor()
    }

    /// The zero value of a kind; handy as a return target.
    pub fn zero(kind: Kind) -> Value {
        match kind {
            Kind::Int8 => Value::Int8(0),
            Kind::Int16 => Value::Int16(0),
            Kind::Int32 => Value::Int32(0),
            Kind::Int64 => Value::Int64(0),
            Kind::UInt8 => Value::UInt8(0),
            Kind::UInt16 => Value::UInt16(0),
            Kind::UInt32 => Value::UInt32(0),
            Kind::UInt64 => Value::UInt64(0),
            Kind::Int => Value::Int(0),
            Kind::UInt => Value::UInt(0),
            Kind::Usize => Value::Usize(0),
            Kind::Float32 => Value::Float32(0.0),
            Kind::Float64 => Value::Float64(0.0),
            Kind::Text => Value::Text(String::new()),
            Kind::Pointer => Value::Pointer(ptr::null_mut()),
        }
    }

    pub fn null() -> Value {
        Value::Pointer(ptr::null_mut())
    }

    /// Integer payload widened to `i64`. `None` for unsigned values above
    /// `i64::MAX` and for non-integers.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int8(n) => Some(n as i64),
            Value::Int16(n) => Some(n as i64),
            Value::Int32(n) => Some(n as i64),
            Value::Int64(n) => Some(n),
            Value::UInt8(n) => Some(n as i64),
            Value::UInt16(n) => Some(n as i64),
            Value::UInt32(n) => Some(n as i64),
            Value::UInt64(n) => i64::try_from(n).ok(),
            Value::Int(n) => Some(n as i64),
            Value::UInt(n) => Some(n as i64),
            Value::Usize(n) => i64::try_from(n).ok(),
            _ => None,
        }
    }

    /// Unsigned payload widened to `u64`. `None` for negative values and
    /// non-integers.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt8(n) => Some(n as u64),
            Value::UInt16(n) => Some(n as u64),
            Value::UInt32(n) => Some(n as u64),
            Value::UInt64(n) => Some(n),
            Value::UInt(n) => Some(n as u64),
            Value::Usize(n) => Some(n as u64),
            _ => self.as_i64().and_then(|n| u64::try_from(n).ok()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float32(f) => Some(f as f64),
            Value::Float64(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<*mut c_void> {
        match *self {
            Value::Pointer(p) => Some(p),
            _ => None,
        }
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    usize => Usize,
    f32 => Float32,
    f64 => Float64,
    String => Text,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl<T> From<*mut T> for Value {
    fn from(p: *mut T) -> Self {
        Value::Pointer(p.cast())
    }
}

impl<T> From<*const T> for Value {
    fn from(p: *const T) -> Self {
        Value::Pointer(p.cast_mut().cast())
    }
}

/// Parameter and result kinds of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub params: SmallVec<[Kind; 6]>,
    pub results: SmallVec<[Kind; 1]>,
    /// Whether the callable accepts a variable number of trailing arguments.
    pub variadic: bool,
}

impl Signature {
    pub fn new(
        params: impl IntoIterator<Item = Kind>,
        results: impl IntoIterator<Item = Kind>,
    ) -> Self {
        Signature {
            params: params.into_iter().collect(),
            results: results.into_iter().collect(),
            variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Build a signature from kind names. `None` is a void return.
    pub fn parse(ret: Option<&str>, args: &[&str]) -> Result<Self> {
        let results = match ret {
            None => SmallVec::new(),
            Some(name) => {
                let kind = Kind::from_name(name)
                    .ok_or_else(|| Error::unsupported(Role::Return, name))?;
                SmallVec::from_elem(kind, 1)
            }
        };
        let params = args
            .iter()
            .map(|name| Kind::from_name(name).ok_or_else(|| Error::unsupported(Role::Argument, *name)))
            .collect::<Result<SmallVec<_>>>()?;
        Ok(Signature {
            params,
            results,
            variadic: false,
        })
    }

    /// Return descriptor: the first result, `void` when there is none.
    pub fn return_type(&self) -> Type {
        self.results
            .first()
            .map(|k| k.descriptor())
            .unwrap_or(Type::VOID)
    }

    pub fn argument_types(&self) -> Vec<Type> {
        self.params.iter().map(|k| k.descriptor()).collect()
    }
}

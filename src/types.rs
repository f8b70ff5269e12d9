//! Type descriptor catalog.
//!
//! Every descriptor pairs one of libffi's built-in `ffi_type` statics with a
//! C-style display name. The set is closed: descriptors are only handed out as
//! the associated constants of [`Type`], never built by callers.

use std::fmt;
use std::mem;
use std::ptr;

use libffi::low::{self, ffi_type};

use crate::value::Kind;

/// The libffi type a descriptor stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Tag {
    Void,
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    SInt64,
    UInt64,
    Float,
    Double,
    Pointer,
}

/// An immutable descriptor from the fixed catalog.
///
/// # Catalog
/// - `void`
/// - `char`/`unsigned char` and `int8_t`/`uint8_t`
/// - `int16_t`/`uint16_t`
/// - `int`/`unsigned int` and `int32_t`/`uint32_t`
/// - `long`/`unsigned long` and `int64_t`/`uint64_t`
/// - `float`, `double`
/// - `void *`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type {
    tag: Tag,
    name: &'static str,
}

impl Type {
    pub const VOID: Type = Type::new(Tag::Void, "void");

    pub const CHAR: Type = Type::new(Tag::SInt8, "char");
    pub const UCHAR: Type = Type::new(Tag::UInt8, "unsigned char");

    pub const INT: Type = Type::new(Tag::SInt32, "int");
    pub const UINT: Type = Type::new(Tag::UInt32, "unsigned int");

    pub const LONG: Type = Type::new(Tag::SInt64, "long");
    pub const ULONG: Type = Type::new(Tag::UInt64, "unsigned long");

    pub const UINT8: Type = Type::new(Tag::UInt8, "uint8_t");
    pub const UINT16: Type = Type::new(Tag::UInt16, "uint16_t");
    pub const UINT32: Type = Type::new(Tag::UInt32, "uint32_t");
    pub const UINT64: Type = Type::new(Tag::UInt64, "uint64_t");

    pub const INT8: Type = Type::new(Tag::SInt8, "int8_t");
    pub const INT16: Type = Type::new(Tag::SInt16, "int16_t");
    pub const INT32: Type = Type::new(Tag::SInt32, "int32_t");
    pub const INT64: Type = Type::new(Tag::SInt64, "int64_t");

    pub const FLOAT: Type = Type::new(Tag::Float, "float");
    pub const DOUBLE: Type = Type::new(Tag::Double, "double");

    pub const POINTER: Type = Type::new(Tag::Pointer, "void *");

    /// Every descriptor in the catalog.
    pub const ALL: [Type; 18] = [
        Type::VOID,
        Type::CHAR,
        Type::UCHAR,
        Type::INT,
        Type::UINT,
        Type::LONG,
        Type::ULONG,
        Type::UINT8,
        Type::UINT16,
        Type::UINT32,
        Type::UINT64,
        Type::INT8,
        Type::INT16,
        Type::INT32,
        Type::INT64,
        Type::FLOAT,
        Type::DOUBLE,
        Type::POINTER,
    ];

    const fn new(tag: Tag, name: &'static str) -> Self {
        Type { tag, name }
    }

    /// The descriptor a value kind marshals through.
    pub fn lookup(kind: Kind) -> Type {
        kind.descriptor()
    }

    /// Find a catalog entry by its display name (`"int32_t"`, `"void *"`, ...).
    pub fn by_name(name: &str) -> Option<Type> {
        Type::ALL.iter().copied().find(|t| t.name == name)
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    /// Size in bytes on the current platform. `void` has size 0.
    pub fn size(self) -> usize {
        match self.tag {
            Tag::Void => 0,
            Tag::SInt8 | Tag::UInt8 => 1,
            Tag::SInt16 | Tag::UInt16 => 2,
            Tag::SInt32 | Tag::UInt32 => 4,
            Tag::SInt64 | Tag::UInt64 => 8,
            Tag::Float => mem::size_of::<f32>(),
            Tag::Double => mem::size_of::<f64>(),
            Tag::Pointer => mem::size_of::<*const ()>(),
        }
    }

    /// Alignment in bytes on the current platform.
    pub fn alignment(self) -> usize {
        match self.tag {
            Tag::Void => 1,
            Tag::SInt8 | Tag::UInt8 => mem::align_of::<u8>(),
            Tag::SInt16 | Tag::UInt16 => mem::align_of::<u16>(),
            Tag::SInt32 | Tag::UInt32 => mem::align_of::<u32>(),
            Tag::SInt64 | Tag::UInt64 => mem::align_of::<u64>(),
            Tag::Float => mem::align_of::<f32>(),
            Tag::Double => mem::align_of::<f64>(),
            Tag::Pointer => mem::align_of::<*const ()>(),
        }
    }

    pub fn is_void(self) -> bool {
        self.tag == Tag::Void
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self.tag,
            Tag::SInt8
                | Tag::UInt8
                | Tag::SInt16
                | Tag::UInt16
                | Tag::SInt32
                | Tag::UInt32
                | Tag::SInt64
                | Tag::UInt64
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self.tag,
            Tag::SInt8 | Tag::SInt16 | Tag::SInt32 | Tag::SInt64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self.tag, Tag::Float | Tag::Double)
    }

    pub fn is_pointer(self) -> bool {
        self.tag == Tag::Pointer
    }

    /// Two descriptors with the same machine layout (`int` and `int32_t`).
    pub fn same_layout(self, other: Type) -> bool {
        self.tag == other.tag
    }

    /// The libffi descriptor backing this entry.
    ///
    /// The pointer refers to one of libffi's process-wide statics and is valid
    /// for the whole program; libffi never writes to primitive descriptors.
    pub fn as_raw(self) -> *mut ffi_type {
        match self.tag {
            Tag::Void => ptr::addr_of_mut!(low::types::void),
            Tag::SInt8 => ptr::addr_of_mut!(low::types::sint8),
            Tag::UInt8 => ptr::addr_of_mut!(low::types::uint8),
            Tag::SInt16 => ptr::addr_of_mut!(low::types::sint16),
            Tag::UInt16 => ptr::addr_of_mut!(low::types::uint16),
            Tag::SInt32 => ptr::addr_of_mut!(low::types::sint32),
            Tag::UInt32 => ptr::addr_of_mut!(low::types::uint32),
            Tag::SInt64 => ptr::addr_of_mut!(low::types::sint64),
            Tag::UInt64 => ptr::addr_of_mut!(low::types::uint64),
            Tag::Float => ptr::addr_of_mut!(low::types::float),
            Tag::Double => ptr::addr_of_mut!(low::types::double),
            Tag::Pointer => ptr::addr_of_mut!(low::types::pointer),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.name)
    }
}

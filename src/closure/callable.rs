use std::ffi::c_void;
use std::marker::PhantomData;

use smallvec::{smallvec, SmallVec};

use crate::value::{Kind, Signature, Value};

/// A natively-typed function value that a trampoline can dispatch into.
///
/// `Send + Sync` because foreign code may invoke the trampoline from any
/// thread.
pub trait Callable: Send + Sync + 'static {
    fn signature(&self) -> Signature;

    /// Run with arguments decoded per [`Callable::signature`]. Only the first
    /// result crosses back to foreign code.
    fn call(&self, args: &[Value]) -> Vec<Value>;
}

/// A Rust type with a fixed [`Kind`].
pub trait NativeType: Sized {
    const KIND: Kind;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! native_type {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl NativeType for $t {
                const KIND: Kind = Kind::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

native_type! {
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
    *mut c_void => Pointer,
}

impl NativeType for *const c_void {
    const KIND: Kind = Kind::Pointer;

    fn into_value(self) -> Value {
        Value::Pointer(self.cast_mut())
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_pointer().map(|p| p.cast_const())
    }
}

/// The result shape of a native function: nothing, one value, or a tuple.
pub trait Results {
    fn kinds() -> SmallVec<[Kind; 1]>;

    fn into_values(self) -> Vec<Value>;
}

impl Results for () {
    fn kinds() -> SmallVec<[Kind; 1]> {
        SmallVec::new()
    }

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! single_result {
    ($($t:ty),* $(,)?) => {
        $(
            impl Results for $t {
                fn kinds() -> SmallVec<[Kind; 1]> {
                    smallvec![<$t as NativeType>::KIND]
                }

                fn into_values(self) -> Vec<Value> {
                    vec![self.into_value()]
                }
            }
        )*
    };
}

single_result!(
    i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, String, *mut c_void, *const c_void,
);

macro_rules! tuple_results {
    ($($name:ident),+) => {
        impl<$($name: NativeType),+> Results for ($($name,)+) {
            fn kinds() -> SmallVec<[Kind; 1]> {
                SmallVec::from_slice(&[$($name::KIND),+])
            }

            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into_value()),+]
            }
        }
    };
}

tuple_results!(A, B);
tuple_results!(A, B, C);

/// Conversion of a plain Rust function into a [`Callable`].
///
/// `Marker` is the `fn` pointer type of the signature; it only exists to keep
/// the impls for different arities apart.
pub trait IntoCallable<Marker> {
    type Callable: Callable;

    fn into_callable(self) -> Self::Callable;
}

/// A Rust function adapted to [`Callable`].
pub struct NativeFn<F, Marker> {
    f: F,
    _marker: PhantomData<Marker>,
}

macro_rules! native_fn {
    ($($arg:ident: $A:ident),*) => {
        impl<F, R, $($A),*> Callable for NativeFn<F, fn($($A),*) -> R>
        where
            F: Fn($($A),*) -> R + Send + Sync + 'static,
            R: Results + 'static,
            $($A: NativeType + 'static),*
        {
            fn signature(&self) -> Signature {
                let params: &[Kind] = &[$($A::KIND),*];
                Signature::new(params.iter().copied(), R::kinds())
            }

            #[allow(unused_mut, unused_variables)]
            fn call(&self, args: &[Value]) -> Vec<Value> {
                let expected = self.signature().params.len();
                if args.len() != expected {
                    tracing::error!(expected, got = args.len(), "native closure called with wrong argument count");
                    return Vec::new();
                }
                let mut args = args.iter().cloned();
                $(
                    let Some($arg) = args.next().and_then($A::from_value) else {
                        tracing::error!(expected = %$A::KIND, "native closure argument has the wrong kind");
                        return Vec::new();
                    };
                )*
                (self.f)($($arg),*).into_values()
            }
        }

        impl<F, R, $($A),*> IntoCallable<fn($($A),*) -> R> for F
        where
            F: Fn($($A),*) -> R + Send + Sync + 'static,
            R: Results + 'static,
            $($A: NativeType + 'static),*
        {
            type Callable = NativeFn<F, fn($($A),*) -> R>;

            fn into_callable(self) -> Self::Callable {
                NativeFn {
                    f: self,
                    _marker: PhantomData,
                }
            }
        }
    };
}

native_fn!();
native_fn!(a: A);
native_fn!(a: A, b: B);
native_fn!(a: A, b: B, c: C);
native_fn!(a: A, b: B, c: C, d: D);
native_fn!(a: A, b: B, c: C, d: D, e: E);
native_fn!(a: A, b: B, c: C, d: D, e: E, g: G);

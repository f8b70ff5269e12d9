//! One-shot calls with natively-typed values.

use libffi::low::CodePtr;

use crate::error::{Error, Result, Role};
use crate::interface::CallInterface;
use crate::marshal::{decode_return, ArgumentFrame, Slot};
use crate::types::Type;
use crate::value::{Kind, Signature, Value};

/// Call `fptr` with `args`, deriving the signature from the values.
///
/// When `ret` is present, the variant it currently holds selects the return
/// kind and is overwritten with the result; `None` calls a `void` function.
/// Text arguments are copied into temporary buffers that are released before
/// this returns, on success and on failure.
///
/// # Safety
/// `fptr` must be a function whose C signature matches the descriptors of
/// `ret` and `args`.
///
/// ```no_run
/// # use dynffi::{call, CodePtr, Value};
/// extern "C" fn twice(n: i32) -> i32 { n * 2 }
///
/// let mut out = Value::Int32(0);
/// unsafe { call(CodePtr(twice as *mut _), Some(&mut out), &[Value::Int32(21)]) }?;
/// assert_eq!(out, Value::Int32(42));
/// # Ok::<(), dynffi::Error>(())
/// ```
pub unsafe fn call(fptr: CodePtr, ret: Option<&mut Value>, args: &[Value]) -> Result<()> {
    let mut frame = ArgumentFrame::marshal(args)?;
    let rtype = ret.as_deref().map_or(Type::VOID, Value::descriptor);
    let interface = CallInterface::prepare(rtype, frame.types())?;
    dispatch(&interface, fptr, ret, &mut frame)?;
    Ok(())
}

/// Call through an already prepared interface.
///
/// Every value is checked against the descriptor the interface was prepared
/// with; a value of a different layout fails with [`Error::TypeMismatch`]
/// before anything is marshalled. `ret` may be omitted to discard a result.
///
/// # Safety
/// `fptr` must be a function matching `interface`.
pub unsafe fn call_with(
    interface: &CallInterface,
    fptr: CodePtr,
    ret: Option<&mut Value>,
    args: &[Value],
) -> Result<()> {
    check_values(interface, ret.as_deref(), args)?;
    let mut frame = ArgumentFrame::marshal(args)?;
    dispatch(interface, fptr, ret, &mut frame)?;
    Ok(())
}

/// Check values against the descriptors `interface` was prepared with.
///
/// Matching is by machine layout only, so text and pointer values both pass
/// for `void *`. That is enough for [`call_with`] and [`ForeignFunction`],
/// whose callers vouch for the foreign signature through `unsafe`. Callers
/// that decode text on the far side must also run [`check_kinds`].
///
/// [`ForeignFunction`]: crate::function::ForeignFunction
pub(crate) fn check_values(
    interface: &CallInterface,
    ret: Option<&Value>,
    args: &[Value],
) -> Result<()> {
    let expected = interface.argument_types();
    if args.len() != expected.len() {
        return Err(Error::arity_mismatch(expected.len(), args.len()));
    }
    for (index, (arg, &want)) in args.iter().zip(expected).enumerate() {
        let got = arg.descriptor();
        if !got.same_layout(want) {
            return Err(Error::TypeMismatch {
                role: Role::Argument,
                index,
                expected: want,
                got,
            });
        }
    }
    if let Some(ret) = ret {
        let want = interface.return_type();
        let got = ret.descriptor();
        if !got.same_layout(want) {
            return Err(Error::TypeMismatch {
                role: Role::Return,
                index: 0,
                expected: want,
                got,
            });
        }
    }
    Ok(())
}

/// Check values against the declared kinds of a signature.
///
/// Layout-compatible kinds (`Int` and `Int32`) interoperate, but text never
/// stands in for a pointer or the other way round: text on either side is
/// dereferenced as a C string.
pub(crate) fn check_kinds(signature: &Signature, ret: Option<&Value>, args: &[Value]) -> Result<()> {
    if args.len() != signature.params.len() {
        return Err(Error::arity_mismatch(signature.params.len(), args.len()));
    }
    for (index, (arg, &want)) in args.iter().zip(&signature.params).enumerate() {
        if !kinds_agree(want, arg.kind()) {
            return Err(Error::TypeMismatch {
                role: Role::Argument,
                index,
                expected: want.descriptor(),
                got: arg.descriptor(),
            });
        }
    }
    if let (Some(ret), Some(&want)) = (ret, signature.results.first()) {
        if !kinds_agree(want, ret.kind()) {
            return Err(Error::TypeMismatch {
                role: Role::Return,
                index: 0,
                expected: want.descriptor(),
                got: ret.descriptor(),
            });
        }
    }
    Ok(())
}

fn kinds_agree(want: Kind, got: Kind) -> bool {
    if want == got {
        return true;
    }
    want != Kind::Text && got != Kind::Text && want.descriptor().same_layout(got.descriptor())
}

/// Invoke with a marshalled frame and decode the result into `ret`.
///
/// `ret` is written only after a successful dispatch. The raw return slot is
/// handed back for callers that own what it points to.
pub(crate) unsafe fn dispatch(
    interface: &CallInterface,
    fptr: CodePtr,
    ret: Option<&mut Value>,
    frame: &mut ArgumentFrame,
) -> Result<Slot> {
    let mut rslot = Slot::zeroed();
    let mut avalue = frame.pointers();
    interface.invoke(fptr, rslot.as_mut_ptr(), &mut avalue)?;
    if let Some(ret) = ret {
        *ret = decode_return(ret.kind(), rslot.as_ptr());
    }
    Ok(rslot)
}

use mir_core::error::Result;
use mir_core::mir::{Constant, LValue, RValue};
use mir_core::resolve::VTABLE_SUFFIX;
use mir_core::types::{Path, TypePathBinding, TypeRef};

use crate::mutator::Mutator;
use crate::state::CleanupState;
use crate::vtable::vtable_pointer_type;

/// Widen the thin pointer `ptr` (to `src_inner`) into a pointer of type
/// `dst_ty` (to `dst_inner`), building the fat pointer's metadata word.
pub fn unsize(
    state: &mut CleanupState<'_>,
    mutator: &mut Mutator<'_>,
    dst_ty: &TypeRef,
    dst_inner: &TypeRef,
    src_inner: &TypeRef,
    ptr: LValue,
) -> Result<RValue> {
    state.report.unsizings += 1;
    match dst_inner {
        // Still generic: a later monomorphisation decides the pointer class.
        TypeRef::Generic { .. } => Ok(RValue::Cast {
            val: ptr,
            ty: dst_ty.clone(),
        }),
        TypeRef::Slice { .. } => {
            let meta = match src_inner {
                TypeRef::Array { size, .. } => {
                    mutator.in_temporary(TypeRef::usize(), RValue::Constant(Constant::Uint(*size)))
                }
                TypeRef::Generic { .. } => {
                    mutator.in_temporary(TypeRef::usize(), RValue::DstMeta(ptr.clone()))
                }
                TypeRef::Path {
                    binding: TypePathBinding::Opaque,
                    ..
                } => {
                    mutator.in_temporary(TypeRef::usize(), RValue::DstMeta(ptr.clone()))
                }
                other => crate::mir_bug!(state, "cannot unsize {} to {}", other, dst_inner),
            };
            mir_core::debug!("{}: unsize {} to {} with length {}", state.context(), src_inner, dst_inner, meta);
            Ok(RValue::MakeDst { ptr, meta })
        }
        TypeRef::TraitObject(dst_object) => {
            if let TypeRef::TraitObject(_) = src_inner {
                let data = mutator.in_temporary(TypeRef::unit_ptr(), RValue::DstPtr(ptr.clone()));
                let meta = mutator.in_temporary(TypeRef::unit_ptr(), RValue::DstMeta(ptr));
                return Ok(RValue::MakeDst { ptr: data, meta });
            }

            let meta = if dst_object.trait_.path.path.is_empty() {
                let null = mutator.in_temporary(TypeRef::usize(), RValue::Constant(Constant::Uint(0)));
                mutator.in_temporary(
                    TypeRef::unit_ptr(),
                    RValue::Cast {
                        val: null,
                        ty: TypeRef::unit_ptr(),
                    },
                )
            } else {
                let vtable_ty = vtable_pointer_type(state, &dst_object.trait_)?;
                let vtable = Path::UfcsKnown {
                    ty: Box::new(src_inner.clone()),
                    trait_: dst_object.trait_.path.clone(),
                    item: VTABLE_SUFFIX.to_string(),
                    params: Default::default(),
                };
                mutator.in_temporary(vtable_ty, RValue::Constant(Constant::ItemAddr(vtable)))
            };
            mir_core::debug!("{}: unsize {} to {}", state.context(), src_inner, dst_inner);
            Ok(RValue::MakeDst { ptr, meta })
        }
        other => crate::mir_bug!(state, "do not know how to unsize to {}", other),
    }
}

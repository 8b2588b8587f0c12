use mir_core::error::Result;
use mir_core::mir::{LValue, RValue};
use mir_core::types::{Path, TypeRef};

use crate::mutator::Mutator;
use crate::state::CleanupState;
use crate::unsize::unsize;

/// Lower a `CoerceUnsized` cast of `value` from `src_ty` to `dst_ty`.
///
/// Wrapper structs are rebuilt field by field, recursing into the single
/// field marked for propagation; the other fields are projected out of
/// `value` unchanged.
pub fn coerce_unsized(
    state: &mut CleanupState<'_>,
    mutator: &mut Mutator<'_>,
    dst_ty: &TypeRef,
    src_ty: &TypeRef,
    value: LValue,
) -> Result<RValue> {
    match dst_ty {
        TypeRef::Path { path, binding } => {
            let TypeRef::Path {
                path: src_path,
                binding: src_binding,
            } = src_ty
            else {
                crate::mir_malformed!(state, "CoerceUnsized from {} to {}", src_ty, dst_ty);
            };
            let (Some(dst_def), Some(src_def)) = (binding.as_struct(), src_binding.as_struct())
            else {
                crate::mir_bug!(state, "CoerceUnsized between non-structs {} and {}", src_ty, dst_ty);
            };
            crate::mir_ensure!(
                state,
                dst_def == src_def,
                "CoerceUnsized between different structs {} and {}",
                src_ty,
                dst_ty
            );
            let (Path::Generic(dst_path), Path::Generic(src_path)) = (path, src_path) else {
                crate::mir_bug!(state, "CoerceUnsized on non-generic path {}", dst_ty);
            };
            crate::mir_ensure!(
                state,
                !dst_def.is_unit(),
                "CoerceUnsized on unit-like struct {}",
                dst_def.path
            );
            let Some(coerce_idx) = dst_def.markings.coerce_unsized_index else {
                crate::mir_bug!(
                    state,
                    "CoerceUnsized on {} which has no coercion field",
                    dst_def.path
                );
            };
            crate::mir_ensure!(
                state,
                coerce_idx < dst_def.field_count(),
                "coercion field {} out of range for {}",
                coerce_idx,
                dst_def.path
            );

            state.report.coercions += 1;
            let mut vals = Vec::with_capacity(dst_def.field_count());
            for idx in 0..dst_def.field_count() {
                let field = value.clone().field(idx);
                if idx != coerce_idx {
                    vals.push(field);
                    continue;
                }
                let (Some(dst_field), Some(src_field)) =
                    (dst_def.field_type(idx), src_def.field_type(idx))
                else {
                    crate::mir_bug!(state, "field {} missing from {}", idx, dst_def.path);
                };
                let dst_field = dst_field.monomorphise(&dst_path.params);
                let src_field = src_field.monomorphise(&src_path.params);
                let new_value = coerce_unsized(state, mutator, &dst_field, &src_field, field)?;
                vals.push(mutator.in_temporary(dst_field, new_value));
            }
            Ok(RValue::Struct {
                path: dst_path.clone(),
                vals,
            })
        }
        TypeRef::Borrow { inner, .. } => {
            let TypeRef::Borrow {
                inner: src_inner, ..
            } = src_ty
            else {
                crate::mir_malformed!(state, "CoerceUnsized from {} to {}", src_ty, dst_ty);
            };
            unsize(state, mutator, dst_ty, inner, src_inner, value)
        }
        TypeRef::Pointer { kind, inner } => {
            let TypeRef::Pointer {
                kind: src_kind,
                inner: src_inner,
            } = src_ty
            else {
                crate::mir_malformed!(state, "CoerceUnsized from {} to {}", src_ty, dst_ty);
            };
            if kind == src_kind {
                return unsize(state, mutator, dst_ty, inner, src_inner, value);
            }
            crate::mir_ensure!(
                state,
                kind < src_kind,
                "pointer coercion widens permission: {} to {}",
                src_ty,
                dst_ty
            );
            crate::mir_ensure!(
                state,
                inner == src_inner,
                "pointer coercion changes permission and pointee: {} to {}",
                src_ty,
                dst_ty
            );
            Ok(RValue::Cast {
                val: value,
                ty: dst_ty.clone(),
            })
        }
        other => crate::mir_malformed!(state, "CoerceUnsized to {}", other),
    }
}

//! Lowering of trait-object method calls to calls through the vtable.

use itertools::Itertools;
use mir_core::error::Result;
use mir_core::mir::{CallTarget, LValue, RValue, TerminatorKind};
use mir_core::types::{
    GenericPath, Path, PathParams, TraitDef, TraitObjectType, TypeRef, VtableSlot,
};

use crate::mutator::Mutator;
use crate::options::SlotAmbiguity;
use crate::state::CleanupState;
use crate::vtable::{object_trait_def, vtable_pointer_type};

/// Rewrite `<dyn Trait as Trait>::method(recv, ..)` into a call through
/// the receiver's vtable. Returns whether the call was rewritten.
pub fn virtualize_call(
    state: &mut CleanupState<'_>,
    mutator: &mut Mutator<'_>,
    kind: &mut TerminatorKind,
) -> Result<bool> {
    let TerminatorKind::Call { fcn, args, .. } = kind else {
        return Ok(false);
    };
    let CallTarget::Path(Path::UfcsKnown {
        ty, trait_, item, ..
    }) = &*fcn
    else {
        return Ok(false);
    };
    let TypeRef::TraitObject(object) = ty.as_ref() else {
        return Ok(false);
    };

    let trait_def = object_trait_def(state, &object.trait_)?;
    if !names_object_trait(state, object, &trait_def, trait_, ty) {
        return Ok(false);
    }

    let slot = select_slot(state, &trait_def, &object.trait_.path.params, trait_, item)?;
    let Some(receiver) = args.first_mut() else {
        crate::mir_bug!(state, "call to {} has no receiver", item);
    };

    // Metadata word typed as a pointer to the instantiated vtable struct.
    let vtable_ty = vtable_pointer_type(state, &object.trait_)?;
    let vtable_lv = mutator.in_temporary(vtable_ty, RValue::DstMeta(receiver.clone().deref()));
    let ptr_lv = mutator.in_temporary(TypeRef::unit_ptr(), RValue::DstPtr(receiver.clone().deref()));
    *receiver = ptr_lv;

    mir_core::debug!(
        "{}: virtualized {} through slot {}",
        state.context(),
        item,
        slot
    );
    *fcn = CallTarget::Value(LValue::Field(Box::new(vtable_lv.deref()), slot));
    state.report.virtualized_calls += 1;
    Ok(true)
}

/// Is `named` the object's own trait, or reachable through its supertraits?
fn names_object_trait(
    state: &CleanupState<'_>,
    object: &TraitObjectType,
    trait_def: &TraitDef,
    named: &GenericPath,
    self_ty: &TypeRef,
) -> bool {
    if object.trait_.path == *named {
        return true;
    }
    state.resolve.find_named_trait_in_trait(
        &named.path,
        &named.params,
        trait_def,
        &object.trait_.path.path,
        &object.trait_.path.params,
        self_ty,
        &mut |_, _| {},
    )
}

/// Vtable index of `item` as declared by `named`. Slot owners are written
/// in terms of the object trait's parameters, `object_params`.
fn select_slot(
    state: &CleanupState<'_>,
    trait_def: &TraitDef,
    object_params: &PathParams,
    named: &GenericPath,
    item: &str,
) -> Result<usize> {
    let candidates: Vec<&VtableSlot> = trait_def
        .slots_named(item)
        .filter(|slot| slot.owner.path == named.path)
        .collect();

    if let Some(exact) = candidates
        .iter()
        .find(|slot| slot.owner.params.monomorphise(object_params) == named.params)
    {
        return Ok(exact.index);
    }
    let Some(first) = candidates.first() else {
        crate::mir_bug!(
            state,
            "calling method `{}` from {} through {} which isn't in the vtable",
            item,
            named,
            trait_def.path
        );
    };
    if candidates.len() > 1 {
        let message = format!(
            "method `{}` of {} matches vtable slots [{}]; using slot {}",
            item,
            named,
            candidates.iter().map(|slot| slot.index).join(", "),
            first.index
        );
        match state.options.slot_ambiguity {
            SlotAmbiguity::First => {}
            SlotAmbiguity::Warn => {
                let hint = format!(
                    "set slot_ambiguity to `{}` to accept the first slot silently",
                    SlotAmbiguity::First.as_str()
                );
                state.warn(&message, Some(hint));
            }
            SlotAmbiguity::Deny => crate::mir_bug!(state, "ambiguous vtable slot: {}", message),
        }
    }
    Ok(first.index)
}

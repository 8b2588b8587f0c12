use mir_core::error::Result;
use mir_core::resolve::VTABLE_SUFFIX;
use mir_core::types::{BorrowType, DefRef, GenericPath, TraitDef, TraitPath, TypeRef};

use crate::state::CleanupState;

/// Definition of the trait behind a trait object.
pub fn object_trait_def(state: &CleanupState<'_>, object_trait: &TraitPath) -> Result<DefRef<TraitDef>> {
    match &object_trait.trait_ptr {
        Some(def) => Ok(def.clone()),
        None => state.resolve.trait_by_path(&object_trait.path.path),
    }
}

/// `*const <Trait>#vtable<params>` for the given trait-object trait.
///
/// The vtable struct's parameters are the trait's own parameters followed
/// by its associated types, each placed at the slot the trait declares
/// for it. Slots with no binding keep the vtable struct's own generic.
pub fn vtable_pointer_type(state: &CleanupState<'_>, object_trait: &TraitPath) -> Result<TypeRef> {
    let trait_def = object_trait_def(state, object_trait)?;
    let vtable_path = object_trait.path.path.with_suffix(VTABLE_SUFFIX);
    let vtable_def = state.resolve.struct_by_path(&vtable_path)?;

    let mut params = object_trait.path.params.clone();
    for (name, ty) in &object_trait.type_bounds {
        let Some(idx) = trait_def.type_index(name) else {
            crate::mir_bug!(
                state,
                "associated type `{}` is not declared by {}",
                name,
                trait_def.path
            );
        };
        while params.types.len() <= idx {
            let slot = params.types.len();
            match vtable_def.params.as_generic(slot) {
                Some(generic) => params.types.push(generic),
                None => crate::mir_bug!(
                    state,
                    "vtable {} has no parameter slot {}",
                    vtable_path,
                    slot
                ),
            }
        }
        params.types[idx] = ty.clone();
    }

    Ok(TypeRef::new_pointer(
        BorrowType::Shared,
        TypeRef::new_struct(GenericPath::new(vtable_path, params), vtable_def),
    ))
}

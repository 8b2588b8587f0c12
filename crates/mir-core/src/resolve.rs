//! Read-only queries into the crate database that MIR passes consult.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::error::Result;
use crate::mir::Literal;
use crate::types::{
    DefRef, GenericParams, GenericPath, Path, PathParams, SimplePath, StructData, StructDef,
    StructMarkings, TraitDef, TraitPath, TypeRef,
};

/// Suffix appended to a trait's last path component to name its vtable
/// struct and vtable items.
pub const VTABLE_SUFFIX: &str = "#vtable";

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantValue {
    pub literal: Literal,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantLookup {
    Value(ConstantValue),
    /// The constant depends on generic parameters and has no single value.
    Generic,
    /// The path form cannot be resolved to a constant item here.
    Unresolvable,
}

/// Callback invoked with the instantiated supertrait path and its
/// associated type bindings once a named trait is found.
pub type AssocBindingCallback<'a> = dyn FnMut(&GenericPath, &BTreeMap<String, TypeRef>) + 'a;

/// Resolution oracle. Implementations must be safe to share between
/// threads cleaning different functions.
pub trait Resolve: Sync {
    fn constant(&self, path: &Path) -> Result<ConstantLookup>;
    fn struct_by_path(&self, path: &SimplePath) -> Result<DefRef<StructDef>>;
    fn trait_by_path(&self, path: &SimplePath) -> Result<DefRef<TraitDef>>;
    fn static_type(&self, path: &GenericPath) -> Result<TypeRef>;

    /// Is `des<des_params>` reachable from `trait_path<trait_params>`
    /// (whose definition is `trait_def`) through the supertrait chain?
    #[allow(clippy::too_many_arguments)]
    fn find_named_trait_in_trait(
        &self,
        des: &SimplePath,
        des_params: &PathParams,
        trait_def: &TraitDef,
        trait_path: &SimplePath,
        trait_params: &PathParams,
        self_ty: &TypeRef,
        callback: &mut AssocBindingCallback<'_>,
    ) -> bool;
}

#[derive(Debug, Clone)]
enum ConstantEntry {
    Value(ConstantValue),
    Generic,
}

/// In-memory crate database.
#[derive(Debug, Default)]
pub struct CrateDb {
    structs: HashMap<SimplePath, DefRef<StructDef>>,
    traits: HashMap<SimplePath, DefRef<TraitDef>>,
    constants: HashMap<SimplePath, ConstantEntry>,
    statics: HashMap<SimplePath, TypeRef>,
}

impl CrateDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_struct(&mut self, def: StructDef) -> DefRef<StructDef> {
        let def = DefRef::new(def);
        self.structs.insert(def.path.clone(), def.clone());
        def
    }

    /// Register a trait together with its vtable struct.
    pub fn add_trait(&mut self, def: TraitDef) -> DefRef<TraitDef> {
        self.add_struct(build_vtable_struct(&def));
        let def = DefRef::new(def);
        self.traits.insert(def.path.clone(), def.clone());
        def
    }

    pub fn add_constant(&mut self, path: SimplePath, ty: TypeRef, literal: Literal) {
        self.constants
            .insert(path, ConstantEntry::Value(ConstantValue { literal, ty }));
    }

    pub fn add_generic_constant(&mut self, path: SimplePath) {
        self.constants.insert(path, ConstantEntry::Generic);
    }

    pub fn add_static(&mut self, path: SimplePath, ty: TypeRef) {
        self.statics.insert(path, ty);
    }
}

/// The struct describing a trait's vtable layout: one pointer field per
/// method slot, parameterised by the trait's parameters followed by its
/// associated types in slot order. Slots no declaration claims are named
/// `_<index>`.
pub fn build_vtable_struct(def: &TraitDef) -> StructDef {
    let mut names = def.params.types.clone();
    let mut assoc: Vec<(&String, &usize)> = def.type_indexes.iter().collect();
    assoc.sort_by_key(|(_, idx)| **idx);
    for (name, idx) in assoc {
        while names.len() <= *idx {
            names.push(format!("_{}", names.len()));
        }
        names[*idx] = name.clone();
    }

    let slot_count = def
        .value_indexes
        .iter()
        .map(|slot| slot.index + 1)
        .max()
        .unwrap_or(0);

    StructDef {
        path: def.path.with_suffix(VTABLE_SUFFIX),
        params: GenericParams { types: names },
        data: StructData::Tuple(vec![TypeRef::unit_ptr(); slot_count]),
        markings: StructMarkings::default(),
    }
}

impl Resolve for CrateDb {
    fn constant(&self, path: &Path) -> Result<ConstantLookup> {
        let Path::Generic(generic) = path else {
            return Ok(ConstantLookup::Unresolvable);
        };
        let Some(entry) = self.constants.get(&generic.path) else {
            crate::bail!("no constant named `{}`", generic.path);
        };
        if !generic.params.is_empty() {
            return Ok(ConstantLookup::Generic);
        }
        Ok(match entry {
            ConstantEntry::Value(value) => ConstantLookup::Value(value.clone()),
            ConstantEntry::Generic => ConstantLookup::Generic,
        })
    }

    fn struct_by_path(&self, path: &SimplePath) -> Result<DefRef<StructDef>> {
        match self.structs.get(path) {
            Some(def) => Ok(def.clone()),
            None => crate::bail!("no struct named `{}`", path),
        }
    }

    fn trait_by_path(&self, path: &SimplePath) -> Result<DefRef<TraitDef>> {
        match self.traits.get(path) {
            Some(def) => Ok(def.clone()),
            None => crate::bail!("no trait named `{}`", path),
        }
    }

    fn static_type(&self, path: &GenericPath) -> Result<TypeRef> {
        match self.statics.get(&path.path) {
            Some(ty) => Ok(ty.monomorphise(&path.params)),
            None => crate::bail!("no static named `{}`", path),
        }
    }

    fn find_named_trait_in_trait(
        &self,
        des: &SimplePath,
        des_params: &PathParams,
        trait_def: &TraitDef,
        trait_path: &SimplePath,
        trait_params: &PathParams,
        _self_ty: &TypeRef,
        callback: &mut AssocBindingCallback<'_>,
    ) -> bool {
        let mut visited = HashSet::new();
        visited.insert(trait_path.clone());

        let mut queue: VecDeque<TraitPath> = trait_def
            .parent_traits
            .iter()
            .map(|parent| instantiate_parent(parent, trait_params))
            .collect();

        while let Some(parent) = queue.pop_front() {
            if parent.path.path == *des && parent.path.params == *des_params {
                callback(&parent.path, &parent.type_bounds);
                return true;
            }
            if !visited.insert(parent.path.path.clone()) {
                continue;
            }
            let parent_def = match &parent.trait_ptr {
                Some(def) => def.clone(),
                None => match self.traits.get(&parent.path.path) {
                    Some(def) => def.clone(),
                    None => continue,
                },
            };
            for grandparent in &parent_def.parent_traits {
                queue.push_back(instantiate_parent(grandparent, &parent.path.params));
            }
        }
        false
    }
}

fn instantiate_parent(parent: &TraitPath, params: &PathParams) -> TraitPath {
    TraitPath {
        path: parent.path.monomorphise(params),
        type_bounds: parent
            .type_bounds
            .iter()
            .map(|(name, ty)| (name.clone(), ty.monomorphise(params)))
            .collect(),
        trait_ptr: parent.trait_ptr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CoreType, VtableSlot};

    fn slot(name: &str, index: usize, owner: &str) -> VtableSlot {
        VtableSlot {
            name: name.to_string(),
            index,
            owner: SimplePath::parse(owner).into(),
        }
    }

    fn hierarchy() -> CrateDb {
        let mut db = CrateDb::new();
        let mut base = TraitDef::new(SimplePath::parse("demo::Base"));
        base.params = GenericParams::new(["T"]);
        base.value_indexes = vec![slot("get", 3, "demo::Base")];
        db.add_trait(base);

        let mut mid = TraitDef::new(SimplePath::parse("demo::Mid"));
        mid.parent_traits = vec![TraitPath::new(
            GenericPath::new(
                SimplePath::parse("demo::Base"),
                PathParams::new(vec![TypeRef::Primitive(CoreType::U8)]),
            ),
            None,
        )
        .with_bound("Out", TypeRef::Primitive(CoreType::Bool))];
        db.add_trait(mid);
        db
    }

    #[test]
    fn supertrait_search_walks_grandparents() {
        let mut db = hierarchy();
        let mut top = TraitDef::new(SimplePath::parse("demo::Top"));
        top.parent_traits = vec![TraitPath::new(SimplePath::parse("demo::Mid").into(), None)];
        let top = db.add_trait(top);

        let mut seen = Vec::new();
        let found = db.find_named_trait_in_trait(
            &SimplePath::parse("demo::Base"),
            &PathParams::new(vec![TypeRef::Primitive(CoreType::U8)]),
            &top,
            &top.path,
            &PathParams::default(),
            &TypeRef::unit(),
            &mut |path, bounds| seen.push((path.clone(), bounds.len())),
        );
        assert!(found);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, 1);

        let found_other = db.find_named_trait_in_trait(
            &SimplePath::parse("demo::Base"),
            &PathParams::new(vec![TypeRef::Primitive(CoreType::U16)]),
            &top,
            &top.path,
            &PathParams::default(),
            &TypeRef::unit(),
            &mut |_, _| {},
        );
        assert!(!found_other);
    }

    #[test]
    fn vtable_struct_has_one_field_per_slot() {
        let db = hierarchy();
        let vtable = db
            .struct_by_path(&SimplePath::parse("demo::Base#vtable"))
            .expect("vtable registered");
        assert_eq!(vtable.field_count(), 4);
        assert_eq!(vtable.params.types, vec!["T".to_string()]);
    }

    #[test]
    fn constants_with_params_are_generic() {
        let mut db = CrateDb::new();
        let path = SimplePath::parse("demo::N");
        db.add_constant(path.clone(), TypeRef::usize(), Literal::Integer(3));

        let plain = db.constant(&Path::from(path.clone())).unwrap();
        assert!(matches!(plain, ConstantLookup::Value(_)));

        let generic = db
            .constant(&Path::Generic(GenericPath::new(
                path,
                PathParams::new(vec![TypeRef::usize()]),
            )))
            .unwrap();
        assert_eq!(generic, ConstantLookup::Generic);

        assert!(db.constant(&Path::from(SimplePath::parse("demo::Missing"))).is_err());
    }
}

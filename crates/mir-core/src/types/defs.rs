//! Struct and trait definitions, fixed before MIR cleanup runs.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::{GenericPath, SimplePath, TraitPath, TypeRef};

/// Shared handle to a definition. Equality is definition identity: two
/// handles are equal only if they point at the same definition.
pub struct DefRef<T>(Arc<T>);

impl<T> DefRef<T> {
    pub fn new(def: T) -> Self {
        Self(Arc::new(def))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for DefRef<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for DefRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> PartialEq for DefRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for DefRef<T> {}

impl<T: Definition> fmt::Debug for DefRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefRef({})", self.0.def_path())
    }
}

pub trait Definition {
    fn def_path(&self) -> &SimplePath;
}

/// Names of the type parameters a definition declares, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericParams {
    pub types: Vec<String>,
}

impl GenericParams {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            types: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The declared parameter at `index` as a generic type, if any.
    pub fn as_generic(&self, index: usize) -> Option<TypeRef> {
        self.types
            .get(index)
            .map(|name| TypeRef::new_generic(name.clone(), index))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructData {
    Unit,
    Tuple(Vec<TypeRef>),
    Named(Vec<(String, TypeRef)>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructMarkings {
    /// The single field through which `CoerceUnsized` propagates.
    pub coerce_unsized_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub path: SimplePath,
    pub params: GenericParams,
    pub data: StructData,
    pub markings: StructMarkings,
}

impl StructDef {
    pub fn field_count(&self) -> usize {
        match &self.data {
            StructData::Unit => 0,
            StructData::Tuple(fields) => fields.len(),
            StructData::Named(fields) => fields.len(),
        }
    }

    /// Declared (un-instantiated) type of field `idx`.
    pub fn field_type(&self, idx: usize) -> Option<&TypeRef> {
        match &self.data {
            StructData::Unit => None,
            StructData::Tuple(fields) => fields.get(idx),
            StructData::Named(fields) => fields.get(idx).map(|(_, ty)| ty),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self.data, StructData::Unit)
    }
}

impl Definition for StructDef {
    fn def_path(&self) -> &SimplePath {
        &self.path
    }
}

/// One entry of a trait's vtable layout.
#[derive(Debug, Clone, PartialEq)]
pub struct VtableSlot {
    pub name: String,
    pub index: usize,
    /// The trait that declares the method; differs from the object trait
    /// for methods inherited from a supertrait.
    pub owner: GenericPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitDef {
    pub path: SimplePath,
    pub params: GenericParams,
    /// Direct supertraits, written in terms of this trait's parameters.
    pub parent_traits: Vec<TraitPath>,
    /// Method slots in vtable order, including inherited methods.
    pub value_indexes: Vec<VtableSlot>,
    /// Associated type name to its parameter slot on the vtable struct.
    pub type_indexes: BTreeMap<String, usize>,
}

impl TraitDef {
    pub fn new(path: SimplePath) -> Self {
        Self {
            path,
            params: GenericParams::default(),
            parent_traits: Vec::new(),
            value_indexes: Vec::new(),
            type_indexes: BTreeMap::new(),
        }
    }

    pub fn slots_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a VtableSlot> + 'a {
        self.value_indexes.iter().filter(move |slot| slot.name == name)
    }

    pub fn type_index(&self, name: &str) -> Option<usize> {
        self.type_indexes.get(name).copied()
    }
}

impl Definition for TraitDef {
    fn def_path(&self) -> &SimplePath {
        &self.path
    }
}

//! Fully resolved types as seen after monomorphisation.

use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;

pub mod defs;
pub mod path;

pub use defs::{
    DefRef, Definition, GenericParams, StructData, StructDef, StructMarkings, TraitDef, VtableSlot,
};
pub use path::{GenericPath, Path, PathParams, SimplePath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreType {
    Usize,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    Bool,
    Char,
    Str,
}

impl CoreType {
    /// Kinds whose constants are materialized as unsigned literals.
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            CoreType::Usize
                | CoreType::U8
                | CoreType::U16
                | CoreType::U32
                | CoreType::U64
                | CoreType::U128
                | CoreType::Char
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            CoreType::Isize
                | CoreType::I8
                | CoreType::I16
                | CoreType::I32
                | CoreType::I64
                | CoreType::I128
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, CoreType::F32 | CoreType::F64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoreType::Usize => "usize",
            CoreType::Isize => "isize",
            CoreType::U8 => "u8",
            CoreType::U16 => "u16",
            CoreType::U32 => "u32",
            CoreType::U64 => "u64",
            CoreType::U128 => "u128",
            CoreType::I8 => "i8",
            CoreType::I16 => "i16",
            CoreType::I32 => "i32",
            CoreType::I64 => "i64",
            CoreType::I128 => "i128",
            CoreType::F32 => "f32",
            CoreType::F64 => "f64",
            CoreType::Bool => "bool",
            CoreType::Char => "char",
            CoreType::Str => "str",
        }
    }
}

impl fmt::Display for CoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission class of a borrow or raw pointer. Ordered from least to most
/// permissive, so `a < b` means `a` is narrower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BorrowType {
    Shared,
    Unique,
    Owned,
}

/// What a path type resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum TypePathBinding {
    Unbound,
    /// An associated type or `impl Trait` that is not yet known.
    Opaque,
    Struct(DefRef<StructDef>),
}

impl TypePathBinding {
    pub fn as_struct(&self) -> Option<&DefRef<StructDef>> {
        match self {
            TypePathBinding::Struct(def) => Some(def),
            _ => None,
        }
    }
}

/// A trait reference with its associated type bindings, as used in a
/// trait object.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitPath {
    pub path: GenericPath,
    pub type_bounds: BTreeMap<String, TypeRef>,
    pub trait_ptr: Option<DefRef<TraitDef>>,
}

impl TraitPath {
    pub fn new(path: GenericPath, trait_ptr: Option<DefRef<TraitDef>>) -> Self {
        Self {
            path,
            type_bounds: BTreeMap::new(),
            trait_ptr,
        }
    }

    pub fn with_bound(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.type_bounds.insert(name.into(), ty);
        self
    }
}

impl fmt::Display for TraitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.path)?;
        let args = self
            .path
            .params
            .types
            .iter()
            .map(|ty| ty.to_string())
            .chain(
                self.type_bounds
                    .iter()
                    .map(|(name, ty)| format!("{}={}", name, ty)),
            )
            .collect::<Vec<_>>();
        if !args.is_empty() {
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitObjectType {
    pub trait_: TraitPath,
    /// Auto/marker traits, e.g. `Send`.
    pub markers: Vec<GenericPath>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub is_unsafe: bool,
    pub abi: String,
    pub args: Vec<TypeRef>,
    pub ret: Box<TypeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// `!`
    Diverge,
    Primitive(CoreType),
    /// Tuples; the empty tuple is unit.
    Tuple(Vec<TypeRef>),
    Path {
        path: Path,
        binding: TypePathBinding,
    },
    /// A type parameter that survived monomorphisation.
    Generic {
        name: String,
        index: usize,
    },
    TraitObject(TraitObjectType),
    Array {
        inner: Box<TypeRef>,
        size: u64,
    },
    Slice {
        inner: Box<TypeRef>,
    },
    Borrow {
        kind: BorrowType,
        inner: Box<TypeRef>,
    },
    Pointer {
        kind: BorrowType,
        inner: Box<TypeRef>,
    },
    Function(FunctionType),
}

impl TypeRef {
    pub fn unit() -> Self {
        TypeRef::Tuple(Vec::new())
    }

    pub fn usize() -> Self {
        TypeRef::Primitive(CoreType::Usize)
    }

    pub fn new_borrow(kind: BorrowType, inner: TypeRef) -> Self {
        TypeRef::Borrow {
            kind,
            inner: Box::new(inner),
        }
    }

    pub fn new_pointer(kind: BorrowType, inner: TypeRef) -> Self {
        TypeRef::Pointer {
            kind,
            inner: Box::new(inner),
        }
    }

    /// `*const ()`, the type of a bare data or vtable word.
    pub fn unit_ptr() -> Self {
        TypeRef::new_pointer(BorrowType::Shared, TypeRef::unit())
    }

    pub fn new_slice(inner: TypeRef) -> Self {
        TypeRef::Slice {
            inner: Box::new(inner),
        }
    }

    pub fn new_array(inner: TypeRef, size: u64) -> Self {
        TypeRef::Array {
            inner: Box::new(inner),
            size,
        }
    }

    pub fn new_generic(name: impl Into<String>, index: usize) -> Self {
        TypeRef::Generic {
            name: name.into(),
            index,
        }
    }

    pub fn new_struct(path: GenericPath, def: DefRef<StructDef>) -> Self {
        TypeRef::Path {
            path: Path::Generic(path),
            binding: TypePathBinding::Struct(def),
        }
    }

    pub fn new_trait_object(trait_: TraitPath) -> Self {
        TypeRef::TraitObject(TraitObjectType {
            trait_,
            markers: Vec::new(),
        })
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeRef::Tuple(items) if items.is_empty())
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, TypeRef::Generic { .. })
    }

    /// Type behind a borrow or raw pointer.
    pub fn pointee(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Borrow { inner, .. } | TypeRef::Pointer { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// `[u8]` or `[u8; N]`
    pub fn is_byte_sequence(&self) -> bool {
        match self {
            TypeRef::Slice { inner } | TypeRef::Array { inner, .. } => {
                **inner == TypeRef::Primitive(CoreType::U8)
            }
            _ => false,
        }
    }

    /// Substitute generic parameters by index. Generics past the end of
    /// `params` are kept as they are.
    pub fn monomorphise(&self, params: &PathParams) -> TypeRef {
        match self {
            TypeRef::Generic { index, .. } => params
                .types
                .get(*index)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeRef::Diverge | TypeRef::Primitive(_) => self.clone(),
            TypeRef::Tuple(items) => {
                TypeRef::Tuple(items.iter().map(|ty| ty.monomorphise(params)).collect())
            }
            TypeRef::Path { path, binding } => TypeRef::Path {
                path: monomorphise_path(path, params),
                binding: binding.clone(),
            },
            TypeRef::TraitObject(object) => TypeRef::TraitObject(TraitObjectType {
                trait_: TraitPath {
                    path: object.trait_.path.monomorphise(params),
                    type_bounds: object
                        .trait_
                        .type_bounds
                        .iter()
                        .map(|(name, ty)| (name.clone(), ty.monomorphise(params)))
                        .collect(),
                    trait_ptr: object.trait_.trait_ptr.clone(),
                },
                markers: object
                    .markers
                    .iter()
                    .map(|marker| marker.monomorphise(params))
                    .collect(),
            }),
            TypeRef::Array { inner, size } => TypeRef::Array {
                inner: Box::new(inner.monomorphise(params)),
                size: *size,
            },
            TypeRef::Slice { inner } => TypeRef::new_slice(inner.monomorphise(params)),
            TypeRef::Borrow { kind, inner } => TypeRef::new_borrow(*kind, inner.monomorphise(params)),
            TypeRef::Pointer { kind, inner } => {
                TypeRef::new_pointer(*kind, inner.monomorphise(params))
            }
            TypeRef::Function(func) => TypeRef::Function(FunctionType {
                is_unsafe: func.is_unsafe,
                abi: func.abi.clone(),
                args: func.args.iter().map(|ty| ty.monomorphise(params)).collect(),
                ret: Box::new(func.ret.monomorphise(params)),
            }),
        }
    }
}

fn monomorphise_path(path: &Path, params: &PathParams) -> Path {
    match path {
        Path::Generic(path) => Path::Generic(path.monomorphise(params)),
        Path::UfcsKnown {
            ty,
            trait_,
            item,
            params: item_params,
        } => Path::UfcsKnown {
            ty: Box::new(ty.monomorphise(params)),
            trait_: trait_.monomorphise(params),
            item: item.clone(),
            params: item_params.monomorphise(params),
        },
        Path::UfcsInherent {
            ty,
            item,
            params: item_params,
        } => Path::UfcsInherent {
            ty: Box::new(ty.monomorphise(params)),
            item: item.clone(),
            params: item_params.monomorphise(params),
        },
        Path::UfcsUnknown {
            ty,
            item,
            params: item_params,
        } => Path::UfcsUnknown {
            ty: Box::new(ty.monomorphise(params)),
            item: item.clone(),
            params: item_params.monomorphise(params),
        },
    }
}

fn borrow_prefix(kind: BorrowType) -> &'static str {
    match kind {
        BorrowType::Shared => "&",
        BorrowType::Unique => "&mut ",
        BorrowType::Owned => "&move ",
    }
}

fn pointer_prefix(kind: BorrowType) -> &'static str {
    match kind {
        BorrowType::Shared => "*const ",
        BorrowType::Unique => "*mut ",
        BorrowType::Owned => "*move ",
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Diverge => write!(f, "!"),
            TypeRef::Primitive(core) => write!(f, "{}", core),
            TypeRef::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            TypeRef::Tuple(items) => write!(f, "({})", items.iter().join(", ")),
            TypeRef::Path { path, .. } => write!(f, "{}", path),
            TypeRef::Generic { name, .. } => write!(f, "{}", name),
            TypeRef::TraitObject(object) => {
                write!(f, "dyn {}", object.trait_)?;
                for marker in &object.markers {
                    write!(f, " + {}", marker)?;
                }
                Ok(())
            }
            TypeRef::Array { inner, size } => write!(f, "[{}; {}]", inner, size),
            TypeRef::Slice { inner } => write!(f, "[{}]", inner),
            TypeRef::Borrow { kind, inner } => write!(f, "{}{}", borrow_prefix(*kind), inner),
            TypeRef::Pointer { kind, inner } => write!(f, "{}{}", pointer_prefix(*kind), inner),
            TypeRef::Function(func) => {
                if func.is_unsafe {
                    write!(f, "unsafe ")?;
                }
                if !func.abi.is_empty() && func.abi != "Rust" {
                    write!(f, "extern \"{}\" ", func.abi)?;
                }
                write!(f, "fn({}) -> {}", func.args.iter().join(", "), func.ret)
            }
        }
    }
}

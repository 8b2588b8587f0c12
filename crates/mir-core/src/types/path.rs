//! Item and value paths.

use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

use super::TypeRef;

/// A plain, parameterless path to an item, e.g. `core::ops::Fn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SimplePath {
    pub crate_name: String,
    pub components: Vec<String>,
}

impl SimplePath {
    pub fn new(crate_name: impl Into<String>, components: Vec<String>) -> Self {
        Self {
            crate_name: crate_name.into(),
            components,
        }
    }

    /// Build from a `crate::a::b` style string; the first segment is the crate.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split("::").filter(|part| !part.is_empty());
        let crate_name = parts.next().unwrap_or_default().to_string();
        Self {
            crate_name,
            components: parts.map(str::to_string).collect(),
        }
    }

    /// The degenerate path carried by trait objects without a principal trait.
    pub fn is_empty(&self) -> bool {
        self.crate_name.is_empty() && self.components.is_empty()
    }

    /// Copy of this path with `suffix` appended to its final component.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut rv = self.clone();
        match rv.components.last_mut() {
            Some(last) => last.push_str(suffix),
            None => rv.crate_name.push_str(suffix),
        }
        rv
    }
}

impl Display for SimplePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<none>");
        }
        write!(f, "{}", self.crate_name)?;
        for component in &self.components {
            write!(f, "::{}", component)?;
        }
        Ok(())
    }
}

/// Type arguments supplied to a path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathParams {
    pub types: Vec<TypeRef>,
}

impl PathParams {
    pub fn new(types: Vec<TypeRef>) -> Self {
        Self { types }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn monomorphise(&self, params: &PathParams) -> PathParams {
        PathParams {
            types: self.types.iter().map(|ty| ty.monomorphise(params)).collect(),
        }
    }
}

impl Display for PathParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.types.is_empty() {
            return Ok(());
        }
        write!(f, "<{}>", self.types.iter().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericPath {
    pub path: SimplePath,
    pub params: PathParams,
}

impl GenericPath {
    pub fn new(path: SimplePath, params: PathParams) -> Self {
        Self { path, params }
    }

    pub fn monomorphise(&self, params: &PathParams) -> GenericPath {
        GenericPath {
            path: self.path.clone(),
            params: self.params.monomorphise(params),
        }
    }
}

impl From<SimplePath> for GenericPath {
    fn from(path: SimplePath) -> Self {
        Self {
            path,
            params: PathParams::default(),
        }
    }
}

impl Display for GenericPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path, self.params)
    }
}

/// A path naming a value (function, constant, static or vtable item).
#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    Generic(GenericPath),
    /// `<Type as Trait>::item`
    UfcsKnown {
        ty: Box<TypeRef>,
        trait_: GenericPath,
        item: String,
        params: PathParams,
    },
    /// `<Type>::item` resolved to an inherent impl
    UfcsInherent {
        ty: Box<TypeRef>,
        item: String,
        params: PathParams,
    },
    /// `<Type>::item` with the trait not yet known
    UfcsUnknown {
        ty: Box<TypeRef>,
        item: String,
        params: PathParams,
    },
}

impl Path {
    pub fn as_generic(&self) -> Option<&GenericPath> {
        match self {
            Path::Generic(path) => Some(path),
            _ => None,
        }
    }
}

impl From<GenericPath> for Path {
    fn from(path: GenericPath) -> Self {
        Path::Generic(path)
    }
}

impl From<SimplePath> for Path {
    fn from(path: SimplePath) -> Self {
        Path::Generic(path.into())
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Path::Generic(path) => write!(f, "{}", path),
            Path::UfcsKnown {
                ty,
                trait_,
                item,
                params,
            } => write!(f, "<{} as {}>::{}{}", ty, trait_, item, params),
            Path::UfcsInherent { ty, item, params } => write!(f, "<{}>::{}{}", ty, item, params),
            Path::UfcsUnknown { ty, item, params } => {
                write!(f, "<{} as _>::{}{}", ty, item, params)
            }
        }
    }
}

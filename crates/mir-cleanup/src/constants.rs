//! Replacement of constant-item references by their evaluated values.

use mir_core::error::Result;
use mir_core::mir::{Constant, Literal, RValue};
use mir_core::resolve::{ConstantLookup, ConstantValue};
use mir_core::types::{CoreType, Path, TypeRef};

use crate::mutator::Mutator;
use crate::state::CleanupState;

#[derive(Debug, Clone, PartialEq)]
pub enum Materialized {
    Replaced(RValue),
    /// Recognised but left for a later phase.
    Deferred(String),
    Unchanged,
}

/// Materialize the constant item at `path`. Nothing is queued on the
/// mutator unless the result is `Replaced`.
pub fn materialize_constant(
    state: &mut CleanupState<'_>,
    mutator: &mut Mutator<'_>,
    path: &Path,
) -> Result<Materialized> {
    let value = match state.resolve.constant(path)? {
        ConstantLookup::Value(value) => value,
        ConstantLookup::Generic => return defer(state, format!("generic constant {}", path)),
        ConstantLookup::Unresolvable => return Ok(Materialized::Unchanged),
    };
    let ConstantValue { literal, ty } = value;

    match &ty {
        TypeRef::Primitive(core) => {
            let constant = scalar_constant(state, path, *core, &literal)?;
            Ok(Materialized::Replaced(RValue::Constant(constant)))
        }
        TypeRef::Pointer { .. } => {
            if literal.is_borrow_of() {
                return defer(state, format!("pointer constant {} is an item address", path));
            }
            let Some(value) = literal.as_integer() else {
                crate::mir_bug!(state, "pointer constant {} has value {}", path, literal);
            };
            let lval = mutator.in_temporary(TypeRef::usize(), RValue::Constant(Constant::Uint(value)));
            Ok(Materialized::Replaced(RValue::Cast {
                val: lval,
                ty: ty.clone(),
            }))
        }
        TypeRef::Borrow { inner, .. } => {
            if literal.is_borrow_of() {
                return defer(state, format!("borrowed constant {} is an item address", path));
            }
            let constant = if inner.is_byte_sequence() {
                let Some(bytes) = literal.as_bytes() else {
                    crate::mir_bug!(state, "byte string constant {} has value {}", path, literal);
                };
                if let TypeRef::Array { size, .. } = &**inner {
                    crate::mir_ensure!(
                        state,
                        bytes.len() as u64 == *size,
                        "byte string constant {} has {} bytes, expected {}",
                        path,
                        bytes.len(),
                        size
                    );
                }
                Constant::Bytes(bytes.to_vec())
            } else if **inner == TypeRef::Primitive(CoreType::Str) {
                let Some(bytes) = literal.as_bytes() else {
                    crate::mir_bug!(state, "string constant {} has value {}", path, literal);
                };
                match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => Constant::StaticString(text),
                    Err(err) => crate::mir_bug!(state, "string constant {} is not UTF-8: {}", path, err),
                }
            } else {
                crate::mir_bug!(state, "constant {} has unsupported type {}", path, ty);
            };
            Ok(Materialized::Replaced(RValue::Constant(constant)))
        }
        // Aggregate constants are lowered by a later phase.
        _ => Ok(Materialized::Unchanged),
    }
}

fn scalar_constant(
    state: &CleanupState<'_>,
    path: &Path,
    core: CoreType,
    literal: &Literal,
) -> Result<Constant> {
    if core == CoreType::Str {
        crate::mir_bug!(state, "constant {} has bare type `str`", path);
    }
    if core.is_float() {
        return match literal.as_float() {
            Some(value) => Ok(Constant::Float(value)),
            None => crate::mir_bug!(state, "float constant {} has value {}", path, literal),
        };
    }
    let Some(value) = literal.as_integer() else {
        crate::mir_bug!(state, "{} constant {} has value {}", core, path, literal);
    };
    Ok(match core {
        CoreType::Bool => Constant::Bool(value != 0),
        core if core.is_signed() => Constant::Int(value as i64),
        _ => Constant::Uint(value),
    })
}

fn defer(state: &mut CleanupState<'_>, reason: String) -> Result<Materialized> {
    state.defer(&reason)?;
    Ok(Materialized::Deferred(reason))
}

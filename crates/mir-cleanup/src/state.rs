use mir_core::diagnostics::DiagnosticManager;
use mir_core::error::{Error, Result};
use mir_core::mir::{BasicBlockId, FunctionSig, LValue};
use mir_core::span::Span;
use mir_core::types::{Path, SimplePath, TypeRef};
use mir_core::Resolve;

use crate::error::{cleanup_error, cleanup_warning, CleanupErrorKind};
use crate::options::CleanupOptions;
use crate::report::CleanupReport;

/// Read-only context for cleaning one function, plus the location of the
/// element being visited and the running report.
pub struct CleanupState<'a> {
    pub resolve: &'a dyn Resolve,
    pub options: &'a CleanupOptions,
    pub diagnostics: &'a DiagnosticManager,
    pub path: &'a SimplePath,
    pub sig: &'a FunctionSig,
    pub report: CleanupReport,
    block: BasicBlockId,
    /// `None` while visiting the terminator.
    stmt: Option<usize>,
    span: Span,
}

impl<'a> CleanupState<'a> {
    pub fn new(
        resolve: &'a dyn Resolve,
        options: &'a CleanupOptions,
        diagnostics: &'a DiagnosticManager,
        path: &'a SimplePath,
        sig: &'a FunctionSig,
    ) -> Self {
        Self {
            resolve,
            options,
            diagnostics,
            path,
            sig,
            report: CleanupReport::default(),
            block: 0,
            stmt: None,
            span: Span::dummy(),
        }
    }

    pub fn set_cur_stmt(&mut self, block: BasicBlockId, stmt: usize, span: Span) {
        self.block = block;
        self.stmt = Some(stmt);
        self.span = span;
    }

    pub fn set_cur_stmt_term(&mut self, block: BasicBlockId, span: Span) {
        self.block = block;
        self.stmt = None;
        self.span = span;
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// `path @ bbN/sM`, or `path @ bbN/term` on a terminator.
    pub fn context(&self) -> String {
        match self.stmt {
            Some(stmt) => format!("{} @ bb{}/s{}", self.path, self.block, stmt),
            None => format!("{} @ bb{}/term", self.path, self.block),
        }
    }

    pub fn error(&self, kind: CleanupErrorKind, message: impl Into<String>) -> Error {
        cleanup_error(self.diagnostics, kind, &self.context(), self.span, message)
    }

    /// Note an operand left unchanged for a later phase. Fails instead when
    /// deferral is disabled.
    pub fn defer(&mut self, reason: &str) -> Result<()> {
        if self.options.strict_deferred {
            return Err(self.error(CleanupErrorKind::Unsupported, reason));
        }
        mir_core::debug!("{}: deferred: {}", self.context(), reason);
        cleanup_warning(self.diagnostics, &self.context(), self.span, reason, None);
        Ok(())
    }

    pub fn warn(&self, message: &str, suggestion: Option<String>) {
        mir_core::warn!("{}: {}", self.context(), message);
        cleanup_warning(self.diagnostics, &self.context(), self.span, message, suggestion);
    }

    /// Type of `lv`, with temporaries typed from `temporaries`.
    pub fn lvalue_type(&self, temporaries: &[TypeRef], lv: &LValue) -> Result<TypeRef> {
        match lv {
            LValue::Return => Ok(self.sig.ret.clone()),
            LValue::Argument(idx) => match self.sig.args.get(*idx) {
                Some(ty) => Ok(ty.clone()),
                None => crate::mir_bug!(self, "argument a{} out of range", idx),
            },
            LValue::Temporary(idx) => match temporaries.get(*idx) {
                Some(ty) => Ok(ty.clone()),
                None => crate::mir_bug!(self, "temporary t{} out of range", idx),
            },
            LValue::Static(path) => self.resolve.static_type(path),
            LValue::Deref(inner) => {
                let ty = self.lvalue_type(temporaries, inner)?;
                match ty.pointee() {
                    Some(pointee) => Ok(pointee.clone()),
                    None => crate::mir_bug!(self, "deref of non-pointer {}: {}", inner, ty),
                }
            }
            LValue::Field(inner, idx) => {
                let ty = self.lvalue_type(temporaries, inner)?;
                self.field_type(&ty, *idx)
            }
            LValue::Index(inner, _) => {
                let ty = self.lvalue_type(temporaries, inner)?;
                match ty {
                    TypeRef::Array { inner, .. } | TypeRef::Slice { inner } => Ok(*inner),
                    other => crate::mir_bug!(self, "index into non-sequence {}", other),
                }
            }
        }
    }

    /// Instantiated type of field `idx` of a tuple or struct type.
    pub fn field_type(&self, ty: &TypeRef, idx: usize) -> Result<TypeRef> {
        match ty {
            TypeRef::Tuple(items) => match items.get(idx) {
                Some(item) => Ok(item.clone()),
                None => crate::mir_bug!(self, "field {} out of range for {}", idx, ty),
            },
            TypeRef::Path {
                path: Path::Generic(path),
                binding,
            } => {
                let Some(def) = binding.as_struct() else {
                    crate::mir_bug!(self, "field access on non-struct path {}", ty);
                };
                match def.field_type(idx) {
                    Some(field) => Ok(field.monomorphise(&path.params)),
                    None => crate::mir_bug!(self, "field {} out of range for {}", idx, ty),
                }
            }
            other => crate::mir_bug!(self, "field access on {}", other),
        }
    }
}

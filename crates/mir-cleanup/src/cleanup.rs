use std::sync::Arc;

use mir_core::diagnostics::{diagnostic_manager, DiagnosticManager};
use mir_core::error::Result;
use mir_core::mir::{Constant, Function, Program, RValue, StatementKind, Terminator};
use mir_core::pretty::{pretty, PrettyOptions};
use mir_core::types::{TypePathBinding, TypeRef};
use mir_core::Resolve;
use rayon::prelude::*;

use crate::coerce::coerce_unsized;
use crate::constants::{materialize_constant, Materialized};
use crate::mutator::Mutator;
use crate::options::CleanupOptions;
use crate::report::CleanupReport;
use crate::state::CleanupState;
use crate::virtualize::virtualize_call;

/// A MIR pass over a whole program.
pub trait MirPass {
    fn name(&self) -> &'static str;
    fn run(&self, program: &mut Program) -> Result<usize>;
}

/// The post-monomorphisation cleanup pass.
pub struct MirCleanup<'r> {
    resolve: &'r dyn Resolve,
    options: CleanupOptions,
    diagnostics: Arc<DiagnosticManager>,
}

impl<'r> MirCleanup<'r> {
    pub fn new(resolve: &'r dyn Resolve) -> Self {
        Self {
            resolve,
            options: CleanupOptions::default(),
            diagnostics: diagnostic_manager(),
        }
    }

    pub fn with_options(mut self, options: CleanupOptions) -> Self {
        self.options = options;
        self
    }

    /// Record diagnostics in `diagnostics` instead of the global manager.
    pub fn with_diagnostics(mut self, diagnostics: Arc<DiagnosticManager>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &DiagnosticManager {
        &self.diagnostics
    }

    pub fn cleanup_program(&self, program: &mut Program) -> Result<CleanupReport> {
        let reports: Vec<CleanupReport> = if self.options.parallel {
            program
                .functions
                .par_iter_mut()
                .map(|function| self.cleanup_function(function))
                .collect::<Result<_>>()?
        } else {
            program
                .functions
                .iter_mut()
                .map(|function| self.cleanup_function(function))
                .collect::<Result<_>>()?
        };

        let mut report = CleanupReport::default();
        for function_report in &reports {
            report.merge(function_report);
        }
        mir_core::info!(
            "cleaned {} functions with {} changes",
            reports.len(),
            report.total_changes()
        );
        Ok(report)
    }

    /// Clean a single function in place, in one forward sweep.
    pub fn cleanup_function(&self, function: &mut Function) -> Result<CleanupReport> {
        mir_core::trace!("before cleanup:\n{}", pretty(&*function, PrettyOptions::default()));
        let Function {
            path, sig, body, ..
        } = function;
        mir_core::debug!("cleaning {} ({} blocks)", path, body.basic_blocks.len());

        let mut state = CleanupState::new(self.resolve, &self.options, &self.diagnostics, path, sig);
        let mut mutator = Mutator::new(body);

        let result = sweep(&mut state, &mut mutator);
        let inserted = mutator.statements_inserted();
        let added = mutator.temporaries_added();
        drop(mutator);

        if let Err(err) = result {
            mir_core::error!("cleanup of {} failed: {}", path, err);
            return Err(err);
        }

        let mut report = state.report;
        report.statements_inserted = inserted;
        report.temporaries_added = added;
        report.per_function.push((path.to_string(), report.total_changes()));
        if report.total_changes() > 0 {
            mir_core::trace!(
                "after cleanup:\n{}",
                pretty(&*function, PrettyOptions::default())
            );
        }
        Ok(report)
    }
}

impl MirPass for MirCleanup<'_> {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn run(&self, program: &mut Program) -> Result<usize> {
        Ok(self.cleanup_program(program)?.total_changes())
    }
}

fn sweep(state: &mut CleanupState<'_>, mutator: &mut Mutator<'_>) -> Result<()> {
    let block_count = mutator.body().basic_blocks.len();
    for block in 0..block_count {
        mutator.enter_block(block);

        while mutator.at_statement() {
            let mut stmt = mutator.take_statement();
            state.set_cur_stmt(block, mutator.cur_stmt(), stmt.source_info);
            mutator.set_span(stmt.source_info);
            let result = visit_statement(state, mutator, &mut stmt.kind);
            mutator.restore_statement(stmt);
            if let Err(err) = result {
                mutator.discard_pending();
                return Err(err);
            }
            mutator.flush();
            mutator.advance();
        }

        let mut terminator = mutator.take_terminator();
        state.set_cur_stmt_term(block, terminator.source_info);
        mutator.set_span(terminator.source_info);
        let result = visit_terminator(state, mutator, &mut terminator);
        mutator.restore_terminator(terminator);
        if let Err(err) = result {
            mutator.discard_pending();
            return Err(err);
        }
        mutator.flush();
    }
    Ok(())
}

fn visit_statement(
    state: &mut CleanupState<'_>,
    mutator: &mut Mutator<'_>,
    kind: &mut StatementKind,
) -> Result<()> {
    let StatementKind::Assign(_, src) = kind else {
        return Ok(());
    };

    if let RValue::Constant(Constant::Const(path)) = &*src {
        match materialize_constant(state, mutator, path)? {
            Materialized::Replaced(value) => {
                mir_core::debug!("{}: {} = {}", state.context(), path, value);
                *src = value;
                state.report.constants_materialized += 1;
            }
            Materialized::Deferred(_) => state.report.constants_deferred += 1,
            Materialized::Unchanged => {}
        }
        return Ok(());
    }

    if let RValue::Cast { val, ty } = &*src {
        let src_ty = state.lvalue_type(mutator.temporaries(), val)?;
        if needs_coercion(state, ty, &src_ty)? {
            let value = coerce_unsized(state, mutator, ty, &src_ty, val.clone())?;
            *src = value;
        }
    }
    Ok(())
}

/// Does a cast from `src_ty` to `dst_ty` need lowering to an explicit
/// fat pointer or rebuilt struct?
fn needs_coercion(state: &CleanupState<'_>, dst_ty: &TypeRef, src_ty: &TypeRef) -> Result<bool> {
    match (dst_ty, src_ty) {
        (
            TypeRef::Path { binding, .. },
            TypeRef::Path {
                binding: src_binding,
                ..
            },
        ) => {
            crate::mir_ensure!(
                state,
                !matches!(binding, TypePathBinding::Unbound),
                "cast to unbound path {}",
                dst_ty
            );
            crate::mir_ensure!(
                state,
                !matches!(src_binding, TypePathBinding::Unbound),
                "cast from unbound path {}",
                src_ty
            );
            let opaque = matches!(binding, TypePathBinding::Opaque)
                || matches!(src_binding, TypePathBinding::Opaque);
            Ok(!opaque)
        }
        (TypeRef::Path { .. }, other) => {
            crate::mir_ensure!(state, other.is_generic(), "cast to {} from {}", dst_ty, other);
            Ok(false)
        }
        (TypeRef::Borrow { inner, .. }, TypeRef::Borrow { inner: src_inner, .. })
        | (TypeRef::Pointer { inner, .. }, TypeRef::Pointer { inner: src_inner, .. }) => {
            let unsized_dst = matches!(**inner, TypeRef::Slice { .. } | TypeRef::TraitObject(_));
            Ok(unsized_dst && inner != src_inner)
        }
        _ => Ok(false),
    }
}

fn visit_terminator(
    state: &mut CleanupState<'_>,
    mutator: &mut Mutator<'_>,
    terminator: &mut Terminator,
) -> Result<()> {
    virtualize_call(state, mutator, &mut terminator.kind)?;
    Ok(())
}

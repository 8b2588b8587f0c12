// mir-cleanup: post-monomorphisation MIR cleanup
//
// - constants: replace constant-item references with literal operands
// - unsize / coerce: lower unsizing casts to explicit fat pointers
// - virtualize: route trait-object method calls through the vtable
// - cleanup: the single-sweep driver tying the above together

pub mod error;

pub mod cleanup;
pub mod coerce;
pub mod constants;
pub mod mutator;
pub mod options;
pub mod report;
pub mod state;
pub mod unsize;
pub mod virtualize;
mod vtable;

pub use cleanup::{MirCleanup, MirPass};
pub use options::{CleanupOptions, SlotAmbiguity};
pub use report::CleanupReport;

use mir_core::error::Result;
use mir_core::mir::{Function, Program};
use mir_core::Resolve;

/// Clean `function` with default options.
pub fn cleanup_function(resolve: &dyn Resolve, function: &mut Function) -> Result<CleanupReport> {
    MirCleanup::new(resolve).cleanup_function(function)
}

/// Clean every function of `program` with `options`.
pub fn cleanup_program(
    resolve: &dyn Resolve,
    program: &mut Program,
    options: CleanupOptions,
) -> Result<CleanupReport> {
    MirCleanup::new(resolve)
        .with_options(options)
        .cleanup_program(program)
}

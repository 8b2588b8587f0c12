use mir_core::diagnostics::{Diagnostic, DiagnosticManager};
use mir_core::error::Error;
use mir_core::span::Span;

/// Which fatal error variant a cleanup failure maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupErrorKind {
    Bug,
    Malformed,
    Unsupported,
}

/// Build a fatal cleanup error and record it with `diagnostics`.
pub fn cleanup_error(
    diagnostics: &DiagnosticManager,
    kind: CleanupErrorKind,
    context: &str,
    span: Span,
    message: impl Into<String>,
) -> Error {
    let mut diagnostic = Diagnostic::error(message)
        .with_source_context(context)
        .with_span(span);
    if kind == CleanupErrorKind::Unsupported {
        diagnostic = diagnostic.with_code("deferred");
    }
    mir_core::error!("{}", diagnostic);
    diagnostics.add_diagnostic(diagnostic.clone());
    match kind {
        CleanupErrorKind::Bug => Error::bug(diagnostic),
        CleanupErrorKind::Malformed => Error::malformed(diagnostic),
        CleanupErrorKind::Unsupported => Error::unsupported(diagnostic),
    }
}

/// Record a non-fatal warning, optionally with a hint for silencing it.
pub fn cleanup_warning(
    diagnostics: &DiagnosticManager,
    context: &str,
    span: Span,
    message: impl Into<String>,
    suggestion: Option<String>,
) {
    let mut diagnostic = Diagnostic::warning(message)
        .with_source_context(context)
        .with_span(span);
    if let Some(suggestion) = suggestion {
        diagnostic = diagnostic.with_suggestion(suggestion);
    }
    diagnostics.add_diagnostic(diagnostic);
}

// Convenience macros for generating cleanup errors from a `CleanupState`

/// Return early with an internal-consistency error
#[macro_export]
macro_rules! mir_bug {
    ($state:expr, $($arg:tt)*) => {
        return Err($state.error($crate::error::CleanupErrorKind::Bug, format!($($arg)*)))
    };
}

/// Return early with a malformed-input error
#[macro_export]
macro_rules! mir_malformed {
    ($state:expr, $($arg:tt)*) => {
        return Err($state.error($crate::error::CleanupErrorKind::Malformed, format!($($arg)*)))
    };
}

/// Ensure a condition holds, or return an internal-consistency error
#[macro_export]
macro_rules! mir_ensure {
    ($state:expr, $cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::mir_bug!($state, $($arg)*);
        }
    };
}

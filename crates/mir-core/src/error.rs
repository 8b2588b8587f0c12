use crate::diagnostics::Diagnostic;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An invariant earlier phases should have guaranteed does not hold.
    #[error("internal compiler error: {0}")]
    Bug(Diagnostic),
    /// The input combines type shapes the type system defines as illegal.
    #[error("malformed MIR: {0}")]
    Malformed(Diagnostic),
    /// A recognised case this pass does not implement, raised only when
    /// deferral is not permitted.
    #[error("unsupported: {0}")]
    Unsupported(Diagnostic),
    #[error("Generic error: {0}")]
    Generic(eyre::Report),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn bug(diagnostic: Diagnostic) -> Self {
        Error::Bug(diagnostic)
    }

    pub fn malformed(diagnostic: Diagnostic) -> Self {
        Error::Malformed(diagnostic)
    }

    pub fn unsupported(diagnostic: Diagnostic) -> Self {
        Error::Unsupported(diagnostic)
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::Bug(diag) | Error::Malformed(diag) | Error::Unsupported(diag) => Some(diag),
            Error::Generic(_) => None,
        }
    }

    pub fn is_bug(&self) -> bool {
        matches!(self, Error::Bug(_))
    }
}

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(eyre::Report::msg(s))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(eyre::Report::new(e))
    }
}

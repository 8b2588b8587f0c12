#[macro_use]
pub mod macros;

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod mir;
pub mod pretty;
pub mod resolve;
pub mod span;
pub mod types;

// Re-export commonly used items for convenience
pub use eyre;
pub use tracing;

pub use resolve::{CrateDb, Resolve};

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;

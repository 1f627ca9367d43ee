pub mod alerts;
pub mod benchmark;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod reference;
pub mod scoring;
pub mod summary;
pub mod types;

pub use error::DiagnosticError;
pub use types::*;

/// Standard result type for all diagnostic operations
pub type DiagnosticResult<T> = Result<T, DiagnosticError>;

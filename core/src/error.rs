use thiserror::Error;

/// Conditions raised by the forecast store that callers may want to match on.
///
/// They travel inside `anyhow::Error`; use `downcast_ref::<StoreError>()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("date must be normalized to insert: {0}")]
    UnnormalizedDate(i64),
    #[error("unsupported store operation: {0}")]
    Unsupported(String),
    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

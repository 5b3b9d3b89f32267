use thiserror::Error;

/// Failures surfaced by the object store, the delegation engine and dispatch.
///
/// Nothing here is retried or rolled back; every variant goes straight back to
/// the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorType {
    /// A method name resolved to nothing on the remaining chain.
    #[error("no such method: {0}")]
    NoSuchMethod(String),
    /// A define, write or delete was refused by a sealed object or a
    /// non-configurable / non-writable property.
    #[error("illegal mutation: {0}")]
    IllegalMutation(String),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("range error: {0}")]
    RangeError(String),
}

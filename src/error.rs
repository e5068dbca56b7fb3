//! Error taxonomy for the broker.
//!
//! Every failure is handled per-frame and surfaced only to the originating
//! connection; the variant decides which error frame the dispatcher answers
//! with.

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Malformed or out-of-contract frame; answered with a generic `error`
    /// frame, connection stays open
    #[error("invalid frame: {0}")]
    Protocol(String),

    /// Missing or invalid identity on `auth`; connection remains usable for
    /// retry
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Caller lacks room access; nothing persisted or broadcast
    #[error("access denied: {0}")]
    Forbidden(String),

    /// Message content rejected before persistence
    #[error("message rejected: {0}")]
    InvalidMessage(String),

    /// External store failure; surfaced to the requester only, never
    /// partially broadcast
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// Errors crossing the external-store boundary
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

//! Error types for wirecall.

use thiserror::Error;

/// Main error type for all wirecall operations.
///
/// A successful operation is `Ok`; every failure maps onto exactly one of
/// these kinds so callers can branch on the outcome classification without
/// digging through source chains.
#[derive(Debug, Error)]
pub enum WirecallError {
    /// The operation was canceled because the transport was closed —
    /// by a deadline expiring, by [`stop`](crate::client::ServiceClient::stop),
    /// or by a peer reset observed as close.
    #[error("operation aborted: transport closed")]
    Aborted,

    /// The transport reported an error (or transferred fewer bytes than
    /// requested) while still open.
    #[error("transport operation failed: {0}")]
    FailedOperation(#[source] std::io::Error),

    /// A frame violated the wire format: short header, short body with no
    /// transport error, or a declared length beyond the configured maximum.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The user-supplied encoder failed; no bytes were sent.
    #[error("message encoding failed: {0}")]
    Encoding(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The user-supplied decoder rejected received bytes; the bytes are
    /// discarded.
    #[error("message decoding failed: {0}")]
    Decoding(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A call was attempted while the client already had one in flight.
    #[error("client busy: a call is already in flight")]
    Busy,
}

impl WirecallError {
    /// Wrap a codec serialization failure.
    pub fn encoding<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Encoding(Box::new(err))
    }

    /// Wrap a codec deserialization failure.
    pub fn decoding<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decoding(Box::new(err))
    }

    /// True if this error means the transport was closed underneath the
    /// operation.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Result type alias using WirecallError.
pub type Result<T> = std::result::Result<T, WirecallError>;

//! Error types for the traced cache
//!
//! Three failure domains surface through [`CacheError`]: transport failures
//! (the store could not complete the command), codec failures (the value could
//! not be marshaled to or from bytes) and configuration errors. A cache miss is
//! never an error.

use thiserror::Error;

/// Boxed error used to carry codec-specific sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// == Transport Error ==
/// Failure reported by a [`Transport`](crate::transport::Transport) or by the
/// context the command ran under.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Error returned by the Redis client (I/O, protocol, server error reply)
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The context deadline elapsed before the store replied
    #[error("deadline exceeded")]
    Timeout,

    /// The context was cancelled before the store replied
    #[error("operation cancelled")]
    Cancelled,

    /// The transport was closed
    #[error("transport closed")]
    Closed,

    /// The store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused an expiry it cannot represent
    #[error("invalid expire time: {0:?}")]
    InvalidTtl(std::time::Duration),

    /// The store replied with a shape the command does not produce
    #[error("unexpected reply to {command}: {reply}")]
    UnexpectedReply {
        command: &'static str,
        reply: String,
    },
}

// == Codec Error ==
/// Failure to marshal a value to or from its stored byte form.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to encode value: {0}")]
    Encode(#[source] BoxError),

    #[error("failed to decode value: {0}")]
    Decode(#[source] BoxError),
}

// == Cache Error ==
/// Unified error type returned by the cache facade.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Invalid configuration (bad address, unsupported scheme)
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// True when the value could not be encoded or decoded.
    pub fn is_codec(&self) -> bool {
        matches!(self, CacheError::Codec(_))
    }

    /// True when the failure happened at or below the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, CacheError::Transport(_))
    }

    /// True when the context deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CacheError::Transport(TransportError::Timeout))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache facade.
pub type Result<T> = std::result::Result<T, CacheError>;

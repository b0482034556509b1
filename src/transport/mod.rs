//! Transport Module
//!
//! The leaf collaborator that actually talks to the store. The rest of the
//! crate only sees the [`Transport`] trait, a [`Command`] going in and a
//! [`Reply`] coming out.
//!
//! # Implementations
//! - [`RedisTransport`]: a Redis server reached over the network
//! - [`MemoryTransport`]: an in-process store with the same command semantics

mod memory;
mod redis;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

pub use self::memory::{MemoryTransport, MEMORY_ADDRESS};
pub use self::redis::RedisTransport;

// == Command ==
/// A store command understood by every transport.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the bytes stored at `key`
    Get { key: String },
    /// Write `value` at `key`, expiring after `ttl` when set
    Set {
        key: String,
        value: Vec<u8>,
        ttl: Option<Duration>,
    },
    /// Delete `key`; deleting an absent key is not an error
    Del { key: String },
    /// Remove every key of the selected database
    FlushDb,
    /// Liveness probe
    Ping,
    /// Remaining time to live of `key`, in seconds
    Ttl { key: String },
}

impl Command {
    /// Lowercase command name, used as the span's `db.statement`.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "get",
            Command::Set { .. } => "set",
            Command::Del { .. } => "del",
            Command::FlushDb => "flushdb",
            Command::Ping => "ping",
            Command::Ttl { .. } => "ttl",
        }
    }
}

// Values are opaque and possibly large; only their size is printed.
impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Get { key } => f.debug_struct("Get").field("key", key).finish(),
            Command::Set { key, value, ttl } => f
                .debug_struct("Set")
                .field("key", key)
                .field("value_len", &value.len())
                .field("ttl", ttl)
                .finish(),
            Command::Del { key } => f.debug_struct("Del").field("key", key).finish(),
            Command::FlushDb => f.write_str("FlushDb"),
            Command::Ping => f.write_str("Ping"),
            Command::Ttl { key } => f.debug_struct("Ttl").field("key", key).finish(),
        }
    }
}

// == Reply ==
/// Raw reply of a store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The key does not exist
    Nil,
    Bytes(Vec<u8>),
    Int(i64),
    Status(String),
}

// == Transport ==
/// Executes commands against a store. Implementations are shared by all
/// concurrent callers and serialize or pool their own connections.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Address of the store, used as the span's `db.instance`.
    fn address(&self) -> &str;

    /// Executes a single command.
    async fn execute(&self, command: Command) -> Result<Reply, TransportError>;

    /// Releases the transport. Later commands fail with
    /// [`TransportError::Closed`].
    async fn close(&self) -> Result<(), TransportError>;
}

/// Longest expiry a store accepts. Redis rejects expiries whose absolute unix
/// time in milliseconds overflows an `i64`; half that range leaves room for
/// the current time on every transport.
pub const MAX_TTL: Duration = Duration::from_millis(i64::MAX as u64 / 2);

/// Rejects a `SET` expiry longer than [`MAX_TTL`].
pub(crate) fn check_ttl(ttl: Option<Duration>) -> Result<(), TransportError> {
    match ttl {
        Some(ttl) if ttl > MAX_TTL => Err(TransportError::InvalidTtl(ttl)),
        _ => Ok(()),
    }
}

/// Converts a TTL into whole milliseconds, rounding a non-zero sub-millisecond
/// TTL up so it still expires rather than persisting.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 && !ttl.is_zero() {
        1
    } else {
        millis
    }
}

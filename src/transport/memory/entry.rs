//! Stored Entry Module
//!
//! A value held by the in-process transport together with its expiry.

use std::time::Duration;

use tokio::time::Instant;

// == Entry ==
/// A stored value and its optional expiry instant.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored bytes
    pub value: Vec<u8>,
    /// Expiry instant, None = persists until removed
    pub expires_at: Option<Instant>,
}

impl Entry {
    // == Constructors ==
    /// Creates an entry that persists until removed.
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates an entry expiring `ttl` from now, or None when the expiry
    /// instant is not representable.
    pub fn with_ttl(value: Vec<u8>, ttl: Duration) -> Option<Self> {
        let expires_at = Instant::now().checked_add(ttl)?;
        Some(Self {
            value,
            expires_at: Some(expires_at),
        })
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiry instant.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires| Instant::now() >= expires)
    }

    // == Time To Live ==
    /// Remaining time to live, or None if the entry never expires.
    ///
    /// Returns `Some(Duration::ZERO)` once expired.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }

    /// Remaining time to live in whole seconds, rounded to the nearest second
    /// the way Redis reports `TTL`.
    pub fn ttl_remaining_secs(&self) -> Option<i64> {
        self.ttl_remaining().map(|remaining| {
            let millis = i64::try_from(remaining.as_millis()).unwrap_or(i64::MAX);
            millis.saturating_add(500) / 1000
        })
    }
}

//! In-process transport
//!
//! Keeps entries in a `HashMap` behind an async `RwLock` and answers every
//! [`Command`] the way a Redis server would: absent keys reply `Nil`, `DEL`
//! replies with the number of removed keys, `TTL` replies -2 for a missing key
//! and -1 for a key without expiry. Expired entries are dropped lazily when
//! touched.
//!
//! Failure injection ([`set_unavailable`](MemoryTransport::set_unavailable),
//! [`set_latency`](MemoryTransport::set_latency)) lets callers exercise the
//! error and deadline paths without a network.

mod entry;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use self::entry::Entry;
use super::{check_ttl, Command, Reply, Transport};
use crate::error::TransportError;

/// Address reported by a transport created with [`MemoryTransport::new`].
pub const MEMORY_ADDRESS: &str = "memory";

#[derive(Debug, Default)]
struct Faults {
    unavailable: Option<String>,
    latency: Option<Duration>,
}

// == Memory Transport ==
/// Transport storing entries in process memory.
#[derive(Debug)]
pub struct MemoryTransport {
    address: String,
    entries: RwLock<HashMap<String, Entry>>,
    faults: Mutex<Faults>,
    closed: AtomicBool,
}

impl MemoryTransport {
    // == Constructor ==
    pub fn new() -> Self {
        Self::with_address(MEMORY_ADDRESS)
    }

    /// Creates an empty store reporting `address` as its `db.instance`.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            entries: RwLock::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Writes raw bytes directly, bypassing any codec.
    pub async fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), Entry::new(value.into()));
    }

    /// Makes every subsequent command fail with
    /// [`TransportError::Unavailable`]; `None` restores service.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.unavailable = reason.map(str::to_string);
        }
    }

    /// Delays every subsequent command by `latency`; `None` removes the delay.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.latency = latency;
        }
    }

    // == Length ==
    /// Number of live (not expired) entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|entry| !entry.is_expired()).count()
    }

    /// True if no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn injected_faults(&self) -> (Option<String>, Option<Duration>) {
        match self.faults.lock() {
            Ok(faults) => (faults.unavailable.clone(), faults.latency),
            Err(_) => (None, None),
        }
    }

    /// Returns the live entry at `key`, evicting it if it has expired.
    async fn live_entry(&self, key: &str) -> Option<Entry> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(Entry::is_expired) {
            entries.remove(key);
            debug!(key = %key, "Evicted expired entry");
        }
        None
    }

    async fn apply(&self, command: Command) -> Result<Reply, TransportError> {
        let reply = match command {
            Command::Get { key } => match self.live_entry(&key).await {
                Some(entry) => Reply::Bytes(entry.value),
                None => Reply::Nil,
            },
            Command::Set { key, value, ttl } => {
                check_ttl(ttl)?;
                // A zero expiry would be rejected by a real server
                let entry = match ttl.filter(|ttl| !ttl.is_zero()) {
                    Some(ttl) => {
                        Entry::with_ttl(value, ttl).ok_or(TransportError::InvalidTtl(ttl))?
                    }
                    None => Entry::new(value),
                };
                self.entries.write().await.insert(key, entry);
                Reply::Status("OK".to_string())
            }
            Command::Del { key } => {
                let removed = self.live_entry(&key).await.is_some()
                    && self.entries.write().await.remove(&key).is_some();
                Reply::Int(i64::from(removed))
            }
            Command::FlushDb => {
                self.entries.write().await.clear();
                Reply::Status("OK".to_string())
            }
            Command::Ping => Reply::Status("PONG".to_string()),
            Command::Ttl { key } => match self.live_entry(&key).await {
                None => Reply::Int(-2),
                Some(entry) => Reply::Int(entry.ttl_remaining_secs().unwrap_or(-1)),
            },
        };
        Ok(reply)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn address(&self) -> &str {
        &self.address
    }

    async fn execute(&self, command: Command) -> Result<Reply, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let (unavailable, latency) = self.injected_faults();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(reason) = unavailable {
            return Err(TransportError::Unavailable(reason));
        }
        self.apply(command).await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

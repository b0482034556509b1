//! Cache Module
//!
//! The value-oriented facade application code talks to. Values are encoded
//! through a [`Codec`] and sent through the traced [`Client`]; a missing key is
//! reported as `Ok(None)`, never as an error.
//!
//! The facade owns no state besides the shared client, so a single instance
//! serves any number of concurrent callers. Concurrent writes to the same key
//! race at the store, last writer wins.

mod codec;


use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::client::{Client, Ttl};
use crate::config::TransportOptions;
use crate::context::Context;
use crate::error::{CacheError, Result, TransportError};
use crate::trace::Tracer;
use crate::transport::{Command, RedisTransport, Reply, Transport};

pub use codec::{Codec, JsonCodec, StringCodec};

// == Lookup ==
/// Result of a lookup in the `(value, exists)` shape.
///
/// `exists` is false exactly when `value` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<V> {
    pub value: Option<V>,
    pub exists: bool,
}

impl<V> From<Option<V>> for Lookup<V> {
    fn from(value: Option<V>) -> Self {
        let exists = value.is_some();
        Self { value, exists }
    }
}

// == Cache ==
/// Cache facade over a traced store client.
pub struct Cache<T: Transport = RedisTransport, C: Codec = JsonCodec> {
    client: Client<T>,
    codec: C,
}

impl Cache<RedisTransport, JsonCodec> {
    /// Creates a cache for the Redis server at `options.address` without
    /// contacting it; the connection is made by the first command.
    pub fn new(options: &TransportOptions, tracer: Arc<dyn Tracer>) -> Result<Self> {
        let transport = RedisTransport::open(options)?;
        Ok(Self::from_client(Client::new(transport, tracer)))
    }

    /// Creates a cache for the Redis server at `options.address` and checks
    /// it is reachable with a traced `PING` bounded by `ctx`.
    pub async fn connect(
        ctx: &Context,
        options: &TransportOptions,
        tracer: Arc<dyn Tracer>,
    ) -> Result<Self> {
        let cache = Self::new(options, tracer)?;
        cache.client.ping(ctx).await?;
        Ok(cache)
    }
}

impl<T: Transport> Cache<T, JsonCodec> {
    pub fn from_client(client: Client<T>) -> Self {
        Self {
            client,
            codec: JsonCodec,
        }
    }
}

impl<T: Transport, C: Codec> Cache<T, C> {
    /// Replaces the codec values are stored with.
    pub fn with_codec<D: Codec>(self, codec: D) -> Cache<T, D> {
        Cache {
            client: self.client,
            codec,
        }
    }

    /// The traced client, for commands outside the cache contract.
    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    // == Get ==
    /// Reads the value at `key`.
    ///
    /// Returns `Ok(None)` when the key does not exist. Bytes that cannot be
    /// decoded into `V` fail with a codec error and mark the span as failed.
    pub async fn get<V: DeserializeOwned>(&self, ctx: &Context, key: &str) -> Result<Option<V>> {
        let command = Command::Get {
            key: key.to_string(),
        };
        self.client
            .execute_with(ctx, command, &[], |reply| -> Result<Option<V>> {
                match reply {
                    Reply::Nil => Ok(None),
                    Reply::Bytes(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
                    other => Err(CacheError::from(TransportError::UnexpectedReply {
                        command: "get",
                        reply: format!("{:?}", other),
                    })),
                }
            })
            .await
    }

    /// Reads the value at `key` in the `(value, exists)` shape.
    pub async fn lookup<V: DeserializeOwned>(
        &self,
        ctx: &Context,
        key: &str,
    ) -> Result<Lookup<V>> {
        self.get(ctx, key).await.map(Lookup::from)
    }

    // == Set ==
    /// Stores `value` at `key` with no expiry, overwriting any previous value.
    pub async fn set<V: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        key: &str,
        value: &V,
    ) -> Result<()> {
        self.store(ctx, key, value, None).await
    }

    // == Set TTL ==
    /// Stores `value` at `key`, expiring `ttl` after the store accepts it.
    ///
    /// A zero `ttl` stores the value without expiry. A `ttl` longer than
    /// [`MAX_TTL`](crate::transport::MAX_TTL) is refused by the store with
    /// [`TransportError::InvalidTtl`] and nothing is written.
    pub async fn set_ttl<V: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        key: &str,
        value: &V,
        ttl: Duration,
    ) -> Result<()> {
        if ttl.is_zero() {
            debug!(key = %key, "Zero TTL requested, storing without expiry");
            return self.store(ctx, key, value, None).await;
        }
        self.store(ctx, key, value, Some(ttl)).await
    }

    async fn store<V: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        key: &str,
        value: &V,
        ttl: Option<Duration>,
    ) -> Result<()> {
        // Encoding happens before any round trip, so no span is opened for it
        let bytes = self.codec.encode(value)?;
        self.client.set(ctx, key, bytes, ttl).await?;
        Ok(())
    }

    // == Remove ==
    /// Deletes `key`. Removing an absent key succeeds.
    pub async fn remove(&self, ctx: &Context, key: &str) -> Result<()> {
        self.client.del(ctx, key).await?;
        Ok(())
    }

    // == Purge ==
    /// Removes every entry of the configured database. Irreversible.
    pub async fn purge(&self, ctx: &Context) -> Result<()> {
        self.client.flush_db(ctx).await?;
        Ok(())
    }

    // == TTL ==
    /// Remaining time to live of `key` as reported by the store.
    pub async fn ttl(&self, ctx: &Context, key: &str) -> Result<Ttl> {
        Ok(self.client.ttl(ctx, key).await?)
    }

    /// Checks the store is reachable.
    pub async fn ping(&self, ctx: &Context) -> Result<()> {
        self.client.ping(ctx).await?;
        Ok(())
    }

    /// Closes the underlying transport.
    pub async fn close(&self, ctx: &Context) -> Result<()> {
        self.client.close(ctx).await?;
        Ok(())
    }
}

impl<T: Transport, C: Codec + Clone> Clone for Cache<T, C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<T: Transport, C: Codec> std::fmt::Debug for Cache<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("address", &self.client.address())
            .finish()
    }
}

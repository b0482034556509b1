//! Traced Cache - a tracing-instrumented cache facade over Redis
//!
//! Application code talks to [`Cache`]: get, set, set with expiry, remove and
//! purge over any serde value. Every command the facade sends to the store goes
//! through the traced [`Client`], which records one span per command.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod trace;
pub mod transport;

pub use api::AppState;
pub use cache::{Cache, Codec, JsonCodec, Lookup, StringCodec};
pub use client::{Client, SpanGuard, Ttl};
pub use config::{Config, TransportOptions};
pub use context::Context;
pub use error::{CacheError, CodecError, Result, TransportError};
pub use trace::{MockTracer, Tracer, TracingTracer};
pub use transport::{MemoryTransport, RedisTransport, Transport, MAX_TTL};

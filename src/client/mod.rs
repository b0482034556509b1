//! Traced Command Wrapper
//!
//! Decorates every command sent to the store with a span. The span is started
//! as a child of the context's span, tagged with the component, the target
//! address, the command name and the store kind, and finished exactly once
//! with an `error` tag reflecting the outcome.

mod span;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::TransportError;
use crate::trace::{Tag, TagValue, Tracer};
use crate::transport::{Command, Reply, Transport};

pub use span::SpanGuard;

// == Public Constants ==
/// Value of the `component` tag on every span.
pub const CACHE_COMPONENT: &str = "redis-cache";

/// Value of the `db.type` tag on every span.
pub const REDIS_DB_TYPE: &str = "kv.redis";

/// Operation name of every span.
pub const OPERATION_NAME: &str = "redis";

// == Ttl ==
/// Remaining lifetime of a key as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key does not exist
    Missing,
    /// The key exists without an expiry
    Persistent,
    /// The key expires after the given duration (second resolution)
    Expires(Duration),
}

impl Ttl {
    fn from_reply(reply: i64) -> Self {
        match reply {
            -2 => Ttl::Missing,
            r if r < 0 => Ttl::Persistent,
            secs => Ttl::Expires(Duration::from_secs(secs.unsigned_abs())),
        }
    }
}

// == Client ==
/// Transport decorated with tracing. Cheap to clone; clones share the
/// transport and the tracer.
pub struct Client<T: Transport> {
    transport: Arc<T>,
    tracer: Arc<dyn Tracer>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, tracer: Arc<dyn Tracer>) -> Self {
        Self::from_shared(Arc::new(transport), tracer)
    }

    /// Wraps a transport already shared elsewhere.
    pub fn from_shared(transport: Arc<T>, tracer: Arc<dyn Tracer>) -> Self {
        Self { transport, tracer }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Address of the store, as reported by the transport.
    pub fn address(&self) -> &str {
        self.transport.address()
    }

    // == Start Span ==
    /// Starts a span for `statement` against `address`.
    ///
    /// The span is a child of `ctx`'s span, or a root span when `ctx` carries
    /// none. Returns the guard owning the span and a context carrying it, so
    /// nested calls continue the same trace.
    pub fn start_span(
        &self,
        ctx: &Context,
        address: &str,
        statement: &str,
        tags: &[Tag],
    ) -> (SpanGuard, Context) {
        let mut guard = SpanGuard::new(self.tracer.start_span(OPERATION_NAME, ctx.span()));
        guard.set_tag("component", CACHE_COMPONENT);
        guard.set_tag("db.instance", address);
        guard.set_tag("db.statement", statement);
        guard.set_tag("db.type", REDIS_DB_TYPE);
        for tag in tags {
            guard.set_tag(&tag.key, tag.value.clone());
        }

        let child = match guard.context() {
            Some(span) => ctx.with_span(span),
            None => ctx.clone(),
        };
        (guard, child)
    }

    // == Execute ==
    /// Runs `command` under `ctx` inside a span and returns the raw reply.
    pub async fn execute(&self, ctx: &Context, command: Command) -> Result<Reply, TransportError> {
        self.execute_with(ctx, command, &[], Ok).await
    }

    /// Runs `command` under `ctx` inside a span, then maps the reply with
    /// `map` before the span is finished. A mapping error therefore marks the
    /// span as failed too.
    pub async fn execute_with<R, E, F>(
        &self,
        ctx: &Context,
        command: Command,
        tags: &[Tag],
        map: F,
    ) -> Result<R, E>
    where
        E: From<TransportError> + fmt::Display,
        F: FnOnce(Reply) -> Result<R, E>,
    {
        let statement = command.name();
        let (span, _) = self.start_span(ctx, self.address(), statement, tags);
        debug!(command = statement, address = %self.address(), "Executing store command");

        let result = match ctx.run(self.transport.execute(command)).await {
            Ok(reply) => map(reply),
            Err(e) => Err(E::from(e)),
        };

        if let Err(e) = &result {
            warn!(command = statement, address = %self.address(), error = %e, "Store command failed");
        }
        span.finish_with(&result);
        result
    }

    // == Commands ==
    /// Reads `key`; `None` when the key does not exist.
    pub async fn get(&self, ctx: &Context, key: &str) -> Result<Option<Vec<u8>>, TransportError> {
        let command = Command::Get {
            key: key.to_string(),
        };
        self.execute_with(ctx, command, &[], |reply| match reply {
            Reply::Nil => Ok(None),
            Reply::Bytes(bytes) => Ok(Some(bytes)),
            other => Err(unexpected("get", &other)),
        })
        .await
    }

    /// Writes `value` at `key`, expiring after `ttl` when set.
    pub async fn set(
        &self,
        ctx: &Context,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), TransportError> {
        let command = Command::Set {
            key: key.to_string(),
            value,
            ttl,
        };
        self.execute_with(ctx, command, &[], expect_status("set"))
            .await
    }

    /// Deletes `key`, returning how many keys were removed.
    pub async fn del(&self, ctx: &Context, key: &str) -> Result<u64, TransportError> {
        let command = Command::Del {
            key: key.to_string(),
        };
        self.execute_with(ctx, command, &[], |reply| match reply {
            Reply::Int(n) => Ok(n.unsigned_abs()),
            other => Err(unexpected("del", &other)),
        })
        .await
    }

    /// Removes every key of the selected database.
    pub async fn flush_db(&self, ctx: &Context) -> Result<(), TransportError> {
        self.execute_with(ctx, Command::FlushDb, &[], expect_status("flushdb"))
            .await
    }

    /// Probes the store, returning its status reply (`PONG`).
    pub async fn ping(&self, ctx: &Context) -> Result<String, TransportError> {
        self.execute_with(ctx, Command::Ping, &[], |reply| match reply {
            Reply::Status(status) => Ok(status),
            Reply::Bytes(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            other => Err(unexpected("ping", &other)),
        })
        .await
    }

    /// Remaining time to live of `key`.
    pub async fn ttl(&self, ctx: &Context, key: &str) -> Result<Ttl, TransportError> {
        let command = Command::Ttl {
            key: key.to_string(),
        };
        self.execute_with(ctx, command, &[], |reply| match reply {
            Reply::Int(n) => Ok(Ttl::from_reply(n)),
            other => Err(unexpected("ttl", &other)),
        })
        .await
    }

    /// Closes the transport inside a span.
    pub async fn close(&self, ctx: &Context) -> Result<(), TransportError> {
        let (span, _) = self.start_span(ctx, self.address(), "close", &[]);
        let result = ctx.run(self.transport.close()).await;
        span.finish_with(&result);
        result
    }
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            tracer: Arc::clone(&self.tracer),
        }
    }
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("address", &self.address())
            .finish()
    }
}

fn unexpected(command: &'static str, reply: &Reply) -> TransportError {
    TransportError::UnexpectedReply {
        command,
        reply: format!("{:?}", reply),
    }
}

fn expect_status(command: &'static str) -> impl FnOnce(Reply) -> Result<(), TransportError> {
    move |reply| match reply {
        Reply::Status(_) => Ok(()),
        other => Err(unexpected(command, &other)),
    }
}

/// Extra tag helper for callers of [`Client::start_span`].
pub fn tag(key: &str, value: impl Into<TagValue>) -> Tag {
    Tag::new(key, value)
}

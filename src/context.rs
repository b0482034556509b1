//! Request Context
//!
//! Carries the deadline, cancellation signal and parent span of a cache call
//! down to the transport. Contexts are cheap to clone and immutable; every
//! `with_*` method returns a derived context.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::trace::SpanContext;

// == Context ==
/// Deadline, cancellation and trace parent of an operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
    span: Option<SpanContext>,
}

impl Context {
    /// An empty context: no deadline, never cancelled, no parent span.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context expiring `timeout` from now. An earlier existing
    /// deadline is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context expiring at `deadline`. An earlier existing deadline
    /// is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Derives a context cancelled when `token` is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: Some(token),
            ..self.clone()
        }
    }

    /// Derives a context whose spans become children of `span`.
    pub fn with_span(&self, span: SpanContext) -> Self {
        Self {
            span: Some(span),
            ..self.clone()
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn span(&self) -> Option<SpanContext> {
        self.span
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Runs `fut` under this context.
    ///
    /// Fails with [`TransportError::Cancelled`] or [`TransportError::Timeout`]
    /// without polling `fut` when the context is already done; otherwise races
    /// `fut` against the deadline and the cancellation token.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        if self.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout);
            }
        }

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(TransportError::Cancelled),
            result = bounded => result,
        }
    }
}

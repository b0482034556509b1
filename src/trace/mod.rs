//! Tracing Module
//!
//! A small span abstraction the command wrapper records into. Any tracer that
//! can start a span, set tags on it and finish it satisfies the contract; the
//! tracer is handed to the wrapper explicitly instead of being looked up from
//! process-wide state.
//!
//! # Implementations
//! - [`TracingTracer`]: bridges spans to the `tracing` ecosystem
//! - [`MockTracer`]: records finished spans in memory for assertions

mod mock;
mod tracing_tracer;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use mock::{FinishedSpan, MockTracer};
pub use tracing_tracer::TracingTracer;

// == Tag Value ==
/// Primitive value a span tag can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(s) => f.write_str(s),
            TagValue::Bool(b) => write!(f, "{}", b),
            TagValue::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

/// Tags attached to a span, keyed by tag name.
pub type Tags = BTreeMap<String, TagValue>;

// == Tag ==
/// A caller-supplied key/value tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: TagValue,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// == Span Context ==
/// Identity of a span, carried in a [`Context`](crate::context::Context) so
/// later spans can attach to the same trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanContext {
    pub trace_id: u64,
    pub span_id: u64,
}

// == Span ==
/// An open span. Finishing consumes it, so a span is finalized at most once.
pub trait Span: Send {
    /// Identity of this span.
    fn context(&self) -> SpanContext;

    /// Sets or overwrites a tag.
    fn set_tag(&mut self, key: &str, value: TagValue);

    /// Closes the span.
    fn finish(self: Box<Self>);
}

// == Tracer ==
/// Factory for spans. Shared by every caller for the lifetime of the process.
pub trait Tracer: Send + Sync {
    /// Starts a span as a child of `parent`, or a new root span when `None`.
    fn start_span(&self, operation_name: &str, parent: Option<SpanContext>) -> Box<dyn Span>;
}

// == Id Generator ==
/// Monotonic id source for span and trace ids, owned by each tracer.
#[derive(Debug)]
pub(crate) struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocates the identity of a new span under `parent`.
    pub(crate) fn child_of(&self, parent: Option<SpanContext>) -> SpanContext {
        let span_id = self.next_id();
        let trace_id = parent.map(|p| p.trace_id).unwrap_or(span_id);
        SpanContext { trace_id, span_id }
    }
}

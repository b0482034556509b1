//! Tracer backed by the `tracing` crate.
//!
//! Every span becomes a `tracing` span carrying the database fields as
//! structured fields, so any subscriber (fmt, OpenTelemetry bridge, ...) sees
//! them. Tags outside the well-known set are emitted on the closing event.

use tracing::field::Empty;

use super::{IdGenerator, Span, SpanContext, TagValue, Tracer};

/// Tag names recorded as first-class span fields.
const KNOWN_FIELDS: [&str; 5] = ["component", "db.instance", "db.statement", "db.type", "error"];

// == Tracing Tracer ==
/// Production tracer forwarding spans to the active `tracing` subscriber.
#[derive(Debug)]
pub struct TracingTracer {
    ids: IdGenerator,
}

impl TracingTracer {
    pub fn new() -> Self {
        Self {
            ids: IdGenerator::new(),
        }
    }
}

impl Default for TracingTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for TracingTracer {
    fn start_span(&self, operation_name: &str, parent: Option<SpanContext>) -> Box<dyn Span> {
        let context = self.ids.child_of(parent);
        let span = tracing::info_span!(
            "cache_command",
            "otel.name" = operation_name,
            trace_id = context.trace_id,
            span_id = context.span_id,
            parent_id = parent.map(|p| p.span_id),
            component = Empty,
            "db.instance" = Empty,
            "db.statement" = Empty,
            "db.type" = Empty,
            error = Empty,
        );
        Box::new(TracingSpan {
            span,
            context,
            extra: Vec::new(),
        })
    }
}

struct TracingSpan {
    span: tracing::Span,
    context: SpanContext,
    extra: Vec<(String, TagValue)>,
}

impl Span for TracingSpan {
    fn context(&self) -> SpanContext {
        self.context
    }

    fn set_tag(&mut self, key: &str, value: TagValue) {
        if !KNOWN_FIELDS.contains(&key) {
            self.extra.retain(|(k, _)| k != key);
            self.extra.push((key.to_string(), value));
            return;
        }
        match value {
            TagValue::Str(s) => self.span.record(key, s.as_str()),
            TagValue::Bool(b) => self.span.record(key, b),
            TagValue::Int(i) => self.span.record(key, i),
        };
    }

    fn finish(self: Box<Self>) {
        let TracingSpan { span, extra, .. } = *self;
        span.in_scope(|| {
            if extra.is_empty() {
                tracing::trace!("span finished");
            } else {
                let tags = extra
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(",");
                tracing::trace!(tags = %tags, "span finished");
            }
        });
    }
}

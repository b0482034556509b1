//! In-memory tracer that keeps every finished span for inspection.

use std::sync::{Arc, Mutex};

use super::{IdGenerator, Span, SpanContext, TagValue, Tags, Tracer};

// == Finished Span ==
/// Snapshot of a span taken when it was finished.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSpan {
    pub operation_name: String,
    pub context: SpanContext,
    pub parent: Option<SpanContext>,
    pub tags: Tags,
}

impl FinishedSpan {
    /// Returns the tag stored under `key`.
    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key)
    }
}

// == Mock Tracer ==
/// Tracer recording finished spans in the order they were finished.
#[derive(Debug, Clone)]
pub struct MockTracer {
    finished: Arc<Mutex<Vec<FinishedSpan>>>,
    ids: Arc<IdGenerator>,
}

impl MockTracer {
    pub fn new() -> Self {
        Self {
            finished: Arc::new(Mutex::new(Vec::new())),
            ids: Arc::new(IdGenerator::new()),
        }
    }

    /// Returns a copy of every span finished so far.
    pub fn finished_spans(&self) -> Vec<FinishedSpan> {
        match self.finished.lock() {
            Ok(spans) => spans.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Forgets all finished spans.
    pub fn reset(&self) {
        if let Ok(mut spans) = self.finished.lock() {
            spans.clear();
        }
    }
}

impl Default for MockTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for MockTracer {
    fn start_span(&self, operation_name: &str, parent: Option<SpanContext>) -> Box<dyn Span> {
        Box::new(MockSpan {
            operation_name: operation_name.to_string(),
            context: self.ids.child_of(parent),
            parent,
            tags: Tags::new(),
            sink: Arc::clone(&self.finished),
        })
    }
}

struct MockSpan {
    operation_name: String,
    context: SpanContext,
    parent: Option<SpanContext>,
    tags: Tags,
    sink: Arc<Mutex<Vec<FinishedSpan>>>,
}

impl Span for MockSpan {
    fn context(&self) -> SpanContext {
        self.context
    }

    fn set_tag(&mut self, key: &str, value: TagValue) {
        self.tags.insert(key.to_string(), value);
    }

    fn finish(self: Box<Self>) {
        let MockSpan {
            operation_name,
            context,
            parent,
            tags,
            sink,
        } = *self;
        if let Ok(mut spans) = sink.lock() {
            spans.push(FinishedSpan {
                operation_name,
                context,
                parent,
                tags,
            });
        };
    }
}

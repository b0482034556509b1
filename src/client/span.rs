//! Scoped span ownership.

use std::fmt;

use crate::trace::{Span, SpanContext, TagValue};

// == Span Guard ==
/// Owns an open span and guarantees it is finished exactly once.
///
/// [`finish`](SpanGuard::finish) closes the span with the given outcome. A
/// guard dropped while still open (early return, panic, or the owning future
/// being dropped mid-command) finishes the span with `error = true`.
pub struct SpanGuard {
    span: Option<Box<dyn Span>>,
}

impl SpanGuard {
    pub(crate) fn new(span: Box<dyn Span>) -> Self {
        Self { span: Some(span) }
    }

    /// Identity of the guarded span.
    pub fn context(&self) -> Option<SpanContext> {
        self.span.as_ref().map(|span| span.context())
    }

    pub fn set_tag(&mut self, key: &str, value: impl Into<TagValue>) {
        if let Some(span) = self.span.as_mut() {
            span.set_tag(key, value.into());
        }
    }

    /// Tags the outcome and closes the span.
    pub fn finish(mut self, failed: bool) {
        self.close(failed);
    }

    /// Closes the span, tagging it as failed when `result` is an error.
    pub fn finish_with<T, E>(self, result: &Result<T, E>) {
        self.finish(result.is_err());
    }

    fn close(&mut self, failed: bool) {
        if let Some(mut span) = self.span.take() {
            span.set_tag("error", TagValue::Bool(failed));
            span.finish();
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.close(true);
    }
}

impl fmt::Debug for SpanGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanGuard")
            .field("context", &self.context())
            .finish()
    }
}

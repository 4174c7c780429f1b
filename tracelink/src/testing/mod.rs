//! Test utilities.
//!
//! In-memory lifecycle listener for asserting on spans in tests. Enabled
//! with the `testing` feature (and always available to this crate's own
//! tests).

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::trace::{Span, SpanLifecycleListener};

/// A [`SpanLifecycleListener`] that records spans in memory.
///
/// Cloning is cheap and clones share storage, so a test can keep one handle
/// and register another on the tracer.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use tracelink::testing::SpanRecorder;
/// use tracelink::trace::Tracer;
///
/// let recorder = SpanRecorder::new();
/// let tracer = Tracer::builder()
///     .with_listener(Arc::new(recorder.clone()))
///     .build();
///
/// let mut ctx = tracer.new_context();
/// ctx.start_root_span("observed");
/// let _ = ctx.complete_current_span();
///
/// assert_eq!(recorder.completed_spans().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SpanRecorder {
    started: Arc<Mutex<Vec<Span>>>,
    sampled: Arc<Mutex<Vec<Span>>>,
    completed: Arc<Mutex<Vec<Span>>>,
}

impl SpanRecorder {
    /// Create a new, empty recorder.
    pub fn new() -> Self {
        SpanRecorder::default()
    }

    /// Spans that have been started, in notification order.
    pub fn started_spans(&self) -> Vec<Span> {
        self.started.lock().map(|spans| spans.clone()).unwrap_or_default()
    }

    /// Spans whose sampling decision was fixed as sampleable.
    pub fn sampled_spans(&self) -> Vec<Span> {
        self.sampled.lock().map(|spans| spans.clone()).unwrap_or_default()
    }

    /// Spans that have completed, in completion order.
    pub fn completed_spans(&self) -> Vec<Span> {
        self.completed.lock().map(|spans| spans.clone()).unwrap_or_default()
    }

    /// Clears all recorded spans.
    pub fn reset(&self) {
        for store in [&self.started, &self.sampled, &self.completed] {
            if let Ok(mut spans) = store.lock() {
                spans.clear();
            }
        }
    }

    /// Block until at least `expected` spans have completed, or give up
    /// after `timeout`. Returns whether the expectation was met.
    ///
    /// Spans completed by other execution contexts (a server task, say)
    /// land here asynchronously relative to the test body.
    pub fn wait_for_completed_spans(&self, expected: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let count = self
                .completed
                .lock()
                .map(|spans| spans.len())
                .unwrap_or_default();
            if count >= expected {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

impl SpanLifecycleListener for SpanRecorder {
    fn span_started(&self, span: &Span) {
        if let Ok(mut spans) = self.started.lock() {
            spans.push(span.clone());
        }
    }

    fn span_sampled(&self, span: &Span) {
        if let Ok(mut spans) = self.sampled.lock() {
            spans.push(span.clone());
        }
    }

    fn span_completed(&self, span: &Span) {
        if let Ok(mut spans) = self.completed.lock() {
            spans.push(span.clone());
        }
    }
}

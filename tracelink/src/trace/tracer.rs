//! # Tracer
//!
//! The `Tracer` holds the process-wide pieces of the tracing machinery:
//! the lifecycle listener registry, the id generator, and the sampling
//! policy. It is a cheaply cloneable handle; clones share the same
//! underlying state.
//!
//! Per-request span tracking lives in [`TraceContext`] values created via
//! [`Tracer::new_context`]; there is no thread-local or global "current"
//! span. A context is threaded explicitly through the code handling one
//! logical request.

use std::fmt;
use std::sync::Arc;

use crate::trace::id_generator::{IdGenerator, RandomIdGenerator};
use crate::trace::listener::{ListenerRegistry, SpanLifecycleListener};
use crate::trace::sampler::{AlwaysSampler, Sampler};
use crate::trace::span::Span;
use crate::trace::TraceContext;
use crate::tracelink_debug;

/// Handle to the shared tracing machinery.
///
/// # Examples
///
/// ```
/// use tracelink::trace::{SpanPurpose, Tracer};
///
/// let tracer = Tracer::default();
/// let mut ctx = tracer.new_context();
///
/// ctx.start_root_span("handle-request");
/// ctx.start_sub_span("load-profile", SpanPurpose::LocalOnly);
/// let child = ctx.complete_current_span().expect("child is current");
/// let root = ctx.complete_current_span().expect("root is still current");
/// assert_eq!(child.parent_span_id(), Some(root.span_id()));
/// assert!(root.duration().is_some());
/// ```
#[derive(Clone, Debug)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

#[derive(Debug)]
pub(crate) struct TracerInner {
    pub(crate) id_generator: Box<dyn IdGenerator>,
    pub(crate) sampler: Box<dyn Sampler>,
    pub(crate) listeners: ListenerRegistry,
}

impl Default for Tracer {
    fn default() -> Self {
        Tracer::builder().build()
    }
}

impl Tracer {
    /// Create a builder to configure a `Tracer`.
    pub fn builder() -> TracerBuilder {
        TracerBuilder::default()
    }

    /// Create a fresh [`TraceContext`] for one execution context (one
    /// logical request). Contexts are independent; no locking happens
    /// between them.
    pub fn new_context(&self) -> TraceContext {
        TraceContext::new(self.clone())
    }

    /// Register a lifecycle listener. Safe to call concurrently from any
    /// execution context; listeners are notified in registration order.
    pub fn register_listener(&self, listener: Arc<dyn SpanLifecycleListener>) {
        self.inner.listeners.register(listener);
    }

    /// Remove a previously registered listener, matched by identity.
    /// Returns `true` if it was registered.
    pub fn unregister_listener(&self, listener: &Arc<dyn SpanLifecycleListener>) -> bool {
        self.inner.listeners.unregister(listener)
    }

    /// Complete `span` and notify listeners.
    ///
    /// Completing an already-completed span is a no-op: no mutation, no
    /// duplicate notifications.
    pub fn complete_span(&self, span: &mut Span) {
        if !span.complete() {
            tracelink_debug!(name: "Tracer.CompleteSpan.AlreadyCompleted", span_id = format!("{}", span.span_id()));
            return;
        }
        self.inner.listeners.notify_completed(span);
    }

    pub(crate) fn inner(&self) -> &TracerInner {
        &self.inner
    }
}

/// Configures and builds a [`Tracer`].
pub struct TracerBuilder {
    id_generator: Box<dyn IdGenerator>,
    sampler: Box<dyn Sampler>,
    listeners: Vec<Arc<dyn SpanLifecycleListener>>,
}

impl Default for TracerBuilder {
    fn default() -> Self {
        TracerBuilder {
            id_generator: Box::new(RandomIdGenerator::default()),
            sampler: Box::new(AlwaysSampler::default()),
            listeners: Vec::new(),
        }
    }
}

impl TracerBuilder {
    /// Use the given id generator instead of [`RandomIdGenerator`].
    pub fn with_id_generator<T: IdGenerator + 'static>(mut self, id_generator: T) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    /// Use the given sampling policy instead of [`AlwaysSampler`].
    pub fn with_sampler<T: Sampler + 'static>(mut self, sampler: T) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// Register a lifecycle listener at construction time.
    pub fn with_listener(mut self, listener: Arc<dyn SpanLifecycleListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Build the configured `Tracer`.
    pub fn build(self) -> Tracer {
        Tracer {
            inner: Arc::new(TracerInner {
                id_generator: self.id_generator,
                sampler: self.sampler,
                listeners: ListenerRegistry::new(self.listeners),
            }),
        }
    }
}

impl fmt::Debug for TracerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracerBuilder")
            .field("id_generator", &self.id_generator)
            .field("sampler", &self.sampler)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SpanRecorder;

    #[test]
    fn completing_a_completed_span_is_a_no_op() {
        let recorder = SpanRecorder::new();
        let tracer = Tracer::builder()
            .with_listener(Arc::new(recorder.clone()))
            .build();

        let mut ctx = tracer.new_context();
        ctx.start_root_span("once");
        let mut span = ctx.complete_current_span().expect("root was current");
        assert_eq!(recorder.completed_spans().len(), 1);
        let duration = span.duration();

        tracer.complete_span(&mut span);
        assert_eq!(recorder.completed_spans().len(), 1);
        assert_eq!(span.duration(), duration);
    }

    #[test]
    fn listeners_can_come_and_go_at_runtime() {
        let recorder = SpanRecorder::new();
        let tracer = Tracer::default();
        let listener: Arc<dyn SpanLifecycleListener> = Arc::new(recorder.clone());

        tracer.register_listener(listener.clone());
        let mut ctx = tracer.new_context();
        ctx.start_root_span("observed");
        let _ = ctx.complete_current_span();
        assert_eq!(recorder.completed_spans().len(), 1);

        assert!(tracer.unregister_listener(&listener));
        let mut ctx = tracer.new_context();
        ctx.start_root_span("unobserved");
        let _ = ctx.complete_current_span();
        assert_eq!(recorder.completed_spans().len(), 1);
    }
}

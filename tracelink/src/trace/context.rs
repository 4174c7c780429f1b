//! # Trace Context Store
//!
//! A [`TraceContext`] tracks the stack of live spans for one execution
//! context, one thread of control handling one logical request. The top of
//! the stack is the "current" span; spans pushed after the first inherit
//! the trace id of the span beneath them and record it as their parent.
//!
//! Contexts are explicit values: create one per request with
//! [`Tracer::new_context`] and pass it (or carry it on the request's task)
//! wherever spans are started and completed. Nothing is stored in
//! thread-local or global state, so the context moves freely across
//! async boundaries.
//!
//! Tracing must never break the application: every misuse of the stack
//! (completing with nothing current, starting a sub-span with no parent,
//! abandoning live spans) is tolerated with a warning, never an error.
//!
//! [`Tracer::new_context`]: crate::trace::Tracer::new_context

use crate::trace::span::{Span, SpanPurpose};
use crate::trace::span_context::TraceContextSeed;
use crate::trace::tracer::Tracer;
use crate::tracelink_warn;

/// Per-execution-context stack of live spans.
#[derive(Debug)]
pub struct TraceContext {
    tracer: Tracer,
    stack: Vec<Span>,
    inherited: Option<TraceContextSeed>,
}

impl TraceContext {
    pub(crate) fn new(tracer: Tracer) -> Self {
        TraceContext {
            tracer,
            stack: Vec::new(),
            inherited: None,
        }
    }

    /// The [`Tracer`] this context was created from.
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Start a new trace: a root span with a fresh trace id and no parent.
    ///
    /// The sampling decision for the whole trace is made here. Listeners
    /// are notified of the start (and, for sampleable spans, the sampling
    /// decision).
    ///
    /// Calling this while spans are live is a usage error; the stack is
    /// reset with a warning and the abandoned spans never complete.
    pub fn start_root_span(&mut self, name: impl Into<String>) -> &Span {
        if !self.stack.is_empty() {
            tracelink_warn!(
                name: "TraceContext.StartRootSpan.NonEmptyStack",
                abandoned = self.stack.len()
            );
            self.stack.clear();
        }
        let name = name.into();
        let inner = self.tracer.inner();
        let trace_id = inner.id_generator.new_trace_id();
        let sampleable = inner.sampler.should_sample(trace_id, &name);
        let span = Span::new(
            trace_id,
            inner.id_generator.new_span_id(),
            None,
            name,
            SpanPurpose::Root,
            sampleable,
        );
        self.push_and_start(span)
    }

    /// Start a span nested under whatever is current.
    ///
    /// In order of preference the new span is a child of the current span,
    /// a child of an adopted external context, or (with a warning, so the
    /// caller's request flow is never blocked) a root span of a brand new
    /// trace carrying the requested purpose.
    pub fn start_sub_span(&mut self, name: impl Into<String>, purpose: SpanPurpose) -> &Span {
        let name = name.into();
        let inner = self.tracer.inner();
        let span = if let Some(parent) = self.stack.last() {
            Span::new(
                parent.trace_id(),
                inner.id_generator.new_span_id(),
                Some(parent.span_id()),
                name,
                purpose,
                parent.sampleable(),
            )
        } else if let Some(seed) = self.inherited.as_ref() {
            Span::new(
                seed.trace_id,
                inner.id_generator.new_span_id(),
                Some(seed.parent_span_id),
                name,
                purpose,
                seed.sampleable,
            )
        } else {
            tracelink_warn!(name: "TraceContext.StartSubSpan.NoCurrentSpan");
            let trace_id = inner.id_generator.new_trace_id();
            let sampleable = inner.sampler.should_sample(trace_id, &name);
            Span::new(
                trace_id,
                inner.id_generator.new_span_id(),
                None,
                name,
                purpose,
                sampleable,
            )
        };
        self.push_and_start(span)
    }

    /// Complete the current span: pop it, fix its duration, and notify
    /// listeners. Returns the completed span.
    ///
    /// Only the top of the stack is ever popped; mismatched completion
    /// order is a programming error tolerated by strict LIFO, never by
    /// searching the stack. Completing with an empty stack warns and
    /// returns `None`.
    pub fn complete_current_span(&mut self) -> Option<Span> {
        match self.stack.pop() {
            Some(mut span) => {
                self.tracer.complete_span(&mut span);
                Some(span)
            }
            None => {
                tracelink_warn!(name: "TraceContext.CompleteCurrentSpan.EmptyStack");
                None
            }
        }
    }

    /// Attach an inherited trace identity (typically decoded from inbound
    /// request headers) so the next span started with an empty stack is
    /// parented to the remote caller instead of beginning a new trace.
    pub fn adopt_external_context(&mut self, seed: TraceContextSeed) {
        self.inherited = Some(seed);
    }

    /// The current (top of stack) span, if any.
    pub fn current_span(&self) -> Option<&Span> {
        self.stack.last()
    }

    /// Mutable access to the current span, e.g. for tagging it right
    /// before completion.
    pub fn current_span_mut(&mut self) -> Option<&mut Span> {
        self.stack.last_mut()
    }

    fn push_and_start(&mut self, mut span: Span) -> &Span {
        span.start();
        let listeners = &self.tracer.inner().listeners;
        listeners.notify_started(&span);
        if span.sampleable() {
            listeners.notify_sampled(&span);
        }
        let index = self.stack.len();
        self.stack.push(span);
        &self.stack[index]
    }
}

impl Drop for TraceContext {
    fn drop(&mut self) {
        // Dangling spans are never completed; make the leak visible.
        if !self.stack.is_empty() {
            tracelink_warn!(
                name: "TraceContext.Drop.DanglingSpans",
                dangling = self.stack.len()
            );
        }
    }
}

//! Distributed-trace propagation: span lifecycle tracking and trace
//! identity that survives process boundaries.
//!
//! A *trace* is the set of all spans sharing one trace id: one logical
//! request as it crosses processes. Each *span* is a single timed unit of
//! work within it. This crate provides the span lifecycle engine (create,
//! nest, tag, complete, observe) and the wire codec that carries trace
//! identity in HTTP headers; the companion `tracelink-http` crate
//! instruments outbound HTTP calls with it.
//!
//! # Getting started
//!
//! ```
//! use tracelink::trace::{SpanPurpose, Tracer};
//!
//! // One tracer per process; one context per request. Spans nest LIFO.
//! let tracer = Tracer::default();
//! let mut ctx = tracer.new_context();
//! ctx.start_root_span("handle-request");
//! ctx.start_sub_span("query-db", SpanPurpose::LocalOnly);
//!
//! let child = ctx.complete_current_span().expect("child is current");
//! let root = ctx.complete_current_span().expect("root is current");
//! assert_eq!(child.trace_id(), root.trace_id());
//! assert_eq!(child.parent_span_id(), Some(root.span_id()));
//! ```
//!
//! # Crossing a process boundary
//!
//! The [`propagation::TraceHeaderCodec`] writes a span's identity into
//! `Trace-Id` / `Span-Id` / `Parent-Span-Id` / `Sampled` entries of any
//! carrier implementing [`propagation::Injector`], and decodes the same
//! names into a [`trace::TraceContextSeed`] on the receiving side. The
//! receiver adopts the seed into its own context so its spans join the
//! caller's trace.
//!
//! Tracing never breaks the application: malformed inbound headers mean "no
//! upstream context", misuse of the span stack is logged and tolerated, and
//! a failing listener cannot take down its siblings or the request.

#![warn(missing_docs)]

pub mod propagation;
pub mod tags;
pub mod trace;

mod internal_logging;

#[cfg(any(feature = "testing", test))]
pub mod testing;

#[doc(hidden)]
#[cfg(feature = "internal-logs")]
pub mod _private {
    pub use tracing::{debug, error, warn};
}

pub use trace::{Span, SpanPurpose, TraceContext, TraceContextSeed, Tracer};

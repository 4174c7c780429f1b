//! # Trace API
//!
//! The span lifecycle engine: spans, the per-execution-context span stack,
//! the lifecycle notifier, and the supporting id-generation and sampling
//! seams.
//!
//! The pieces fit together like this:
//!
//! * A [`Tracer`] holds everything shared between requests: lifecycle
//!   listeners, the id generator, the sampling policy.
//! * Each logical request gets its own [`TraceContext`], an explicit value
//!   holding that request's span stack. The top of the stack is the
//!   "current" span.
//! * Completed spans are fanned out, read-only, to every registered
//!   [`SpanLifecycleListener`].

mod context;
mod id_generator;
mod listener;
mod sampler;
mod span;
mod span_context;
mod tracer;

pub use context::TraceContext;
pub use id_generator::{IdGenerator, RandomIdGenerator};
pub use listener::SpanLifecycleListener;
pub use sampler::{AlwaysSampler, Sampler};
pub use span::{Span, SpanPurpose, SpanState};
pub use span_context::{SpanId, TraceContextSeed, TraceError, TraceId};
pub use tracer::{Tracer, TracerBuilder};

#[cfg(any(feature = "testing", test))]
pub use id_generator::IncrementIdGenerator;

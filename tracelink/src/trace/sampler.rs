//! Sampling extension point.
//!
//! The sampling decision is made once, when a root span is created, and is
//! propagated unchanged to children and across process boundaries via the
//! `Sampled` header. No sampling algorithm ships with this crate beyond the
//! fixed always-on policy; exporters that need probabilistic or rate-limited
//! sampling supply their own [`Sampler`].

use std::fmt;

use crate::trace::span_context::TraceId;

/// Decides whether spans of a new trace are eligible for export.
pub trait Sampler: Send + Sync + fmt::Debug {
    /// Returns `true` if spans of the trace identified by `trace_id` should
    /// be marked sampleable. `name` is the root span's initial name.
    fn should_sample(&self, trace_id: TraceId, name: &str) -> bool;
}

/// Default policy: every trace is sampleable.
#[derive(Clone, Debug, Default)]
pub struct AlwaysSampler {
    _private: (),
}

impl AlwaysSampler {
    /// Create a new `AlwaysSampler`.
    pub fn new() -> Self {
        AlwaysSampler::default()
    }
}

impl Sampler for AlwaysSampler {
    fn should_sample(&self, _trace_id: TraceId, _name: &str) -> bool {
        true
    }
}

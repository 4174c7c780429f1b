//! # Span
//!
//! A `Span` is a single timed unit of work within a trace. Spans nest to
//! form a trace tree: each trace has a root span and optionally sub-spans
//! for its sub-operations, all sharing one trace id.
//!
//! A span's name and tags can be changed freely while it is live. Once the
//! span completes its duration is fixed and every further mutation is
//! ignored.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime};

use crate::trace::span_context::{SpanId, TraceId};
use crate::tracelink_warn;

/// Semantic role of a span within a trace.
///
/// The purpose describes what kind of work the span represents, not its
/// nesting depth: a `Client` span can be a root when no other span was
/// active at the call site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpanPurpose {
    /// The overall span for a request handled by this process.
    Root,
    /// An outbound call to another process.
    Client,
    /// Work performed on behalf of a remote caller.
    Server,
    /// In-process work that never crosses a process boundary.
    LocalOnly,
    /// No purpose was stated.
    #[default]
    Unknown,
}

/// Lifecycle state of a span. `Completed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanState {
    /// Created but not yet pushed onto a trace context.
    NotStarted,
    /// Live; the span may still be renamed and tagged.
    Started,
    /// Finished; duration is fixed and the span is immutable.
    Completed,
}

/// Single timed unit of work within a trace.
///
/// Spans are created through a [`TraceContext`] and owned by it until they
/// complete; completed spans are handed to lifecycle listeners read-only.
///
/// [`TraceContext`]: crate::trace::TraceContext
#[derive(Clone, Debug)]
pub struct Span {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    name: String,
    purpose: SpanPurpose,
    sampleable: bool,
    start_timestamp: SystemTime,
    // Monotonic anchor so the recorded duration can never be negative.
    started_at: Instant,
    duration: Option<Duration>,
    tags: HashMap<String, String>,
    state: SpanState,
}

impl Span {
    pub(crate) fn new(
        trace_id: TraceId,
        span_id: SpanId,
        parent_span_id: Option<SpanId>,
        name: String,
        purpose: SpanPurpose,
        sampleable: bool,
    ) -> Self {
        Span {
            trace_id,
            span_id,
            parent_span_id,
            name,
            purpose,
            sampleable,
            start_timestamp: SystemTime::now(),
            started_at: Instant::now(),
            duration: None,
            tags: HashMap::new(),
            state: SpanState::NotStarted,
        }
    }

    /// Transition to `Started`. Only meaningful from `NotStarted`.
    pub(crate) fn start(&mut self) {
        if self.state == SpanState::NotStarted {
            self.state = SpanState::Started;
        }
    }

    /// Transition to `Completed`, fixing the duration.
    ///
    /// Returns `false` if the span was already completed, in which case
    /// nothing changes.
    pub(crate) fn complete(&mut self) -> bool {
        if self.state == SpanState::Completed {
            return false;
        }
        self.duration = Some(self.started_at.elapsed());
        self.state = SpanState::Completed;
        true
    }

    /// Trace id shared by every span belonging to one logical request.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Id of this span, unique within its trace.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// Id of the enclosing span, or `None` for a root.
    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }

    /// Human-readable operation label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic role of this span.
    pub fn purpose(&self) -> SpanPurpose {
        self.purpose
    }

    /// Whether this span's data is eligible for export. Decided at creation
    /// and propagated unchanged to children.
    pub fn sampleable(&self) -> bool {
        self.sampleable
    }

    /// Wall-clock time at which the span was created.
    pub fn start_timestamp(&self) -> SystemTime {
        self.start_timestamp
    }

    /// Elapsed time of the span, set exactly once at completion.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Elapsed nanoseconds of the span, set exactly once at completion.
    pub fn duration_nanos(&self) -> Option<u128> {
        self.duration.map(|d| d.as_nanos())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SpanState {
        self.state
    }

    /// Returns `true` once the span has completed.
    pub fn is_completed(&self) -> bool {
        self.state == SpanState::Completed
    }

    /// Rename the span. Ignored (with a warning) once completed.
    pub fn set_name(&mut self, name: impl Into<String>) {
        if self.state == SpanState::Completed {
            tracelink_warn!(name: "Span.SetName.AfterCompletion", span_id = format!("{}", self.span_id));
            return;
        }
        self.name = name.into();
    }

    /// Write a tag. Keys are unique; the last write wins. Ignored (with a
    /// warning) once completed.
    pub fn put_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if self.state == SpanState::Completed {
            tracelink_warn!(name: "Span.PutTag.AfterCompletion", span_id = format!("{}", self.span_id));
            return;
        }
        self.tags.insert(key.into(), value.into());
    }

    /// Look up a single tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// All tags recorded on this span.
    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_span() -> Span {
        Span::new(
            TraceId::from(1u128),
            SpanId::from(2u64),
            None,
            "test".to_owned(),
            SpanPurpose::Root,
            true,
        )
    }

    #[test]
    fn state_machine_transitions() {
        let mut span = test_span();
        assert_eq!(span.state(), SpanState::NotStarted);
        assert_eq!(span.duration(), None);

        span.start();
        assert_eq!(span.state(), SpanState::Started);

        assert!(span.complete());
        assert_eq!(span.state(), SpanState::Completed);
        assert!(span.duration().is_some());
    }

    #[test]
    fn completion_is_idempotent() {
        let mut span = test_span();
        span.start();
        assert!(span.complete());
        let first_duration = span.duration();

        assert!(!span.complete());
        assert_eq!(span.duration(), first_duration);
    }

    #[test]
    fn mutation_after_completion_is_ignored() {
        let mut span = test_span();
        span.start();
        span.put_tag("color", "red");
        span.complete();

        span.set_name("renamed");
        span.put_tag("color", "blue");
        span.put_tag("late", "tag");

        assert_eq!(span.name(), "test");
        assert_eq!(span.tag("color"), Some("red"));
        assert_eq!(span.tag("late"), None);
    }

    #[test]
    fn last_tag_write_wins() {
        let mut span = test_span();
        span.start();
        span.put_tag("http.status_code", "500");
        span.put_tag("http.status_code", "200");
        assert_eq!(span.tag("http.status_code"), Some("200"));
        assert_eq!(span.tags().len(), 1);
    }
}

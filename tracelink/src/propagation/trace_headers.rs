//! # Trace header codec
//!
//! Serializes trace identity into wire-level headers and back. Four fixed
//! header names carry everything a downstream process needs to continue
//! the trace:
//!
//! ```text
//! Trace-Id: 5f467fe7bf42676c05e20ba4a90e448e
//! Span-Id: 4c721bf33e3caf8f
//! Parent-Span-Id: 00f067aa0ba902b7
//! Sampled: 1
//! ```
//!
//! Decoding is strict about values and permissive about everything else:
//! any malformed value yields "no inherited context" (the caller then
//! starts a fresh root trace), unknown extra headers are ignored, and a
//! missing `Parent-Span-Id` is valid, since the remote span may itself be a
//! root.

use crate::propagation::{Extractor, Injector};
use crate::trace::{Span, SpanId, TraceContextSeed, TraceId};

/// Header carrying the trace id shared by every span of a trace.
pub const TRACE_ID_HEADER: &str = "Trace-Id";
/// Header carrying the sending span's own id.
pub const SPAN_ID_HEADER: &str = "Span-Id";
/// Header carrying the sending span's parent id, when it has one.
pub const PARENT_SPAN_ID_HEADER: &str = "Parent-Span-Id";
/// Header carrying the sampling decision, `"1"` or `"0"`.
pub const SAMPLED_HEADER: &str = "Sampled";

const HEADER_FIELDS: [&str; 4] = [
    TRACE_ID_HEADER,
    SPAN_ID_HEADER,
    PARENT_SPAN_ID_HEADER,
    SAMPLED_HEADER,
];

/// Encodes spans into, and decodes inherited context out of, the fixed
/// trace headers.
#[derive(Clone, Debug, Default)]
pub struct TraceHeaderCodec {
    _private: (),
}

impl TraceHeaderCodec {
    /// Create a new `TraceHeaderCodec`.
    pub fn new() -> Self {
        TraceHeaderCodec { _private: () }
    }

    /// The header names this codec reads and writes.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> {
        HEADER_FIELDS.iter().copied()
    }

    /// Write `span`'s identity into the carrier.
    ///
    /// `Parent-Span-Id` is only written when the span has a parent; the
    /// sampled flag is written as `"1"` / `"0"`.
    pub fn inject(&self, span: &Span, injector: &mut dyn Injector) {
        injector.set(TRACE_ID_HEADER, span.trace_id().to_string());
        injector.set(SPAN_ID_HEADER, span.span_id().to_string());
        if let Some(parent_span_id) = span.parent_span_id() {
            injector.set(PARENT_SPAN_ID_HEADER, parent_span_id.to_string());
        }
        injector.set(
            SAMPLED_HEADER,
            if span.sampleable() { "1" } else { "0" }.to_string(),
        );
    }

    /// Read an inherited trace identity out of the carrier.
    ///
    /// Returns `None` unless a valid `Trace-Id` and `Span-Id` are both
    /// present; a partial or malformed context is never produced. The
    /// remote `Span-Id` becomes the seed's parent span id. A missing
    /// `Sampled` header defaults to sampleable; the decoder accepts
    /// `1`/`0`/`true`/`false` in any ASCII case.
    pub fn decode(&self, extractor: &dyn Extractor) -> Option<TraceContextSeed> {
        let trace_id = TraceId::from_hex(extractor.get(TRACE_ID_HEADER)?.trim()).ok()?;
        let parent_span_id = SpanId::from_hex(extractor.get(SPAN_ID_HEADER)?.trim()).ok()?;
        if !trace_id.is_valid() || !parent_span_id.is_valid() {
            return None;
        }

        // The remote span's own parent has no local use, but a mangled
        // value still disqualifies the whole context.
        if let Some(raw) = extractor.get(PARENT_SPAN_ID_HEADER) {
            let remote_parent = SpanId::from_hex(raw.trim()).ok()?;
            if !remote_parent.is_valid() {
                return None;
            }
        }

        let sampleable = match extractor.get(SAMPLED_HEADER) {
            None => true,
            Some(raw) => parse_sampled(raw.trim())?,
        };

        Some(TraceContextSeed::new(trace_id, parent_span_id, sampleable))
    }
}

fn parse_sampled(raw: &str) -> Option<bool> {
    if raw == "1" || raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw == "0" || raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{SpanPurpose, Tracer};
    use std::collections::HashMap;

    fn carrier(entries: &[(&str, &str)]) -> HashMap<String, String> {
        let mut carrier = HashMap::new();
        for (key, value) in entries {
            carrier.set(key, (*value).to_string());
        }
        carrier
    }

    #[test]
    fn inject_root_span() {
        let tracer = Tracer::default();
        let mut ctx = tracer.new_context();
        let mut carrier: HashMap<String, String> = HashMap::new();

        let codec = TraceHeaderCodec::new();
        {
            let root = ctx.start_root_span("root");
            codec.inject(root, &mut carrier);

            assert_eq!(
                Extractor::get(&carrier, TRACE_ID_HEADER),
                Some(root.trace_id().to_string().as_str())
            );
            assert_eq!(
                Extractor::get(&carrier, SPAN_ID_HEADER),
                Some(root.span_id().to_string().as_str())
            );
        }
        // roots have no parent, so the header must be absent
        assert_eq!(Extractor::get(&carrier, PARENT_SPAN_ID_HEADER), None);
        assert_eq!(Extractor::get(&carrier, SAMPLED_HEADER), Some("1"));
    }

    #[test]
    fn inject_sub_span_carries_parent() {
        let tracer = Tracer::default();
        let mut ctx = tracer.new_context();
        ctx.start_root_span("root");
        let root_span_id = ctx.current_span().map(|s| s.span_id());

        let mut carrier: HashMap<String, String> = HashMap::new();
        let child = ctx.start_sub_span("child", SpanPurpose::Client);
        TraceHeaderCodec::new().inject(child, &mut carrier);

        assert_eq!(
            Extractor::get(&carrier, PARENT_SPAN_ID_HEADER),
            root_span_id.map(|id| id.to_string()).as_deref()
        );
    }

    #[test]
    fn decode_round_trip() {
        let tracer = Tracer::default();
        let mut ctx = tracer.new_context();
        let mut carrier: HashMap<String, String> = HashMap::new();

        let codec = TraceHeaderCodec::new();
        let span = ctx.start_root_span("root");
        codec.inject(span, &mut carrier);

        let seed = codec.decode(&carrier).expect("valid context");
        assert_eq!(seed.trace_id, span.trace_id());
        assert_eq!(seed.parent_span_id, span.span_id());
        assert!(seed.sampleable);
    }

    #[test]
    fn decode_minimal_headers() {
        let carrier = carrier(&[
            ("Trace-Id", "4bf92f3577b34da6a3ce929d0e0e4736"),
            ("Span-Id", "00f067aa0ba902b7"),
        ]);

        let seed = TraceHeaderCodec::new().decode(&carrier).expect("valid");
        assert_eq!(
            seed.trace_id,
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
        assert_eq!(seed.parent_span_id, SpanId::from_hex("00f067aa0ba902b7").unwrap());
        assert!(seed.sampleable, "missing Sampled defaults to sampleable");
    }

    #[test]
    fn decode_sampled_flag_forms() {
        for (raw, expected) in [
            ("1", Some(true)),
            ("0", Some(false)),
            ("true", Some(true)),
            ("TRUE", Some(true)),
            ("false", Some(false)),
            ("False", Some(false)),
            ("yes", None),
            ("2", None),
            ("", None),
        ] {
            let carrier = carrier(&[
                ("Trace-Id", "4bf92f3577b34da6a3ce929d0e0e4736"),
                ("Span-Id", "00f067aa0ba902b7"),
                ("Sampled", raw),
            ]);
            let seed = TraceHeaderCodec::new().decode(&carrier);
            assert_eq!(seed.map(|s| s.sampleable), expected, "Sampled: {:?}", raw);
        }
    }

    #[rustfmt::skip]
    fn invalid_header_sets() -> Vec<(Vec<(&'static str, &'static str)>, &'static str)> {
        vec![
            (vec![("Span-Id", "00f067aa0ba902b7")], "missing trace id"),
            (vec![("Trace-Id", "4bf92f3577b34da6a3ce929d0e0e4736")], "missing span id"),
            (vec![("Trace-Id", ""), ("Span-Id", "00f067aa0ba902b7")], "empty trace id"),
            (vec![("Trace-Id", "not-hex-at-all"), ("Span-Id", "00f067aa0ba902b7")], "bogus trace id"),
            (vec![("Trace-Id", "4bf92f3577b34da6a3ce929d0e0e4736"), ("Span-Id", "xyz")], "bogus span id"),
            (vec![("Trace-Id", "00000000000000000000000000000000"), ("Span-Id", "00f067aa0ba902b7")], "zero trace id"),
            (vec![("Trace-Id", "4bf92f3577b34da6a3ce929d0e0e4736"), ("Span-Id", "0000000000000000")], "zero span id"),
            (vec![("Trace-Id", "4bf92f3577b34da6a3ce929d0e0e47361"), ("Span-Id", "00f067aa0ba902b7")], "oversized trace id"),
            (vec![("Trace-Id", "4bf92f3577b34da6a3ce929d0e0e4736"), ("Span-Id", "00f067aa0ba902b7"), ("Parent-Span-Id", "mangled")], "malformed parent span id"),
        ]
    }

    #[test]
    fn decode_rejects_malformed_input_wholesale() {
        let codec = TraceHeaderCodec::new();
        for (entries, reason) in invalid_header_sets() {
            let carrier = carrier(&entries);
            assert!(codec.decode(&carrier).is_none(), "{reason}");
        }
    }

    #[test]
    fn decode_ignores_unknown_headers() {
        let carrier = carrier(&[
            ("Trace-Id", "4bf92f3577b34da6a3ce929d0e0e4736"),
            ("Span-Id", "00f067aa0ba902b7"),
            ("Sampled", "0"),
            ("X-Request-Id", "abc123"),
            ("Content-Type", "application/json"),
        ]);

        let seed = TraceHeaderCodec::new().decode(&carrier).expect("valid");
        assert!(!seed.sampleable);
    }
}

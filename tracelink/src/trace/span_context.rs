use std::fmt;
use std::hash::Hash;
use thiserror::Error;

use crate::trace::span::Span;

/// Error returned when parsing trace identifiers from their wire form.
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TraceError {
    /// The value is not a 1..=32 character hex string.
    #[error("{0:?} is not a valid trace id")]
    InvalidTraceId(String),

    /// The value is not a 1..=16 character hex string.
    #[error("{0:?} is not a valid span id")]
    InvalidSpanId(String),
}

fn is_hex(value: &str, max_len: usize) -> bool {
    !value.is_empty() && value.len() <= max_len && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A 16-byte value which identifies a given trace.
///
/// The id is valid if it contains at least one non-zero byte.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// Invalid trace id
    pub const INVALID: TraceId = TraceId(0);

    /// Create a trace id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(u128::from_be_bytes(bytes))
    }

    /// Return the representation of this trace id as a byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a trace id.
    ///
    /// Unlike `u128::from_str_radix` this rejects sign prefixes and
    /// over-long input, since the value arrives off the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracelink::trace::TraceId;
    ///
    /// assert!(TraceId::from_hex("42").is_ok());
    /// assert!(TraceId::from_hex("58406520a006649127e371903a2de979").is_ok());
    ///
    /// assert!(TraceId::from_hex("not_hex").is_err());
    /// assert!(TraceId::from_hex("+42").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, TraceError> {
        if !is_hex(hex, 32) {
            return Err(TraceError::InvalidTraceId(hex.to_owned()));
        }
        u128::from_str_radix(hex, 16)
            .map(TraceId)
            .map_err(|_| TraceError::InvalidTraceId(hex.to_owned()))
    }

    /// Returns `true` if the id contains at least one non-zero byte.
    pub fn is_valid(&self) -> bool {
        *self != TraceId::INVALID
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::LowerHex for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// An 8-byte value which identifies a given span.
///
/// The id is valid if it contains at least one non-zero byte.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// Invalid span id
    pub const INVALID: SpanId = SpanId(0);

    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a span id.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracelink::trace::SpanId;
    ///
    /// assert!(SpanId::from_hex("42").is_ok());
    /// assert!(SpanId::from_hex("58406520a0066491").is_ok());
    ///
    /// assert!(SpanId::from_hex("not_hex").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, TraceError> {
        if !is_hex(hex, 16) {
            return Err(TraceError::InvalidSpanId(hex.to_owned()));
        }
        u64::from_str_radix(hex, 16)
            .map(SpanId)
            .map_err(|_| TraceError::InvalidSpanId(hex.to_owned()))
    }

    /// Returns `true` if the id contains at least one non-zero byte.
    pub fn is_valid(&self) -> bool {
        *self != SpanId::INVALID
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::LowerHex for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Trace identity inherited from a remote caller, typically decoded from
/// inbound request headers.
///
/// Adopting a seed into a [`TraceContext`] makes the next span started in
/// that context a child of the remote span identified by `parent_span_id`,
/// sharing its `trace_id` and sampling decision.
///
/// [`TraceContext`]: crate::trace::TraceContext
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceContextSeed {
    /// Trace id shared by every span of the inherited trace.
    pub trace_id: TraceId,
    /// Id of the remote span that issued the call; parents the next local span.
    pub parent_span_id: SpanId,
    /// Sampling decision propagated unchanged from the remote caller.
    pub sampleable: bool,
}

impl TraceContextSeed {
    /// Construct a seed from its parts.
    pub fn new(trace_id: TraceId, parent_span_id: SpanId, sampleable: bool) -> Self {
        TraceContextSeed {
            trace_id,
            parent_span_id,
            sampleable,
        }
    }

    /// Capture the identity of a local span so it can be handed to another
    /// execution context.
    pub fn from_span(span: &Span) -> Self {
        TraceContextSeed {
            trace_id: span.trace_id(),
            parent_span_id: span.span_id(),
            sampleable: span.sampleable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn trace_id_test_data() -> Vec<(TraceId, &'static str)> {
        vec![
            (TraceId::from(0u128), "00000000000000000000000000000000"),
            (TraceId::from(42u128), "0000000000000000000000000000002a"),
            (TraceId::from(0x5f46_7fe7_bf42_676c_05e2_0ba4_a90e_448e_u128), "5f467fe7bf42676c05e20ba4a90e448e"),
        ]
    }

    #[rustfmt::skip]
    fn span_id_test_data() -> Vec<(SpanId, &'static str)> {
        vec![
            (SpanId::from(0u64), "0000000000000000"),
            (SpanId::from(42u64), "000000000000002a"),
            (SpanId::from(0x4c72_1bf3_3e3c_af8f_u64), "4c721bf33e3caf8f"),
        ]
    }

    #[test]
    fn trace_id_round_trip() {
        for (id, hex) in trace_id_test_data() {
            assert_eq!(format!("{}", id), hex);
            assert_eq!(format!("{:032x}", id), hex);
            assert_eq!(TraceId::from_hex(hex).unwrap(), id);
        }
    }

    #[test]
    fn span_id_round_trip() {
        for (id, hex) in span_id_test_data() {
            assert_eq!(format!("{}", id), hex);
            assert_eq!(format!("{:016x}", id), hex);
            assert_eq!(SpanId::from_hex(hex).unwrap(), id);
        }
    }

    #[test]
    fn from_hex_rejects_garbage() {
        for bad in ["", "not_hex", "+42", "-42", " 42", "0x42"] {
            assert!(TraceId::from_hex(bad).is_err(), "trace id {:?}", bad);
            assert!(SpanId::from_hex(bad).is_err(), "span id {:?}", bad);
        }
        // one nibble too long for each width
        assert!(TraceId::from_hex(&"a".repeat(33)).is_err());
        assert!(SpanId::from_hex(&"a".repeat(17)).is_err());
    }

    #[test]
    fn zero_ids_are_invalid() {
        assert!(!TraceId::INVALID.is_valid());
        assert!(!SpanId::INVALID.is_valid());
        assert!(TraceId::from(1u128).is_valid());
        assert!(SpanId::from(1u64).is_valid());
    }
}

//! HTTP instrumentation for [`tracelink`]: header carriers over
//! [`http::HeaderMap`], the pluggable transport seam, and the outbound call
//! interceptor that creates, propagates, tags, and completes a CLIENT span
//! around each request.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tracelink::trace::Tracer;
//! use tracelink_http::{Bytes, HyperTransport, Request, TracedClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), tracelink_http::HttpError> {
//! let tracer = Tracer::default();
//! let client = TracedClient::builder(HyperTransport::new(Duration::from_secs(10))).build();
//!
//! let mut ctx = tracer.new_context();
//! ctx.start_root_span("checkout");
//!
//! let request = Request::builder()
//!     .uri("http://inventory.internal/reserve")
//!     .body(Bytes::new())?;
//! let _response = client.execute(&mut ctx, request).await?;
//!
//! let _ = ctx.complete_current_span();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

#[doc(no_inline)]
pub use bytes::Bytes;
#[doc(no_inline)]
pub use http::{Request, Response};

use tracelink::propagation::{Extractor, Injector, TraceHeaderCodec};
use tracelink::trace::{Span, TraceContextSeed};

mod client;
mod tags;
mod transport;

pub use client::{TracedClient, TracedClientBuilder};
pub use tags::HttpClientTagAdapter;
pub use transport::{HttpError, HttpTransport, HyperTransport};

/// Helper for injecting trace headers into HTTP requests.
pub struct HeaderInjector<'a>(pub &'a mut http::HeaderMap);

impl Injector for HeaderInjector<'_> {
    /// Set a key and value in the HeaderMap. Does nothing if the key or
    /// value are not valid inputs.
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = http::header::HeaderName::from_bytes(key.as_bytes()) {
            if let Ok(val) = http::header::HeaderValue::from_str(&value) {
                self.0.insert(name, val);
            }
        }
    }
}

/// Helper for extracting trace headers from HTTP requests.
pub struct HeaderExtractor<'a>(pub &'a http::HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    /// Get a value for a key from the HeaderMap. If the value is not valid
    /// ASCII, returns None.
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    /// Collect all the keys from the HeaderMap.
    fn keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .map(|value| value.as_str())
            .collect::<Vec<_>>()
    }
}

/// Write `span`'s trace identity into `headers` under the fixed trace
/// header names.
pub fn inject_span_headers(span: &Span, headers: &mut http::HeaderMap) {
    TraceHeaderCodec::new().inject(span, &mut HeaderInjector(headers));
}

/// Decode an inherited trace identity from `headers`, if a valid one is
/// present. Malformed or missing trace headers yield `None`, and the caller
/// then starts a fresh trace.
pub fn extract_context_seed(headers: &http::HeaderMap) -> Option<TraceContextSeed> {
    TraceHeaderCodec::new().decode(&HeaderExtractor(headers))
}

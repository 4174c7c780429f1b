//! The outbound call interceptor.
//!
//! [`TracedClient`] wraps a transport and composes the tracing seams
//! around each call: it starts a CLIENT subspan under whatever span is
//! current, injects the trace headers, delegates to the transport, tags
//! the subspan from the outcome, and completes it. Each call moves through
//! one state sequence:
//!
//! ```text
//! IDLE -> SPAN_STARTED -> HEADERS_INJECTED -> CALL_IN_FLIGHT -> SPAN_COMPLETED
//! ```
//!
//! Completion is guaranteed by a guard held across the transport call: a
//! subspan this client started is completed exactly once whether the call
//! returns, fails, or the future is dropped mid-flight, and a span the
//! client did not start is never completed by it. Transport errors pass
//! through unchanged; tracing is invisible to the application's error
//! handling.

use bytes::Bytes;
use http::{Request, Response};
use tracelink::tags::{HttpTagStrategy, TagAdapter, TagStrategy};
use tracelink::trace::{SpanPurpose, TraceContext};
use tracelink::propagation::TraceHeaderCodec;
use tracelink::tracelink_debug;

use crate::tags::{BytesTagAdapter, HttpClientTagAdapter};
use crate::transport::{HttpError, HttpTransport};
use crate::HeaderInjector;

// Name given to a subspan when the strategy cannot produce one.
const FALLBACK_SPAN_NAME: &str = "http_client_call";

type BytesTagStrategy = dyn TagStrategy<Request<Bytes>, Response<Bytes>>;

/// An instrumented HTTP client wrapping an [`HttpTransport`].
pub struct TracedClient {
    transport: Box<dyn HttpTransport>,
    subspan_enabled: bool,
    tag_strategy: Box<BytesTagStrategy>,
    tag_adapter: Box<BytesTagAdapter>,
}

impl TracedClient {
    /// Create a builder around the given transport. Defaults: subspans
    /// enabled, [`HttpTagStrategy`], [`HttpClientTagAdapter`] with no
    /// route knowledge.
    pub fn builder<T: HttpTransport + 'static>(transport: T) -> TracedClientBuilder {
        TracedClientBuilder {
            transport: Box::new(transport),
            subspan_enabled: true,
            tag_strategy: None,
            tag_adapter: None,
        }
    }

    /// Perform one traced outbound call.
    ///
    /// With subspans enabled a CLIENT span is opened under `ctx`'s current
    /// span (or as a root of a new trace when nothing is current), named
    /// and tagged from the call's outcome, and completed before this
    /// method returns. With subspans disabled only header propagation
    /// happens, from whatever span is already current; no span is
    /// created, tagged, or completed.
    ///
    /// The response or transport error of the underlying call is returned
    /// unchanged.
    pub async fn execute(
        &self,
        ctx: &mut TraceContext,
        mut request: Request<Bytes>,
    ) -> Result<Response<Bytes>, HttpError> {
        let mut guard = if self.subspan_enabled {
            let name = self
                .tag_strategy
                .initial_span_name(&request, self.tag_adapter.as_ref())
                .unwrap_or_else(|| FALLBACK_SPAN_NAME.to_owned());
            ctx.start_sub_span(name, SpanPurpose::Client);
            CompletionGuard::new(ctx, true)
        } else {
            CompletionGuard::new(ctx, false)
        };

        // Encode whichever span is now current: the fresh subspan, or an
        // inherited one, or nothing at all.
        if let Some(span) = guard.context().current_span() {
            tracelink_debug!(
                name: "TracedClient.InjectHeaders",
                trace_id = format!("{}", span.trace_id())
            );
            TraceHeaderCodec::new().inject(span, &mut HeaderInjector(request.headers_mut()));
        }

        let result = self.transport.call(&mut request).await;

        if guard.is_armed() {
            if let Some(span) = guard.context().current_span_mut() {
                self.tag_strategy.handle_response_tagging(
                    span,
                    &request,
                    result.as_ref().ok(),
                    result
                        .as_ref()
                        .err()
                        .map(|error| &**error as &(dyn std::error::Error + Send + Sync)),
                    self.tag_adapter.as_ref(),
                );
            }
            guard.complete();
        }

        result
    }
}

impl std::fmt::Debug for TracedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracedClient")
            .field("transport", &self.transport)
            .field("subspan_enabled", &self.subspan_enabled)
            .finish()
    }
}

/// Configures and builds a [`TracedClient`].
pub struct TracedClientBuilder {
    transport: Box<dyn HttpTransport>,
    subspan_enabled: bool,
    tag_strategy: Option<Box<BytesTagStrategy>>,
    tag_adapter: Option<Box<BytesTagAdapter>>,
}

impl TracedClientBuilder {
    /// Whether each call should be wrapped in its own CLIENT subspan.
    /// Defaults to `true`; with `false` the client only propagates the
    /// ambient span's headers.
    pub fn with_subspan_enabled(mut self, enabled: bool) -> Self {
        self.subspan_enabled = enabled;
        self
    }

    /// Replace the default [`HttpTagStrategy`].
    pub fn with_tag_strategy<S>(mut self, strategy: S) -> Self
    where
        S: TagStrategy<Request<Bytes>, Response<Bytes>> + 'static,
    {
        self.tag_strategy = Some(Box::new(strategy));
        self
    }

    /// Replace the default [`HttpClientTagAdapter`], e.g. with one that
    /// knows the route template for this call site.
    pub fn with_tag_adapter<A>(mut self, adapter: A) -> Self
    where
        A: TagAdapter<Request<Bytes>, Response<Bytes>> + 'static,
    {
        self.tag_adapter = Some(Box::new(adapter));
        self
    }

    /// Build the configured client.
    pub fn build(self) -> TracedClient {
        TracedClient {
            transport: self.transport,
            subspan_enabled: self.subspan_enabled,
            tag_strategy: self
                .tag_strategy
                .unwrap_or_else(|| Box::new(HttpTagStrategy::new())),
            tag_adapter: self
                .tag_adapter
                .unwrap_or_else(|| Box::new(HttpClientTagAdapter::new())),
        }
    }
}

/// Completes the subspan on every exit path.
///
/// Armed only when `execute` started a subspan; dropping an armed guard
/// (early return, panic, or the call future being dropped mid-flight)
/// completes the current span so a started subspan can never leak. A
/// disarmed guard never touches the stack.
struct CompletionGuard<'a> {
    ctx: &'a mut TraceContext,
    armed: bool,
}

impl<'a> CompletionGuard<'a> {
    fn new(ctx: &'a mut TraceContext, armed: bool) -> Self {
        CompletionGuard { ctx, armed }
    }

    fn is_armed(&self) -> bool {
        self.armed
    }

    fn context(&mut self) -> &mut TraceContext {
        self.ctx
    }

    fn complete(mut self) {
        if self.armed {
            self.armed = false;
            let _ = self.ctx.complete_current_span();
        }
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.armed = false;
            let _ = self.ctx.complete_current_span();
        }
    }
}

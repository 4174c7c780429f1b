//! Tag adapter for `http`-crate request/response types.

use bytes::Bytes;
use http::{Request, Response};
use tracelink::tags::TagAdapter;

/// The `span.handler` value identifying spans produced by this crate's
/// client instrumentation.
pub(crate) const SPAN_HANDLER_VALUE: &str = "tracelink.httpclient";

/// [`TagAdapter`] over [`http::Request`] / [`http::Response`].
///
/// The generic adapter cannot know a service's route templates, so by
/// default `http.route` is left unset and spans are named after the
/// literal path. Call sites that do know the template supply it with
/// [`with_route_template`], or replace the adapter wholesale with their
/// own [`TagAdapter`] impl.
///
/// [`with_route_template`]: HttpClientTagAdapter::with_route_template
#[derive(Clone, Debug, Default)]
pub struct HttpClientTagAdapter {
    route_template: Option<String>,
}

impl HttpClientTagAdapter {
    /// Create an adapter with no route knowledge.
    pub fn new() -> Self {
        HttpClientTagAdapter::default()
    }

    /// Create an adapter that reports `route` as the route template for
    /// every request it sees.
    pub fn with_route_template(route: impl Into<String>) -> Self {
        HttpClientTagAdapter {
            route_template: Some(route.into()),
        }
    }
}

impl<B> TagAdapter<Request<B>, Response<B>> for HttpClientTagAdapter
where
    B: Send + Sync,
{
    fn http_method(&self, request: &Request<B>) -> Option<String> {
        Some(request.method().as_str().to_owned())
    }

    fn request_path(&self, request: &Request<B>) -> Option<String> {
        Some(request.uri().path().to_owned())
    }

    fn request_url(&self, request: &Request<B>) -> Option<String> {
        Some(request.uri().to_string())
    }

    fn route(&self, _request: &Request<B>, _response: Option<&Response<B>>) -> Option<String> {
        self.route_template.clone()
    }

    fn status_code(&self, response: &Response<B>) -> Option<u16> {
        Some(response.status().as_u16())
    }

    fn span_handler(&self) -> &str {
        SPAN_HANDLER_VALUE
    }
}

// The interceptor works with `Bytes` bodies; pin the common case down for
// type inference at `Box<dyn TagAdapter<_, _>>` construction sites.
pub(crate) type BytesTagAdapter = dyn TagAdapter<Request<Bytes>, Response<Bytes>>;

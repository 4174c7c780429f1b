//! # Span tagging
//!
//! Decouples *what* metadata describes an HTTP call from *how* to extract
//! it from a specific transport's request/response types.
//!
//! A [`TagAdapter`] knows how to pull method, path, URL, route, and status
//! code out of one transport's types; a [`TagStrategy`] decides what the
//! extracted values mean for the span: its final name and tags. Both are
//! plain values injected where instrumentation is constructed, so a call
//! site can swap in an adapter that knows things the generic one cannot
//! (a pre-resolved route template, say) without touching the strategy or
//! the instrumentation.

use crate::trace::Span;

/// Tag key for the HTTP request method, e.g. `"GET"`.
pub const HTTP_METHOD: &str = "http.method";
/// Tag key for the literal request path.
pub const HTTP_PATH: &str = "http.path";
/// Tag key for the full request URL.
pub const HTTP_URL: &str = "http.url";
/// Tag key for the route template, which may differ from the literal path.
pub const HTTP_ROUTE: &str = "http.route";
/// Tag key for the response status code, as a decimal string.
pub const HTTP_STATUS_CODE: &str = "http.status_code";
/// Tag key identifying the instrumentation that produced the span.
pub const SPAN_HANDLER: &str = "span.handler";
/// Tag key recording a transport error's message.
pub const ERROR: &str = "error";

/// Extracts semantic metadata from one transport's request/response pair.
///
/// Every accessor returns `Option` so adapters can be honest about what a
/// given transport cannot know; absent values are simply not tagged.
pub trait TagAdapter<Req, Res>: Send + Sync {
    /// The request's HTTP method.
    fn http_method(&self, request: &Req) -> Option<String>;

    /// The literal path of the request.
    fn request_path(&self, request: &Req) -> Option<String>;

    /// The full URL of the request.
    fn request_url(&self, request: &Req) -> Option<String>;

    /// The route template for the request, e.g. `/users/{id}`. Adapters
    /// that cannot resolve templates return `None` and the literal path is
    /// used for naming instead.
    fn route(&self, request: &Req, response: Option<&Res>) -> Option<String> {
        let _ = (request, response);
        None
    }

    /// The response's status code.
    fn status_code(&self, response: &Res) -> Option<u16>;

    /// Constant identifier naming the instrumentation this adapter belongs
    /// to, recorded under the `span.handler` tag.
    fn span_handler(&self) -> &str;
}

/// Decides a span's final name and tags from extracted call metadata.
pub trait TagStrategy<Req, Res>: Send + Sync {
    /// The name a span should carry when it is opened, before the outcome
    /// of the call is known. Defaults to the HTTP method.
    fn initial_span_name(&self, request: &Req, adapter: &dyn TagAdapter<Req, Res>) -> Option<String> {
        adapter.http_method(request)
    }

    /// Name and tag `span` for a finished call.
    ///
    /// Invoked exactly once per span, at completion time, on success and on
    /// transport failure alike. On failure `response` is `None` and
    /// whatever partial information exists is still recorded.
    fn handle_response_tagging(
        &self,
        span: &mut Span,
        request: &Req,
        response: Option<&Res>,
        error: Option<&(dyn std::error::Error + Send + Sync)>,
        adapter: &dyn TagAdapter<Req, Res>,
    );
}

/// Provided [`TagStrategy`] writing the fixed tag vocabulary and the
/// `"<METHOD> <route-or-path>"` naming convention.
#[derive(Clone, Debug, Default)]
pub struct HttpTagStrategy {
    _private: (),
}

impl HttpTagStrategy {
    /// Create a new `HttpTagStrategy`.
    pub fn new() -> Self {
        HttpTagStrategy::default()
    }
}

impl<Req, Res> TagStrategy<Req, Res> for HttpTagStrategy {
    fn handle_response_tagging(
        &self,
        span: &mut Span,
        request: &Req,
        response: Option<&Res>,
        error: Option<&(dyn std::error::Error + Send + Sync)>,
        adapter: &dyn TagAdapter<Req, Res>,
    ) {
        let method = adapter.http_method(request);
        let path = adapter.request_path(request);
        let route = adapter.route(request, response);

        if let Some(name) = span_name(method.as_deref(), path.as_deref(), route.as_deref()) {
            span.set_name(name);
        }

        if let Some(method) = method {
            span.put_tag(HTTP_METHOD, method);
        }
        if let Some(path) = path {
            span.put_tag(HTTP_PATH, path);
        }
        if let Some(url) = adapter.request_url(request) {
            span.put_tag(HTTP_URL, url);
        }
        if let Some(route) = route {
            span.put_tag(HTTP_ROUTE, route);
        }
        if let Some(status) = response.and_then(|response| adapter.status_code(response)) {
            span.put_tag(HTTP_STATUS_CODE, status.to_string());
        }
        if let Some(error) = error {
            span.put_tag(ERROR, error.to_string());
        }
        span.put_tag(SPAN_HANDLER, adapter.span_handler().to_owned());
    }
}

/// `"<METHOD> <route-or-path>"`, degrading gracefully when pieces are
/// missing. Returns `None` when there is nothing to name the span with.
fn span_name(method: Option<&str>, path: Option<&str>, route: Option<&str>) -> Option<String> {
    match (method, route.or(path)) {
        (Some(method), Some(target)) => Some(format!("{method} {target}")),
        (Some(method), None) => Some(method.to_owned()),
        (None, Some(target)) => Some(target.to_owned()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{SpanPurpose, Tracer};

    struct FakeRequest {
        method: &'static str,
        path: &'static str,
    }

    struct FakeResponse {
        status: u16,
    }

    struct FakeAdapter {
        route: Option<&'static str>,
    }

    impl TagAdapter<FakeRequest, FakeResponse> for FakeAdapter {
        fn http_method(&self, request: &FakeRequest) -> Option<String> {
            Some(request.method.to_owned())
        }

        fn request_path(&self, request: &FakeRequest) -> Option<String> {
            Some(request.path.to_owned())
        }

        fn request_url(&self, request: &FakeRequest) -> Option<String> {
            Some(format!("http://example.test{}", request.path))
        }

        fn route(&self, _request: &FakeRequest, _response: Option<&FakeResponse>) -> Option<String> {
            self.route.map(str::to_owned)
        }

        fn status_code(&self, response: &FakeResponse) -> Option<u16> {
            Some(response.status)
        }

        fn span_handler(&self) -> &str {
            "fake.client"
        }
    }

    fn live_ctx() -> crate::trace::TraceContext {
        let mut ctx = Tracer::default().new_context();
        ctx.start_sub_span("placeholder", SpanPurpose::Client);
        ctx
    }

    #[test]
    fn names_span_from_route_template() {
        let mut ctx = live_ctx();
        let span = ctx.current_span_mut().unwrap();

        let request = FakeRequest {
            method: "GET",
            path: "/users/42",
        };
        let adapter = FakeAdapter {
            route: Some("/users/{id}"),
        };
        HttpTagStrategy::new().handle_response_tagging(
            span,
            &request,
            Some(&FakeResponse { status: 200 }),
            None,
            &adapter,
        );

        assert_eq!(span.name(), "GET /users/{id}");
        assert_eq!(span.tag(HTTP_METHOD), Some("GET"));
        assert_eq!(span.tag(HTTP_PATH), Some("/users/42"));
        assert_eq!(span.tag(HTTP_URL), Some("http://example.test/users/42"));
        assert_eq!(span.tag(HTTP_ROUTE), Some("/users/{id}"));
        assert_eq!(span.tag(HTTP_STATUS_CODE), Some("200"));
        assert_eq!(span.tag(SPAN_HANDLER), Some("fake.client"));
        assert_eq!(span.tag(ERROR), None);
    }

    #[test]
    fn falls_back_to_literal_path_without_route() {
        let mut ctx = live_ctx();
        let span = ctx.current_span_mut().unwrap();

        let request = FakeRequest {
            method: "POST",
            path: "/orders",
        };
        let adapter = FakeAdapter { route: None };
        HttpTagStrategy::new().handle_response_tagging(
            span,
            &request,
            Some(&FakeResponse { status: 201 }),
            None,
            &adapter,
        );

        assert_eq!(span.name(), "POST /orders");
        assert_eq!(span.tag(HTTP_ROUTE), None);
        assert_eq!(span.tag(HTTP_STATUS_CODE), Some("201"));
    }

    #[test]
    fn transport_error_is_tagged_without_status() {
        let mut ctx = live_ctx();
        let span = ctx.current_span_mut().unwrap();

        let request = FakeRequest {
            method: "GET",
            path: "/flaky",
        };
        let adapter = FakeAdapter { route: None };
        let error: Box<dyn std::error::Error + Send + Sync> = "connection reset".into();
        HttpTagStrategy::new().handle_response_tagging(
            span,
            &request,
            None,
            Some(error.as_ref()),
            &adapter,
        );

        assert_eq!(span.name(), "GET /flaky");
        assert_eq!(span.tag(HTTP_STATUS_CODE), None);
        assert_eq!(span.tag(ERROR), Some("connection reset"));
        assert_eq!(span.tag(SPAN_HANDLER), Some("fake.client"));
    }

    #[test]
    fn initial_name_defaults_to_method() {
        let request = FakeRequest {
            method: "PUT",
            path: "/anything",
        };
        let adapter = FakeAdapter { route: None };
        let name = TagStrategy::initial_span_name(&HttpTagStrategy::new(), &request, &adapter);
        assert_eq!(name.as_deref(), Some("PUT"));
    }

    #[test]
    fn span_name_degrades_gracefully() {
        assert_eq!(span_name(Some("GET"), Some("/p"), Some("/r")), Some("GET /r".to_owned()));
        assert_eq!(span_name(Some("GET"), Some("/p"), None), Some("GET /p".to_owned()));
        assert_eq!(span_name(Some("GET"), None, None), Some("GET".to_owned()));
        assert_eq!(span_name(None, Some("/p"), None), Some("/p".to_owned()));
        assert_eq!(span_name(None, None, None), None);
    }
}

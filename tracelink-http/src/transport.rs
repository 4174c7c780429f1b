//! The transport seam.
//!
//! [`HttpTransport`] is the single operation the interceptor delegates to:
//! it receives a mutable outbound request (the trace headers have already
//! been injected into it) and returns a response or a transport error. The
//! request stays owned by the interceptor so the tag strategy can still
//! read it after the call, success or not.
//!
//! A hyper-based transport ships by default; a `reqwest` feature adds an
//! impl for `reqwest::Client`. Neither turns non-2xx responses into
//! errors: a 500 is a response with a status code worth tagging, not a
//! transport failure.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use std::fmt::Debug;

/// Errors raised by a transport while performing a call.
pub type HttpError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A minimal interface for sending one HTTP request.
///
/// Implementations choose their own connection handling, TLS, and retries;
/// none of that is visible here. The call may suspend for as long as the
/// request is in flight.
#[async_trait]
pub trait HttpTransport: Debug + Send + Sync {
    /// Send the request and return the response.
    ///
    /// Returns an error if the server could not be reached or the exchange
    /// could not be completed, e.g. a timeout or loss of connection.
    async fn call(&self, request: &mut Request<Bytes>) -> Result<Response<Bytes>, HttpError>;
}

fn clone_into_body<B: From<Bytes>>(request: &Request<Bytes>) -> Result<Request<B>, HttpError> {
    let mut outbound = Request::builder()
        .method(request.method().clone())
        .uri(request.uri().clone())
        .version(request.version())
        .body(B::from(request.body().clone()))?;
    *outbound.headers_mut() = request.headers().clone();
    Ok(outbound)
}

pub use hyper_transport::HyperTransport;

mod hyper_transport {
    use super::{async_trait, clone_into_body, Bytes, HttpError, HttpTransport, Request, Response};
    use http_body_util::{BodyExt, Full};
    use hyper_util::client::legacy::{
        connect::{Connect, HttpConnector},
        Client,
    };
    use std::time::Duration;
    use tokio::time;
    use tracelink::tracelink_debug;

    /// Default [`HttpTransport`] over hyper's pooled legacy client.
    #[derive(Clone)]
    pub struct HyperTransport<C = HttpConnector>
    where
        C: Connect + Clone + Send + Sync + 'static,
    {
        inner: Client<C, Full<Bytes>>,
        timeout: Duration,
    }

    impl<C> std::fmt::Debug for HyperTransport<C>
    where
        C: Connect + Clone + Send + Sync + 'static,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("HyperTransport")
                .field("inner", &self.inner)
                .field("timeout", &self.timeout)
                .finish()
        }
    }

    impl HyperTransport<HttpConnector> {
        /// Create a transport with the default TCP connector and the given
        /// per-request timeout.
        pub fn new(timeout: Duration) -> Self {
            Self::with_connector(HttpConnector::new(), timeout)
        }
    }

    impl<C> HyperTransport<C>
    where
        C: Connect + Clone + Send + Sync + 'static,
    {
        /// Create a transport over a custom connector.
        pub fn with_connector(connector: C, timeout: Duration) -> Self {
            let inner = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);
            Self { inner, timeout }
        }
    }

    #[async_trait]
    impl<C> HttpTransport for HyperTransport<C>
    where
        C: Connect + Clone + Send + Sync + 'static,
    {
        async fn call(&self, request: &mut Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            tracelink_debug!(name: "HyperTransport.Send");
            let outbound = clone_into_body::<Full<Bytes>>(request)?;
            let mut response = time::timeout(self.timeout, self.inner.request(outbound)).await??;
            let headers = std::mem::take(response.headers_mut());

            let mut http_response = Response::builder()
                .status(response.status())
                .body(response.into_body().collect().await?.to_bytes())?;
            *http_response.headers_mut() = headers;

            Ok(http_response)
        }
    }
}

#[cfg(feature = "reqwest")]
mod reqwest {
    use super::{async_trait, clone_into_body, Bytes, HttpError, HttpTransport, Request, Response};
    use tracelink::tracelink_debug;

    #[async_trait]
    impl HttpTransport for reqwest::Client {
        async fn call(&self, request: &mut Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            tracelink_debug!(name: "ReqwestTransport.Send");
            let outbound = reqwest::Request::try_from(clone_into_body::<Bytes>(request)?)?;
            let mut response = self.execute(outbound).await?;
            let headers = std::mem::take(response.headers_mut());
            let mut http_response = Response::builder()
                .status(response.status())
                .body(response.bytes().await?)?;
            *http_response.headers_mut() = headers;

            Ok(http_response)
        }
    }
}

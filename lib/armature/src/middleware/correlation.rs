//! Correlation-ID middleware.
//!
//! Stamps every outgoing request with the `x-ms-correlation-request-id`
//! header so that all calls from one provider run can be matched up in
//! server-side activity logs.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};
use uuid::Uuid;

use armature_core::{Error, Request, Response, Result};

/// Header carrying the run-scoped correlation ID.
pub const CORRELATION_REQUEST_ID_HEADER: &str = "x-ms-correlation-request-id";

static CORRELATION_REQUEST_ID: OnceLock<String> = OnceLock::new();

/// The process-wide correlation ID.
///
/// Generated lazily on first use and stable for the remainder of the
/// process, so every request in one run shares the same value.
pub fn correlation_request_id() -> &'static str {
    CORRELATION_REQUEST_ID.get_or_init(|| Uuid::new_v4().hyphenated().to_string())
}

/// Layer that stamps requests with the correlation-ID header.
///
/// Idempotent: a request that already carries the header, whatever its
/// value, passes through untouched. Layers can therefore be stacked or
/// re-applied without producing conflicting IDs.
#[derive(Debug, Clone, Default)]
pub struct CorrelationLayer {
    id: Option<Arc<str>>,
}

impl CorrelationLayer {
    /// Layer using the process-wide generated ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer using an operator-supplied fixed ID.
    ///
    /// Lets calls be correlated across separate runs.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(Arc::from(id.into())),
        }
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = Correlation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Correlation {
            inner,
            id: self.id.clone(),
        }
    }
}

/// Service that stamps requests with the correlation-ID header.
#[derive(Debug, Clone)]
pub struct Correlation<S> {
    inner: S,
    id: Option<Arc<str>>,
}

fn has_correlation_header(request: &Request<Bytes>) -> bool {
    request
        .headers()
        .keys()
        .any(|name| name.eq_ignore_ascii_case(CORRELATION_REQUEST_ID_HEADER))
}

impl<S> Service<Request<Bytes>> for Correlation<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Bytes>) -> Self::Future {
        if !has_correlation_header(&request) {
            let id = self
                .id
                .clone()
                .unwrap_or_else(|| Arc::from(correlation_request_id()));
            request
                .headers_mut()
                .insert(CORRELATION_REQUEST_ID_HEADER.to_string(), id.to_string());
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(request).await })
    }
}

#[cfg(test)]
mod tests {
    use armature_core::Method;
    use url::Url;

    use super::*;

    fn request() -> Request<Bytes> {
        let url = Url::parse("https://management.example.com/servers/db1").expect("url");
        Request::builder(Method::Get, url).build()
    }

    #[test]
    fn id_is_stable_across_calls() {
        assert_eq!(correlation_request_id(), correlation_request_id());
        assert!(!correlation_request_id().is_empty());
    }

    #[test]
    fn detects_header_case_insensitively() {
        let mut req = request();
        req.headers_mut().insert(
            "X-MS-Correlation-Request-Id".to_string(),
            "preset".to_string(),
        );
        assert!(has_correlation_header(&req));
    }

    #[test]
    fn missing_header_detected() {
        assert!(!has_correlation_header(&request()));
    }
}

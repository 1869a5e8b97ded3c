//! Request and response diagnostics middleware.
//!
//! Emits a full dump of every outgoing request and incoming response at
//! debug level through `tracing`. The `Authorization` header is redacted
//! before anything is written out. Diagnostics are strictly observational:
//! a body that cannot be rendered degrades to a summary line, and no
//! diagnostic path can fail the request itself.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::debug;

use armature_core::{Error, Request, Response, Result};

/// Placeholder written in place of credential header values.
const REDACTED: &str = "*****";

/// Layer that logs request and response dumps at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticsLayer;

impl DiagnosticsLayer {
    /// Create a new diagnostics layer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for DiagnosticsLayer {
    type Service = Diagnostics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Diagnostics { inner }
    }
}

/// Service that logs request and response dumps.
#[derive(Debug, Clone)]
pub struct Diagnostics<S> {
    inner: S,
}

impl<S> Diagnostics<S> {
    /// Wrap the given service.
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

/// Render headers with credential values masked.
fn redact_headers(headers: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut rendered: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case("authorization") {
                (name.clone(), REDACTED.to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect();
    rendered.sort();
    rendered
}

/// Render a body for logging, or a summary when it is not printable text.
fn render_body(body: &Bytes) -> String {
    if body.is_empty() {
        return String::new();
    }
    std::str::from_utf8(body).map_or_else(
        |_| format!("<{} bytes of non-text body>", body.len()),
        ToString::to_string,
    )
}

fn dump_request(request: &Request<Bytes>) {
    let headers = redact_headers(request.headers());
    let body = request.body().map(render_body).unwrap_or_default();
    debug!(
        method = %request.method(),
        url = %request.url(),
        ?headers,
        %body,
        "outgoing request"
    );
}

fn dump_response(url: &url::Url, response: &Response<Bytes>) {
    let headers = redact_headers(response.headers());
    let body = render_body(response.body());
    debug!(
        status = response.status(),
        %url,
        ?headers,
        %body,
        "incoming response"
    );
}

impl<S> Service<Request<Bytes>> for Diagnostics<S>
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

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        dump_request(&request);
        let url = request.url().clone();

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let result = inner.call(request).await;
            match &result {
                Ok(response) => dump_response(&url, response),
                Err(err) => debug!(%url, error = %err, "request errored"),
            }
            result
        })
    }
}

//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, query
//! parameters, and bodies.
//!
//! # Example
//!
//! ```
//! use armature_core::{Request, Method};
//! use bytes::Bytes;
//!
//! let url = "https://management.example.com/subscriptions/sub-1/providers"
//!     .parse()
//!     .unwrap();
//! let request = Request::<Bytes>::builder(Method::Get, url)
//!     .header("Accept", "application/json")
//!     .query("api-version", "2023-06-01")
//!     .build();
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::Method;

/// An HTTP request with method, URL, headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HashMap<String, String>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }

    /// Reassemble a request from its parts.
    ///
    /// Middlewares that need to rewrite more than the header map take a
    /// request apart with [`Request::into_parts`] and rebuild it here.
    #[must_use]
    pub fn from_parts(
        method: Method,
        url: url::Url,
        headers: HashMap<String, String>,
        body: Option<B>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl RequestBuilder<Bytes> {
    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_basic() {
        let url = url::Url::parse("https://management.example.com/servers").expect("valid URL");
        let request = Request::<Bytes>::builder(Method::Get, url.clone())
            .header("Accept", "application/json")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://management.example.com/servers");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert!(request.body().is_none());
    }

    #[test]
    fn request_builder_with_query() {
        let url = url::Url::parse("https://management.example.com/servers").expect("valid URL");
        let request = Request::<Bytes>::builder(Method::Get, url)
            .query("api-version", "2023-06-01")
            .build();

        assert_eq!(
            request.url().as_str(),
            "https://management.example.com/servers?api-version=2023-06-01"
        );
    }

    #[test]
    fn request_builder_json() {
        #[derive(serde::Serialize)]
        struct Params {
            failover: bool,
        }

        let url = url::Url::parse("https://management.example.com/servers/restart")
            .expect("valid URL");
        let request = Request::builder(Method::Post, url)
            .json(&Params { failover: true })
            .expect("json")
            .build();

        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert!(request.body().is_some());
    }

    #[test]
    fn request_round_trips_through_parts() {
        let url = url::Url::parse("https://management.example.com/servers").expect("valid URL");
        let request = Request::builder(Method::Put, url)
            .header("Accept", "application/json")
            .body(Bytes::from("{}"))
            .build();

        let (method, url, headers, body) = request.into_parts();
        let rebuilt = Request::from_parts(method, url, headers, body);

        assert_eq!(rebuilt.method(), Method::Put);
        assert_eq!(rebuilt.header("Accept"), Some("application/json"));
        assert_eq!(rebuilt.body(), Some(&Bytes::from("{}")));
    }
}

//! HTTP client traits.
//!
//! [`HttpClient`] is the seam between configured clients and whatever
//! executes the request: the real transport in production, a scripted
//! double in tests.

use std::future::Future;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// This trait defines the interface for executing HTTP requests.
/// Implementations should be async-first and support connection pooling.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - Invalid response
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

/// Extension trait for [`HttpClient`] with convenience methods.
pub trait HttpClientExt: HttpClient {
    /// Execute a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get(&self, url: &str) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        async move {
            let url = url::Url::parse(url)?;
            let request = Request::builder(crate::Method::Get, url).build();
            self.execute(request).await
        }
    }

    /// Execute a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the request fails.
    fn post_json<T: serde::Serialize + Send + Sync>(
        &self,
        url: &str,
        body: &T,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        async move {
            let url = url::Url::parse(url)?;
            let request = Request::builder(crate::Method::Post, url)
                .json(body)?
                .build();
            self.execute(request).await
        }
    }

    /// Execute a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn delete(&self, url: &str) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        async move {
            let url = url::Url::parse(url)?;
            let request = Request::builder(crate::Method::Delete, url).build();
            self.execute(request).await
        }
    }
}

// Blanket implementation for all HttpClient implementors
impl<T: HttpClient> HttpClientExt for T {}

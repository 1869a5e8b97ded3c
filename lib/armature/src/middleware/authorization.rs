//! Authorization middleware.
//!
//! Fetches a bearer token from an [`Authorizer`] and installs it as the
//! `Authorization` header on every outgoing request. This is always the
//! outermost layer of a configured client, so the token is present before
//! diagnostics or any other middleware observe the request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};

use armature_core::{Error, Request, Response, Result};

use crate::auth::Authorizer;

/// Layer that attaches credentials from an [`Authorizer`].
#[derive(Clone)]
pub struct AuthorizationLayer {
    authorizer: Arc<dyn Authorizer>,
}

impl std::fmt::Debug for AuthorizationLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationLayer").finish_non_exhaustive()
    }
}

impl AuthorizationLayer {
    /// Create a layer backed by the given credential provider.
    #[must_use]
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }
}

impl<S> Layer<S> for AuthorizationLayer {
    type Service = Authorization<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Authorization {
            inner,
            authorizer: Arc::clone(&self.authorizer),
        }
    }
}

/// Service that attaches a bearer credential to requests.
#[derive(Clone)]
pub struct Authorization<S> {
    inner: S,
    authorizer: Arc<dyn Authorizer>,
}

impl<S> Service<Request<Bytes>> for Authorization<S>
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
        let authorizer = Arc::clone(&self.authorizer);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // a request that cannot be credentialed must not go out
            let token = authorizer.token().await?;
            request
                .headers_mut()
                .insert("Authorization".to_string(), format!("Bearer {token}"));
            inner.call(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenAuthorizer;

    #[test]
    fn layer_is_clone_and_debug() {
        let layer = AuthorizationLayer::new(Arc::new(StaticTokenAuthorizer::new("tok")));
        let _cloned = layer.clone();
        assert!(format!("{layer:?}").contains("AuthorizationLayer"));
    }
}

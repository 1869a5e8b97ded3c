//! Credential providers.
//!
//! An [`Authorizer`] produces the bearer credential for calls to one
//! service audience. The provider root constructs one per audience, bundles
//! them into [`Authorizers`], and shares that bundle read-only with every
//! per-service client constructor.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use armature_core::Result;
use url::Url;

/// Boxed future returned by [`Authorizer::token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Produces the credential material for one service audience.
///
/// Implementations are expected to cache and refresh tokens internally;
/// `token` is called once per outbound request.
pub trait Authorizer: Send + Sync {
    /// The bearer token value for the next request.
    fn token(&self) -> TokenFuture<'_>;
}

/// Authorizer backed by a fixed token.
///
/// Used in tests and for tokens sourced externally (CLI login, workload
/// identity files) where refresh happens out of band.
#[derive(Debug, Clone)]
pub struct StaticTokenAuthorizer {
    token: Arc<str>,
}

impl StaticTokenAuthorizer {
    /// Create an authorizer that always yields the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }
}

impl Authorizer for StaticTokenAuthorizer {
    fn token(&self) -> TokenFuture<'_> {
        let token = Arc::clone(&self.token);
        Box::pin(async move { Ok(token.to_string()) })
    }
}

/// Function slot resolving an authorizer for an arbitrary endpoint.
pub type EndpointAuthorizerFn =
    dyn Fn(&Url) -> Result<Arc<dyn Authorizer>> + Send + Sync;

/// The closed set of credential providers, one per audience.
///
/// Constructed once by the provider root; clones share the same underlying
/// providers. Data-plane services with per-instance endpoints (key vaults,
/// storage accounts in other clouds) go through [`Authorizers::for_endpoint`].
#[derive(Clone)]
pub struct Authorizers {
    /// Management-plane (resource manager) audience.
    pub resource_manager: Arc<dyn Authorizer>,
    /// Storage data-plane audience.
    pub storage: Arc<dyn Authorizer>,
    /// Key-vault data-plane audience.
    pub key_vault: Arc<dyn Authorizer>,
    endpoint_fn: Arc<EndpointAuthorizerFn>,
}

impl std::fmt::Debug for Authorizers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizers").finish_non_exhaustive()
    }
}

impl Authorizers {
    /// Bundle per-audience providers together with an endpoint resolver.
    pub fn new(
        resource_manager: Arc<dyn Authorizer>,
        storage: Arc<dyn Authorizer>,
        key_vault: Arc<dyn Authorizer>,
        endpoint_fn: impl Fn(&Url) -> Result<Arc<dyn Authorizer>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            resource_manager,
            storage,
            key_vault,
            endpoint_fn: Arc::new(endpoint_fn),
        }
    }

    /// Bundle where every audience resolves to the same provider.
    ///
    /// Suitable for tests and for single-audience deployments.
    pub fn uniform(authorizer: Arc<dyn Authorizer>) -> Self {
        let endpoint_authorizer = Arc::clone(&authorizer);
        Self::new(
            Arc::clone(&authorizer),
            Arc::clone(&authorizer),
            authorizer,
            move |_| Ok(Arc::clone(&endpoint_authorizer)),
        )
    }

    /// Resolve an authorizer for an arbitrary audience endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when no credential can be produced for the
    /// endpoint's audience.
    pub fn for_endpoint(&self, endpoint: &Url) -> Result<Arc<dyn Authorizer>> {
        (self.endpoint_fn)(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_authorizer_yields_token() {
        let authorizer = StaticTokenAuthorizer::new("tok-123");
        let token = authorizer.token().await.expect("token");
        assert_eq!(token, "tok-123");
    }

    #[tokio::test]
    async fn uniform_bundle_shares_one_provider() {
        let bundle = Authorizers::uniform(Arc::new(StaticTokenAuthorizer::new("shared")));

        let rm = bundle.resource_manager.token().await.expect("token");
        let storage = bundle.storage.token().await.expect("token");
        assert_eq!(rm, storage);

        let endpoint = Url::parse("https://vault.example.net/").expect("url");
        let by_endpoint = bundle.for_endpoint(&endpoint).expect("resolved");
        assert_eq!(by_endpoint.token().await.expect("token"), "shared");
    }
}

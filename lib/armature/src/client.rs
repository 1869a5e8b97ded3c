//! Client handles and the configured request pipeline.
//!
//! A per-service constructor creates a [`ModernClient`] or a
//! [`LegacyClient`], hands it to
//! [`ClientOptions::configure`](crate::ClientOptions::configure) (or the
//! legacy variant) to have credentials, user agent, and middleware
//! installed, then calls [`build`](ModernClient::build) to obtain the
//! [`ConfiguredClient`] that actually issues requests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tower::Layer;
use tower::retry::RetryLayer;
use tower::util::BoxCloneService;
use tower_service::Service;

use armature_core::{Error, HttpClient, Request, Response, Result};
use url::Url;

use crate::auth::Authorizer;
use crate::middleware::{AuthorizationLayer, RetryPolicy};
use crate::transport::Transport;

/// Type-erased service for middleware composition.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future type returned by the configured pipeline.
pub type ServiceFuture =
    std::pin::Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Thread-safe wrapper for [`BoxedService`].
///
/// The Mutex makes the service Sync, which [`HttpClient`] requires.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request<Bytes>) -> ServiceFuture {
        // lock, clone the service, release the lock immediately
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

fn parse_endpoint(endpoint: &str, service_name: &str) -> Result<Url> {
    Url::parse(endpoint).map_err(|source| Error::configuration(service_name, source))
}

/// Client handle for services on the current SDK generation.
///
/// Created empty by the per-service constructor; the configuration layer
/// fills in the authorizer, user agent, and middleware before `build`.
#[derive(Clone, Default)]
pub struct ModernClient {
    base_uri: Option<Url>,
    service_name: String,
    user_agent: String,
    authorizer: Option<Arc<dyn Authorizer>>,
    layers: Vec<LayerFn>,
    sender: Option<Transport>,
}

impl std::fmt::Debug for ModernClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModernClient")
            .field("service_name", &self.service_name)
            .field("base_uri", &self.base_uri)
            .field("user_agent", &self.user_agent)
            .field("layers_count", &self.layers.len())
            .finish_non_exhaustive()
    }
}

impl ModernClient {
    /// Create a handle for the named service at the given endpoint.
    ///
    /// # Errors
    ///
    /// Fails only when the endpoint is not a valid URL; the error carries
    /// the service name.
    pub fn new(endpoint: &str, service_name: impl Into<String>) -> Result<Self> {
        let service_name = service_name.into();
        let base_uri = parse_endpoint(endpoint, &service_name)?;
        Ok(Self {
            base_uri: Some(base_uri),
            service_name,
            ..Self::default()
        })
    }

    /// The service this handle was created for.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The base URI requests are issued against.
    #[must_use]
    pub const fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    /// The user agent installed by configuration, empty until then.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Replace the user agent.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    /// Install the credential provider for this client's audience.
    pub fn set_authorizer(&mut self, authorizer: Arc<dyn Authorizer>) {
        self.authorizer = Some(authorizer);
    }

    /// Whether an authorizer has been installed.
    #[must_use]
    pub const fn has_authorizer(&self) -> bool {
        self.authorizer.is_some()
    }

    /// Replace the transport used by `build`.
    pub fn set_sender(&mut self, sender: Transport) {
        self.sender = Some(sender);
    }

    /// Append a middleware layer.
    ///
    /// Layers run in append order: the first appended is the first to see
    /// each request, after authorization.
    pub fn append_layer<L>(&mut self, layer: L)
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
    }

    /// Number of appended middleware layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Compose the pipeline and return the ready-to-use client.
    #[must_use]
    pub fn build(self) -> ConfiguredClient {
        let transport = self.sender.unwrap_or_default();
        let service = compose(
            BoxCloneService::new(transport),
            &self.layers,
            self.authorizer,
            None,
        );
        ConfiguredClient {
            service: SyncService::new(service),
            user_agent: self.user_agent,
        }
    }
}

/// Client handle for services still on the previous SDK generation.
///
/// Differs from [`ModernClient`] in carrying a retry duration, a
/// provider-registration skip flag, and a shared sender installed by the
/// legacy configuration path.
#[derive(Clone)]
pub struct LegacyClient {
    inner: ModernClient,
    retry_duration: Option<Duration>,
    max_retries: u32,
    skip_provider_registration: bool,
}

impl std::fmt::Debug for LegacyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyClient")
            .field("inner", &self.inner)
            .field("retry_duration", &self.retry_duration)
            .field(
                "skip_provider_registration",
                &self.skip_provider_registration,
            )
            .finish()
    }
}

impl LegacyClient {
    /// Default attempt budget when a retry duration is installed.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Create a handle for the named service at the given endpoint.
    ///
    /// # Errors
    ///
    /// Fails only when the endpoint is not a valid URL; the error carries
    /// the service name.
    pub fn new(endpoint: &str, service_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            inner: ModernClient::new(endpoint, service_name)?,
            retry_duration: None,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            skip_provider_registration: false,
        })
    }

    /// The service this handle was created for.
    #[must_use]
    pub fn service_name(&self) -> &str {
        self.inner.service_name()
    }

    /// The user agent installed by configuration, empty until then.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.inner.user_agent()
    }

    /// Replace the user agent.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.inner.set_user_agent(user_agent);
    }

    /// Install the credential provider for this client's audience.
    pub fn set_authorizer(&mut self, authorizer: Arc<dyn Authorizer>) {
        self.inner.set_authorizer(authorizer);
    }

    /// Whether an authorizer has been installed.
    #[must_use]
    pub const fn has_authorizer(&self) -> bool {
        self.inner.has_authorizer()
    }

    /// Install the shared pooled sender.
    pub fn set_sender(&mut self, sender: Transport) {
        self.inner.set_sender(sender);
    }

    /// Fixed delay between retry attempts, if installed.
    #[must_use]
    pub const fn retry_duration(&self) -> Option<Duration> {
        self.retry_duration
    }

    /// Install a fixed delay between retry attempts.
    pub fn set_retry_duration(&mut self, duration: Duration) {
        self.retry_duration = Some(duration);
    }

    /// Whether automatic resource-provider registration is skipped.
    #[must_use]
    pub const fn skip_provider_registration(&self) -> bool {
        self.skip_provider_registration
    }

    /// Set the provider-registration skip flag.
    pub fn set_skip_provider_registration(&mut self, skip: bool) {
        self.skip_provider_registration = skip;
    }

    /// Append a middleware layer.
    ///
    /// Layers run in append order: the first appended is the first to see
    /// each request, after authorization.
    pub fn append_layer<L>(&mut self, layer: L)
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.inner.append_layer(layer);
    }

    /// Number of appended middleware layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.inner.layer_count()
    }

    /// Compose the pipeline and return the ready-to-use client.
    #[must_use]
    pub fn build(self) -> ConfiguredClient {
        let transport = self.inner.sender.unwrap_or_default();
        let retry = self
            .retry_duration
            .map(|delay| RetryPolicy::new(self.max_retries, delay));
        let service = compose(
            BoxCloneService::new(transport),
            &self.inner.layers,
            self.inner.authorizer,
            retry,
        );
        ConfiguredClient {
            service: SyncService::new(service),
            user_agent: self.inner.user_agent,
        }
    }
}

/// Stack the pipeline around the transport.
///
/// Requests flow: authorization, appended layers in append order, retry
/// (when installed), transport.
fn compose(
    transport: BoxedService,
    layers: &[LayerFn],
    authorizer: Option<Arc<dyn Authorizer>>,
    retry: Option<RetryPolicy>,
) -> BoxedService {
    let mut service = transport;

    if let Some(policy) = retry {
        service = BoxCloneService::new(RetryLayer::new(policy).layer(service));
    }

    // applied innermost-first, so the first appended layer ends outermost
    for layer_fn in layers.iter().rev() {
        service = layer_fn(service);
    }

    if let Some(authorizer) = authorizer {
        service = BoxCloneService::new(AuthorizationLayer::new(authorizer).layer(service));
    }

    service
}

/// The composed request pipeline.
///
/// Cloning is cheap; clones share the same middleware stack and
/// connection pool.
#[derive(Clone)]
pub struct ConfiguredClient {
    service: SyncService,
    user_agent: String,
}

impl std::fmt::Debug for ConfiguredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredClient")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl ConfiguredClient {
    /// The user agent stamped on outgoing requests.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl HttpClient for ConfiguredClient {
    async fn execute(&self, mut request: Request<Bytes>) -> Result<Response<Bytes>> {
        let has_user_agent = request
            .headers()
            .keys()
            .any(|name| name.eq_ignore_ascii_case("user-agent"));
        if !has_user_agent && !self.user_agent.is_empty() {
            request
                .headers_mut()
                .insert("User-Agent".to_string(), self.user_agent.clone());
        }
        self.service.call(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_malformed_endpoint() {
        let err = ModernClient::new("not a url", "sql").expect_err("invalid");
        assert!(err.to_string().contains("sql"), "{err}");
    }

    #[test]
    fn new_accepts_valid_endpoint() {
        let client = ModernClient::new("https://management.azure.com/", "sql").expect("valid");
        assert_eq!(client.service_name(), "sql");
        assert!(client.base_uri().is_some());
        assert!(!client.has_authorizer());
    }

    #[test]
    fn legacy_client_defaults() {
        let client = LegacyClient::new("https://management.azure.com/", "sql").expect("valid");
        assert_eq!(client.retry_duration(), None);
        assert!(!client.skip_provider_registration());
    }

    #[test]
    fn configured_client_is_clone_and_debug() {
        let client = ModernClient::new("https://management.azure.com/", "sql")
            .expect("valid")
            .build();
        let _cloned = client.clone();
        assert!(format!("{client:?}").contains("ConfiguredClient"));
    }
}

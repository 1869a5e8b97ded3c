//! Shared client options and the configuration entry points.
//!
//! One [`ClientOptions`] value is built at provider initialization and
//! shared (by clone) with every per-service client constructor. Its
//! `configure` functions install everything a client handle needs:
//! authorizer, user agent, and the middleware chain. Neither function can
//! fail; failures happen later, at call time, inside the installed
//! middleware or the transport.

use std::sync::Arc;

use crate::auth::{Authorizer, Authorizers};
use crate::client::{LegacyClient, ModernClient};
use crate::environment::Environment;
use crate::middleware::{CorrelationLayer, DiagnosticsLayer, LEGACY_RETRY_DELAY};
use crate::transport::Transport;
use crate::user_agent::{CLOUD_SHELL_USER_AGENT_ENV, build_user_agent};

/// Options shared by every per-service client constructor.
///
/// Conceptually immutable per provider invocation: constructed once,
/// cloned whenever a derived client needs a variant configuration, never
/// mutated in place on the shared value.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Target cloud endpoints.
    pub environment: Environment,
    /// Per-audience credential providers.
    pub authorizers: Authorizers,
    /// Subscription operated on by this provider instance.
    pub subscription_id: String,
    /// Directory tenant the credentials belong to.
    pub tenant_id: String,
    /// Version of the provider, used in the user agent.
    pub provider_version: String,
    /// Partner ID for usage attribution, `pid-` prefix optional.
    pub partner_id: Option<String>,
    /// Operator-supplied correlation ID, replacing the generated one.
    pub custom_correlation_request_id: Option<String>,
    /// Suppress the correlation-ID header entirely.
    pub disable_correlation_request_id: bool,
    /// Suppress partner-ID attribution, including the default GUID.
    pub disable_partner_id: bool,
    /// Skip automatic resource-provider registration on legacy clients.
    pub skip_provider_registration: bool,
    /// Use directory credentials for the storage data plane.
    pub storage_use_azuread: bool,
    /// Shared pooled sender installed on legacy clients.
    pub sender: Transport,
}

impl ClientOptions {
    /// Create options with the mandatory identity fields; toggles start
    /// off and optional IDs empty.
    pub fn new(
        environment: Environment,
        authorizers: Authorizers,
        subscription_id: impl Into<String>,
        tenant_id: impl Into<String>,
        provider_version: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            authorizers,
            subscription_id: subscription_id.into(),
            tenant_id: tenant_id.into(),
            provider_version: provider_version.into(),
            partner_id: None,
            custom_correlation_request_id: None,
            disable_correlation_request_id: false,
            disable_partner_id: false,
            skip_provider_registration: false,
            storage_use_azuread: false,
            sender: Transport::default(),
        }
    }

    /// Set the partner ID used for usage attribution.
    #[must_use]
    pub fn with_partner_id(mut self, partner_id: impl Into<String>) -> Self {
        self.partner_id = Some(partner_id.into());
        self
    }

    /// Set a fixed correlation ID instead of the generated one.
    #[must_use]
    pub fn with_custom_correlation_request_id(mut self, id: impl Into<String>) -> Self {
        self.custom_correlation_request_id = Some(id.into());
        self
    }

    /// Configure a client handle for the current SDK generation.
    ///
    /// Installs the authorizer, the composite user agent, and the
    /// middleware chain: correlation-ID injector (unless disabled), then
    /// request/response diagnostics.
    pub fn configure(&self, client: &mut ModernClient, authorizer: Arc<dyn Authorizer>) {
        client.set_authorizer(authorizer);
        client.set_user_agent(self.build_user_agent(client.user_agent()));
        self.append_middleware(client);
    }

    /// Configure a client handle for the previous SDK generation.
    ///
    /// Everything [`configure`](Self::configure) does, plus the fixed
    /// five-second retry delay, the provider-registration skip flag, and
    /// the shared sender.
    pub fn configure_legacy(&self, client: &mut LegacyClient, authorizer: Arc<dyn Authorizer>) {
        client.set_authorizer(authorizer);
        client.set_user_agent(self.build_user_agent(client.user_agent()));

        if !self.disable_correlation_request_id {
            client.append_layer(self.correlation_layer());
        }
        client.append_layer(DiagnosticsLayer::new());

        // the stock exponential schedule outlasts typical outer read
        // timeouts, swallowing the real upstream error
        client.set_retry_duration(LEGACY_RETRY_DELAY);
        client.set_skip_provider_registration(self.skip_provider_registration);
        client.set_sender(self.sender.clone());
    }

    fn append_middleware(&self, client: &mut ModernClient) {
        if !self.disable_correlation_request_id {
            client.append_layer(self.correlation_layer());
        }
        client.append_layer(DiagnosticsLayer::new());
    }

    fn correlation_layer(&self) -> CorrelationLayer {
        self.custom_correlation_request_id
            .as_deref()
            .map_or_else(CorrelationLayer::new, CorrelationLayer::with_id)
    }

    fn build_user_agent(&self, existing: &str) -> String {
        let cloud_shell = std::env::var(CLOUD_SHELL_USER_AGENT_ENV).ok();
        build_user_agent(
            existing,
            &self.provider_version,
            self.partner_id.as_deref(),
            self.disable_partner_id,
            cloud_shell.as_deref(),
        )
    }
}

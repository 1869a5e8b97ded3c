//! Tower middleware layers for configured clients.
//!
//! Layers are applied in reverse order: the last layer added is the first
//! to process a request. [`ClientOptions::configure`](crate::ClientOptions::configure)
//! arranges for requests to flow authorization, then correlation, then
//! diagnostics, before reaching the transport.
//!
//! # Available Layers
//!
//! - [`AuthorizationLayer`] - Attaches the bearer credential from an
//!   [`Authorizer`](crate::auth::Authorizer)
//! - [`CorrelationLayer`] - Stamps the run-scoped correlation-ID header
//! - [`DiagnosticsLayer`] - Dumps redacted requests and responses at debug
//!   level
//! - [`RetryPolicy`] - Fixed-delay retry policy for [`RetryLayer`]

mod authorization;
mod correlation;
mod diagnostics;
mod retry;

pub use authorization::{Authorization, AuthorizationLayer};
pub use correlation::{
    CORRELATION_REQUEST_ID_HEADER, Correlation, CorrelationLayer, correlation_request_id,
};
pub use diagnostics::{Diagnostics, DiagnosticsLayer};
pub use retry::{LEGACY_RETRY_DELAY, RetryPolicy};

// Re-export tower types for convenience
pub use tower::retry::RetryLayer;
pub use tower::{Layer, ServiceBuilder};

//! HTTP client configuration and middleware for cloud management-plane
//! providers.
//!
//! One [`ClientOptions`] value, built at provider initialization, turns
//! bare per-service client handles into fully configured request
//! pipelines: bearer authorization, a run-scoped correlation ID, a
//! composite user agent, and redacted wire diagnostics.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use armature::{
//!     Authorizers, ClientOptions, Environment, ModernClient, StaticTokenAuthorizer,
//! };
//!
//! let environment = Environment::public();
//! let authorizers = Authorizers::uniform(Arc::new(StaticTokenAuthorizer::new(token)));
//! let options = ClientOptions::new(environment, authorizers, sub_id, tenant_id, "3.5.0");
//!
//! let mut client = ModernClient::new("https://management.azure.com/", "sql")?;
//! options.configure(&mut client, Arc::clone(&options.authorizers.resource_manager));
//! let client = client.build();
//! ```

mod auth;
mod client;
mod config;
mod connector;
mod environment;
pub mod middleware;
mod options;
pub mod restart;
mod transport;
mod user_agent;

pub use auth::{Authorizer, Authorizers, StaticTokenAuthorizer, TokenFuture};
pub use client::{BoxedService, ConfiguredClient, LegacyClient, ModernClient, ServiceFuture};
pub use config::{TransportConfig, TransportConfigBuilder};
pub use environment::Environment;
pub use options::ClientOptions;
pub use transport::Transport;
pub use user_agent::{
    BASE_USER_AGENT, CLOUD_SHELL_USER_AGENT_ENV, DEFAULT_PARTNER_ID, PROVIDER_NAME,
    build_user_agent,
};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use armature_core::{
    Error, HttpClient, HttpClientExt, Method, Request, RequestBuilder, Response, Result,
    from_json, to_json,
};

// Re-export http types for status codes and headers
pub use armature_core::{StatusCode, header};

pub use url;

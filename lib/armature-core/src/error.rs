//! Error types for armature.

use derive_more::{Display, Error, From};

/// Main error type for armature operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Client construction failed for a service (malformed base URI).
    #[display("building client for {service}: {source}")]
    #[from(skip)]
    Configuration {
        /// Name of the service the client was being built for.
        service: String,
        /// Underlying URL parse failure.
        source: url::ParseError,
    },

    /// Token acquisition failed for an audience.
    #[display("acquiring token for {audience}: {message}")]
    #[from(skip)]
    Authorization {
        /// Audience (resource URI) the token was requested for.
        audience: String,
        /// Failure detail.
        message: String,
    },

    /// The remote resource returned a model without the fields needed to
    /// decide on an operation.
    #[display("{resource}: response did not include the server state")]
    #[from(skip)]
    MissingState {
        /// Identifier of the resource that was polled.
        resource: String,
    },

    /// The remote resource is in a state that rules out the requested
    /// operation.
    #[display("{resource}: server is {state}, unable to continue")]
    #[from(skip)]
    UnavailableState {
        /// Identifier of the resource.
        resource: String,
        /// The lifecycle state the service reported.
        state: String,
    },

    /// A fetch or mutating call failed while operating on a resource.
    #[display("operating on {resource}: {source}")]
    #[from(skip)]
    Operation {
        /// Identifier of the resource.
        resource: String,
        /// Underlying failure.
        source: Box<Error>,
    },

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "properties.userVisibleState").
        path: String,
        /// Error message.
        message: String,
    },

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a configuration error for a named service.
    #[must_use]
    pub fn configuration(service: impl Into<String>, source: url::ParseError) -> Self {
        Self::Configuration {
            service: service.into(),
            source,
        }
    }

    /// Create an authorization error for an audience.
    #[must_use]
    pub fn authorization(audience: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authorization {
            audience: audience.into(),
            message: message.into(),
        }
    }

    /// Create a missing-state error for a resource.
    #[must_use]
    pub fn missing_state(resource: impl Into<String>) -> Self {
        Self::MissingState {
            resource: resource.into(),
        }
    }

    /// Create an unavailable-state error for a resource.
    #[must_use]
    pub fn unavailable_state(resource: impl Into<String>, state: impl Into<String>) -> Self {
        Self::UnavailableState {
            resource: resource.into(),
            state: state.into(),
        }
    }

    /// Wrap an error with the resource it occurred against.
    #[must_use]
    pub fn operation(resource: impl Into<String>, source: Self) -> Self {
        Self::Operation {
            resource: resource.into(),
            source: Box::new(source),
        }
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Management-plane errors usually carry a structured body; this gives
    /// callers a typed view of it without losing the original error.
    /// Returns `None` if there is no body or this is not an HTTP error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}

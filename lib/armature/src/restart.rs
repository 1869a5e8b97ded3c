//! Server restart with state polling.
//!
//! Restarting a managed server is only valid while the server is in a
//! steady state. [`restart_server`] polls the reported lifecycle state at
//! a fixed interval until the server is actionable, then issues the
//! restart and waits for it to complete. The loop carries no deadline of
//! its own; the caller's timeout bounds total wall-clock time.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use armature_core::{Error, Result};

/// Interval between state polls.
pub const RESTART_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Lifecycle state reported by a managed server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    /// Steady state, mutations are accepted.
    Ready,
    /// Coming up.
    Starting,
    /// Going down.
    Stopping,
    /// A configuration change is in progress.
    Updating,
    /// A restart is already in progress.
    Restarting,
    /// Administratively disabled.
    Disabled,
    /// Stopped.
    Stopped,
    /// Being deleted.
    Dropping,
    /// A state this library does not know about.
    Other(String),
}

impl ServerState {
    /// Whether the server is mid-transition and worth waiting for.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Stopping | Self::Updating | Self::Restarting
        )
    }

    /// Whether the server cannot service the operation at all.
    ///
    /// These states do not resolve on their own; waiting on them only
    /// burns the caller's timeout.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Disabled | Self::Stopped | Self::Dropping)
    }
}

impl FromStr for ServerState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "Ready" => Self::Ready,
            "Starting" => Self::Starting,
            "Stopping" => Self::Stopping,
            "Updating" => Self::Updating,
            "Restarting" => Self::Restarting,
            "Disabled" => Self::Disabled,
            "Stopped" => Self::Stopped,
            "Dropping" => Self::Dropping,
            other => Self::Other(other.to_string()),
        })
    }
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ready => "Ready",
            Self::Starting => "Starting",
            Self::Stopping => "Stopping",
            Self::Updating => "Updating",
            Self::Restarting => "Restarting",
            Self::Disabled => "Disabled",
            Self::Stopped => "Stopped",
            Self::Dropping => "Dropping",
            Self::Other(other) => other,
        };
        f.write_str(s)
    }
}

/// Status model returned by a state fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    /// The reported lifecycle state, absent on malformed responses.
    pub state: Option<ServerState>,
}

/// Boxed future returned by the [`RestartableServer`] operations.
pub type ServerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A managed server that can report its state and be restarted.
///
/// Implemented over the generated per-service client; tests use a
/// scripted double.
pub trait RestartableServer: Send + Sync {
    /// Identifier used in error messages, e.g. the full resource path.
    fn resource_id(&self) -> &str;

    /// Fetch the current status. `None` means the response carried no
    /// status model at all.
    fn status(&self) -> ServerFuture<'_, Option<ServerStatus>>;

    /// Issue the restart and poll the long-running operation to
    /// completion.
    fn restart_then_poll(&self) -> ServerFuture<'_, ()>;
}

/// Restart the server once it reaches an actionable state.
///
/// Level-triggered poll: each iteration re-fetches the full state. A
/// missing status model or state field fails immediately, as do the
/// unavailable states; transient states wait [`RESTART_POLL_INTERVAL`]
/// between polls.
///
/// # Errors
///
/// - [`Error::MissingState`] when the response carries no state.
/// - [`Error::UnavailableState`] when the server is disabled, stopped,
///   or being dropped.
/// - [`Error::Operation`] wrapping a failed fetch or restart call.
pub async fn restart_server<S: RestartableServer + ?Sized>(server: &S) -> Result<()> {
    let resource_id = server.resource_id();

    loop {
        let status = server
            .status()
            .await
            .map_err(|source| Error::operation(resource_id, source))?;

        let state = status
            .and_then(|status| status.state)
            .ok_or_else(|| Error::missing_state(resource_id))?;

        if state.is_unavailable() {
            return Err(Error::unavailable_state(resource_id, state.to_string()));
        }

        if state.is_transient() {
            debug!(resource_id, %state, "server is mid-transition, waiting before restart");
            tokio::time::sleep(RESTART_POLL_INTERVAL).await;
            continue;
        }

        debug!(resource_id, %state, "issuing restart");
        return server
            .restart_then_poll()
            .await
            .map_err(|source| Error::operation(resource_id, source));
    }
}

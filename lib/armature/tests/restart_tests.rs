//! Integration tests for the restart polling loop.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use armature::Error;
use armature::restart::{
    RestartableServer, ServerFuture, ServerState, ServerStatus, restart_server,
};

/// Scripted double for a managed server: plays back a fixed sequence of
/// status fetch results, counting calls.
struct ScriptedServer {
    states: Mutex<Vec<armature::Result<Option<ServerStatus>>>>,
    status_calls: AtomicU32,
    restart_calls: AtomicU32,
    restart_result: Mutex<Option<Error>>,
}

impl ScriptedServer {
    fn new(states: Vec<armature::Result<Option<ServerStatus>>>) -> Self {
        Self {
            states: Mutex::new(states),
            status_calls: AtomicU32::new(0),
            restart_calls: AtomicU32::new(0),
            restart_result: Mutex::new(None),
        }
    }

    fn with_states(states: &[ServerState]) -> Self {
        Self::new(
            states
                .iter()
                .map(|state| {
                    Ok(Some(ServerStatus {
                        state: Some(state.clone()),
                    }))
                })
                .collect(),
        )
    }

    fn failing_restart(self, error: Error) -> Self {
        *self.restart_result.lock().expect("lock") = Some(error);
        self
    }

    fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn restart_calls(&self) -> u32 {
        self.restart_calls.load(Ordering::SeqCst)
    }
}

impl RestartableServer for ScriptedServer {
    fn resource_id(&self) -> &str {
        "/subscriptions/sub/resourceGroups/rg/providers/sql/servers/db1"
    }

    fn status(&self) -> ServerFuture<'_, Option<ServerStatus>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.states.lock().expect("lock").remove(0);
        Box::pin(async move { next })
    }

    fn restart_then_poll(&self) -> ServerFuture<'_, ()> {
        self.restart_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.restart_result.lock().expect("lock").take();
        Box::pin(async move {
            match result {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}

/// A ready server is restarted on the first poll, without sleeping.
#[tokio::test(start_paused = true)]
async fn ready_server_restarts_immediately() {
    let server = ScriptedServer::with_states(&[ServerState::Ready]);

    restart_server(&server).await.expect("restarted");

    assert_eq!(server.status_calls(), 1);
    assert_eq!(server.restart_calls(), 1);
}

/// Disabled, stopped, and dropping servers fail on the first poll with no
/// retry and no restart attempt.
#[tokio::test(start_paused = true)]
async fn unavailable_states_fail_fast() {
    for state in [
        ServerState::Disabled,
        ServerState::Stopped,
        ServerState::Dropping,
    ] {
        let server = ScriptedServer::with_states(&[state.clone()]);

        let err = restart_server(&server).await.expect_err("unavailable");

        assert!(
            matches!(err, Error::UnavailableState { .. }),
            "{state}: {err}"
        );
        assert!(err.to_string().contains("db1"), "{err}");
        assert_eq!(server.status_calls(), 1, "{state}");
        assert_eq!(server.restart_calls(), 0, "{state}");
    }
}

/// Transient states are waited out; the restart fires exactly once, only
/// after the ready state is observed.
#[tokio::test(start_paused = true)]
async fn transient_states_are_polled_through() {
    let server = ScriptedServer::with_states(&[
        ServerState::Updating,
        ServerState::Updating,
        ServerState::Ready,
    ]);

    let start = tokio::time::Instant::now();
    restart_server(&server).await.expect("restarted");

    assert_eq!(server.status_calls(), 3);
    assert_eq!(server.restart_calls(), 1);
    // two transient polls, ten seconds apart
    assert_eq!(start.elapsed(), std::time::Duration::from_secs(20));
}

/// Every transient state is waited on, not just `Updating`.
#[tokio::test(start_paused = true)]
async fn all_transient_states_wait() {
    let server = ScriptedServer::with_states(&[
        ServerState::Starting,
        ServerState::Stopping,
        ServerState::Restarting,
        ServerState::Ready,
    ]);

    restart_server(&server).await.expect("restarted");

    assert_eq!(server.status_calls(), 4);
    assert_eq!(server.restart_calls(), 1);
}

/// A response with no status model fails immediately.
#[tokio::test(start_paused = true)]
async fn missing_status_model_fails_fast() {
    let server = ScriptedServer::new(vec![Ok(None)]);

    let err = restart_server(&server).await.expect_err("missing");

    assert!(matches!(err, Error::MissingState { .. }), "{err}");
    assert_eq!(server.restart_calls(), 0);
}

/// A status model with no state field fails immediately.
#[tokio::test(start_paused = true)]
async fn missing_state_field_fails_fast() {
    let server = ScriptedServer::new(vec![Ok(Some(ServerStatus { state: None }))]);

    let err = restart_server(&server).await.expect_err("missing");

    assert!(matches!(err, Error::MissingState { .. }), "{err}");
    assert_eq!(server.restart_calls(), 0);
}

/// A failed status fetch is wrapped with the resource identifier.
#[tokio::test(start_paused = true)]
async fn fetch_failure_is_wrapped() {
    let server = ScriptedServer::new(vec![Err(Error::connection("connection refused"))]);

    let err = restart_server(&server).await.expect_err("fetch failed");

    assert!(matches!(err, Error::Operation { .. }), "{err}");
    assert!(err.to_string().contains("db1"), "{err}");
    assert_eq!(server.restart_calls(), 0);
}

/// A failed restart call is wrapped with the resource identifier.
#[tokio::test(start_paused = true)]
async fn restart_failure_is_wrapped() {
    let server = ScriptedServer::with_states(&[ServerState::Ready])
        .failing_restart(Error::http(500, "internal error"));

    let err = restart_server(&server).await.expect_err("restart failed");

    assert!(matches!(err, Error::Operation { .. }), "{err}");
    assert!(err.to_string().contains("db1"), "{err}");
    assert_eq!(server.restart_calls(), 1);
}

/// Unknown states fall into the actionable branch and restart.
#[tokio::test(start_paused = true)]
async fn unknown_state_is_treated_as_actionable() {
    let server = ScriptedServer::with_states(&[ServerState::Other("Provisioned".to_string())]);

    restart_server(&server).await.expect("restarted");

    assert_eq!(server.restart_calls(), 1);
}

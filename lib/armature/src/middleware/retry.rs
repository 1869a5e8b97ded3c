//! Retry policy for transient failures.
//!
//! Used with tower's [`RetryLayer`](tower::retry::RetryLayer). Retries
//! connection and timeout errors, 5xx responses, and 429 responses,
//! waiting a fixed duration between attempts.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use tower::retry::Policy;

use armature_core::{Error, Request, Response};

/// Fixed delay between attempts on clients built through the legacy
/// configuration path.
pub const LEGACY_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Retry policy with a fixed inter-attempt delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    remaining: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` additional attempts with the
    /// given delay between them.
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            remaining: max_retries,
            delay,
        }
    }

    /// Policy used by legacy-path clients: fixed five-second backoff.
    #[must_use]
    pub const fn legacy(max_retries: u32) -> Self {
        Self::new(max_retries, LEGACY_RETRY_DELAY)
    }

    /// The delay applied between attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    fn should_retry_response(response: &Response<Bytes>) -> bool {
        let status = response.status();
        status >= 500 || status == 429
    }

    fn should_retry_error(error: &Error) -> bool {
        error.is_connection() || error.is_timeout()
    }
}

impl Policy<Request<Bytes>, Response<Bytes>, Error> for RetryPolicy {
    type Future = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn retry(
        &mut self,
        _req: &mut Request<Bytes>,
        result: &mut Result<Response<Bytes>, Error>,
    ) -> Option<Self::Future> {
        if self.remaining == 0 {
            return None;
        }

        let should_retry = match result {
            Ok(response) => Self::should_retry_response(response),
            Err(error) => Self::should_retry_error(error),
        };

        if should_retry {
            self.remaining -= 1;
            let delay = self.delay;
            Some(Box::pin(tokio::time::sleep(delay)))
        } else {
            None
        }
    }

    fn clone_request(&mut self, req: &Request<Bytes>) -> Option<Request<Bytes>> {
        Some(req.clone())
    }
}

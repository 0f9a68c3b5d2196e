// Retry policy for GitHub API requests.
// Retries rate-limited (403) responses at a fixed interval; everything else is terminal.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ActivityError, Result};

use super::client::{HttpTransport, RawResponse};

const STATUS_OK: u16 = 200;
const STATUS_RATE_LIMITED: u16 = 403;

/// Fixed-interval retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial request.
    pub max_retries: u32,
    /// Wait between attempts. Constant, never scaled.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(5000),
        }
    }
}

/// Progress of one logical fetch.
#[derive(Debug)]
pub enum RetryState {
    /// About to issue request number `attempt`.
    Attempting { attempt: u32, remaining: u32 },
    /// Rate limited; sleeping before the next attempt.
    Waiting { attempt: u32, remaining: u32 },
    Succeeded(String),
    Failed(ActivityError),
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    fn initial_state(&self) -> RetryState {
        RetryState::Attempting {
            attempt: 1,
            remaining: self.max_retries,
        }
    }

    /// GET `url`, retrying rate-limited responses. Returns the body of the
    /// first 200 response.
    pub async fn fetch<T: HttpTransport + ?Sized>(
        &self,
        transport: &T,
        url: &str,
    ) -> Result<String> {
        let mut state = self.initial_state();

        loop {
            state = match state {
                RetryState::Attempting { attempt, remaining } => {
                    debug!(url, attempt, "sending request");
                    match transport.get(url).await {
                        Ok(response) => self.after_response(response, attempt, remaining),
                        Err(e) => RetryState::Failed(e),
                    }
                }
                RetryState::Waiting { attempt, remaining } => {
                    tokio::time::sleep(self.delay).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                        remaining: remaining - 1,
                    }
                }
                RetryState::Succeeded(body) => return Ok(body),
                RetryState::Failed(err) => return Err(err),
            };
        }
    }

    /// Transition taken once a response for `attempt` has arrived.
    fn after_response(&self, response: RawResponse, attempt: u32, remaining: u32) -> RetryState {
        match response.status {
            STATUS_OK => RetryState::Succeeded(response.body),
            STATUS_RATE_LIMITED if remaining > 0 => {
                warn!(
                    attempt,
                    remaining,
                    delay_ms = self.delay.as_millis() as u64,
                    "rate limited, retrying"
                );
                RetryState::Waiting { attempt, remaining }
            }
            status => RetryState::Failed(ActivityError::RequestFailed { status }),
        }
    }
}

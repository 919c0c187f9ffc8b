//! Attempt-bounded SMS polling

use crate::client::SmsRelay;
use crate::controller::status::StatusEvent;
use crate::models::{Credentials, SmsQuery};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Number of `getKeywordSms` requests before giving up
pub const POLL_MAX_ATTEMPTS: u32 = 12;

/// Wait between unsuccessful attempts
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How a polling session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded(String),
    TimedOut,
    Cancelled,
}

/// State of one in-flight SMS fetch. Dropped when the loop terminates.
pub struct PollSession<'a> {
    relay: &'a dyn SmsRelay,
    credentials: &'a Credentials,
    query: &'a SmsQuery,
    token: CancellationToken,
    attempts: u32,
}

impl<'a> PollSession<'a> {
    pub fn new(
        relay: &'a dyn SmsRelay,
        credentials: &'a Credentials,
        query: &'a SmsQuery,
        token: CancellationToken,
    ) -> Self {
        Self {
            relay,
            credentials,
            query,
            token,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Poll until a matching SMS arrives, attempts run out, or the token is cancelled.
    ///
    /// Cancellation is checked before every request and before and during every
    /// wait; a request already in flight is allowed to finish.
    pub async fn run(&mut self, events: &UnboundedSender<StatusEvent>) -> PollOutcome {
        while self.attempts < POLL_MAX_ATTEMPTS {
            if self.token.is_cancelled() {
                return self.cancelled();
            }

            match self.relay.fetch_sms(self.credentials, self.query).await {
                Ok(response) if response.is_success() => {
                    let message = response.message().unwrap_or_default();
                    tracing::info!(
                        phone = %self.query.phone,
                        attempt = self.attempts + 1,
                        "SMS received"
                    );
                    let _ = events.send(StatusEvent::SmsReceived {
                        message: message.clone(),
                    });
                    return PollOutcome::Succeeded(message);
                }
                Ok(response) => {
                    self.attempts += 1;
                    tracing::debug!(
                        phone = %self.query.phone,
                        attempt = self.attempts,
                        code = ?response.code(),
                        "No SMS yet"
                    );
                    let _ = events.send(StatusEvent::NotYet {
                        attempt: self.attempts,
                        max_attempts: POLL_MAX_ATTEMPTS,
                    });
                }
                Err(err) => {
                    self.attempts += 1;
                    tracing::warn!(
                        phone = %self.query.phone,
                        attempt = self.attempts,
                        error = %err,
                        "SMS poll request failed"
                    );
                    let _ = events.send(StatusEvent::AttemptFailed {
                        attempt: self.attempts,
                        max_attempts: POLL_MAX_ATTEMPTS,
                        reason: err.to_string(),
                    });
                }
            }

            if self.token.is_cancelled() {
                return self.cancelled();
            }
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return self.cancelled(),
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }

        tracing::info!(phone = %self.query.phone, attempts = self.attempts, "SMS poll timed out");
        let _ = events.send(StatusEvent::TimedOut {
            attempts: self.attempts,
        });
        PollOutcome::TimedOut
    }

    fn cancelled(&self) -> PollOutcome {
        tracing::info!(phone = %self.query.phone, attempts = self.attempts, "SMS poll cancelled");
        PollOutcome::Cancelled
    }
}

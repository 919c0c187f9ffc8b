//! Status events and operation outcomes reported to the caller

use crate::controller::poll::POLL_INTERVAL;
use crate::models::RelayResponse;
use serde::Serialize;
use std::fmt;

/// Kind of operation run by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AcquireNumber,
    FetchSms,
    ReleaseNumber,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::AcquireNumber => "Acquire number",
            Operation::FetchSms => "Fetch SMS",
            Operation::ReleaseNumber => "Release number",
        };
        f.write_str(name)
    }
}

/// Progress and result notifications, emitted in the order requests resolve.
///
/// `Display` renders the human-readable status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Raw `getKeywordNumber` response
    NumberAcquired { response: String },
    SmsReceived { message: String },
    /// The service has no matching SMS yet
    NotYet { attempt: u32, max_attempts: u32 },
    /// A poll request failed at the transport level; counts as an attempt
    AttemptFailed {
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },
    TimedOut { attempts: u32 },
    /// Raw `delKeywordNumber` response
    NumberReleased { response: String },
    Failed { operation: Operation, reason: String },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::NumberAcquired { response } => write!(f, "Number acquired: {}", response),
            StatusEvent::SmsReceived { message } => write!(f, "SMS received: {}", message),
            StatusEvent::NotYet {
                attempt,
                max_attempts,
            } => write!(
                f,
                "No SMS yet (attempt {}/{}), retrying in {}s",
                attempt,
                max_attempts,
                POLL_INTERVAL.as_secs()
            ),
            StatusEvent::AttemptFailed {
                attempt,
                max_attempts,
                reason,
            } => write!(
                f,
                "SMS poll failed (attempt {}/{}): {}",
                attempt, max_attempts, reason
            ),
            StatusEvent::TimedOut { attempts } => write!(
                f,
                "No SMS received within {} seconds, giving up",
                u64::from(*attempts) * POLL_INTERVAL.as_secs()
            ),
            StatusEvent::NumberReleased { response } => write!(f, "Number released: {}", response),
            StatusEvent::Failed { operation, reason } => {
                write!(f, "{} failed: {}", operation, reason)
            }
        }
    }
}

/// Terminal result of one operation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Single-shot request answered; the body may still carry a service error code
    Completed(RelayResponse),
    Succeeded { message: String },
    TimedOut,
    Cancelled,
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed(_) | Outcome::Succeeded { .. })
    }
}

//! Acquisition controller
//!
//! Runs relay operations as background tokio tasks, one at a time per
//! controller. Fetching an SMS is a cancellable polling loop bounded to
//! [`POLL_MAX_ATTEMPTS`] attempts spaced [`POLL_INTERVAL`] apart; acquiring and
//! releasing a number are single requests. Progress is reported as a stream of
//! [`StatusEvent`]s and each operation ends with an [`Outcome`].

mod acquisition;
mod poll;
mod status;
pub mod validation;

pub use acquisition::{AcquisitionController, ControllerError, OperationHandle};
pub use poll::{PollOutcome, PollSession, POLL_INTERVAL, POLL_MAX_ATTEMPTS};
pub use status::{Operation, Outcome, StatusEvent};
pub use validation::ValidationError;

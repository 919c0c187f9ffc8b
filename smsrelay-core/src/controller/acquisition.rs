//! Controller that runs one relay operation at a time on a background task

use crate::client::SmsRelay;
use crate::controller::poll::{PollOutcome, PollSession};
use crate::controller::status::{Operation, Outcome, StatusEvent};
use crate::controller::validation::{validate_api_key, validate_phone, ValidationError};
use crate::models::{CardType, Credentials, NumberRequest, SmsQuery};
use std::future::Future;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Reasons an operation could not be started
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Another operation is already in progress")]
    Busy,
}

/// Handle to a running operation: its status events and final outcome.
pub struct OperationHandle {
    id: Uuid,
    operation: Operation,
    events: mpsc::UnboundedReceiver<StatusEvent>,
    task: JoinHandle<Outcome>,
}

impl OperationHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Next status event, or None once the operation has finished.
    pub async fn next_event(&mut self) -> Option<StatusEvent> {
        self.events.recv().await
    }

    /// Wait for the operation to finish. Unread events are discarded.
    pub async fn finish(self) -> Outcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Failed(format!("operation task failed: {}", err)),
        }
    }

    /// Drain every event, then wait for the outcome.
    pub async fn collect(mut self) -> (Vec<StatusEvent>, Outcome) {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        (events, self.finish().await)
    }
}

/// Marks the controller busy for as long as it is alive
struct BusyGuard {
    busy: Arc<watch::Sender<bool>>,
}

impl BusyGuard {
    fn acquire(busy: &Arc<watch::Sender<bool>>) -> Option<Self> {
        let claimed = busy.send_if_modified(|state| {
            if *state {
                false
            } else {
                *state = true;
                true
            }
        });
        claimed.then(|| Self {
            busy: Arc::clone(busy),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.send_replace(false);
    }
}

/// Validates input, enforces the single-operation rule and runs relay calls
/// in the background.
///
/// `start_*` methods must be called from within a tokio runtime.
pub struct AcquisitionController {
    relay: Arc<dyn SmsRelay>,
    busy: Arc<watch::Sender<bool>>,
    cancel: Mutex<CancellationToken>,
}

impl AcquisitionController {
    pub fn new(relay: Arc<dyn SmsRelay>) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            relay,
            busy: Arc::new(busy),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Observe busy transitions, e.g. to disable triggers while an operation runs.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    /// Ask the running operation to stop at its next check point.
    pub fn cancel(&self) {
        let token = self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !token.is_cancelled() {
            tracing::info!("Cancellation requested");
        }
        token.cancel();
    }

    /// Lease a number. One request; the raw response is reported verbatim.
    pub fn start_acquire_number(
        &self,
        api_key: &str,
        phone_filter: Option<&str>,
        card_type: CardType,
    ) -> Result<OperationHandle, ControllerError> {
        let credentials = Credentials::new(api_key);
        validate_api_key(&credentials)?;
        let request = NumberRequest::new(phone_filter, card_type);

        self.spawn(Operation::AcquireNumber, move |relay, _token, events| async move {
            match relay.acquire_number(&credentials, &request).await {
                Ok(response) => {
                    let _ = events.send(StatusEvent::NumberAcquired {
                        response: response.raw().to_string(),
                    });
                    Outcome::Completed(response)
                }
                Err(err) => report_failure(Operation::AcquireNumber, err.to_string(), &events),
            }
        })
    }

    /// Poll for an SMS on `phone` containing `keyword`.
    pub fn start_fetch_sms(
        &self,
        api_key: &str,
        phone: &str,
        keyword: &str,
    ) -> Result<OperationHandle, ControllerError> {
        let credentials = Credentials::new(api_key);
        validate_api_key(&credentials)?;
        validate_phone(phone)?;
        let query = SmsQuery::new(phone, keyword);

        self.spawn(Operation::FetchSms, move |relay, token, events| async move {
            let mut session = PollSession::new(&*relay, &credentials, &query, token);
            match session.run(&events).await {
                PollOutcome::Succeeded(message) => Outcome::Succeeded { message },
                PollOutcome::TimedOut => Outcome::TimedOut,
                PollOutcome::Cancelled => Outcome::Cancelled,
            }
        })
    }

    /// Release a leased number. Not tracked locally, so repeating it re-sends the request.
    pub fn start_release_number(
        &self,
        api_key: &str,
        phone: &str,
    ) -> Result<OperationHandle, ControllerError> {
        let credentials = Credentials::new(api_key);
        validate_api_key(&credentials)?;
        validate_phone(phone)?;
        let phone = phone.trim().to_string();

        self.spawn(Operation::ReleaseNumber, move |relay, _token, events| async move {
            match relay.release_number(&credentials, &phone).await {
                Ok(response) => {
                    let _ = events.send(StatusEvent::NumberReleased {
                        response: response.raw().to_string(),
                    });
                    Outcome::Completed(response)
                }
                Err(err) => report_failure(Operation::ReleaseNumber, err.to_string(), &events),
            }
        })
    }

    fn spawn<F, Fut>(&self, operation: Operation, work: F) -> Result<OperationHandle, ControllerError>
    where
        F: FnOnce(Arc<dyn SmsRelay>, CancellationToken, mpsc::UnboundedSender<StatusEvent>) -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let guard = BusyGuard::acquire(&self.busy).ok_or(ControllerError::Busy)?;

        let token = CancellationToken::new();
        *self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token.clone();

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::info!(%id, %operation, "Starting operation");

        let inner = tokio::spawn(work(Arc::clone(&self.relay), token, tx.clone()));
        let task = tokio::spawn(async move {
            let outcome = match inner.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(%id, %operation, error = %err, "Operation task aborted");
                    report_failure(operation, "unexpected internal error".to_string(), &tx)
                }
            };
            tracing::info!(%id, %operation, ?outcome, "Operation finished");
            drop(guard);
            drop(tx);
            outcome
        });

        Ok(OperationHandle {
            id,
            operation,
            events: rx,
            task,
        })
    }
}

fn report_failure(
    operation: Operation,
    reason: String,
    events: &mpsc::UnboundedSender<StatusEvent>,
) -> Outcome {
    tracing::warn!(%operation, reason = %reason, "Operation failed");
    let _ = events.send(StatusEvent::Failed {
        operation,
        reason: reason.clone(),
    });
    Outcome::Failed(reason)
}

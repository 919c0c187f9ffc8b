//! CLI command handlers

use super::config::{mask_api_key, resolve_api_key, API_KEY_ENV};
use anyhow::{Context, Result};
use smsrelay_core::controller::{AcquisitionController, OperationHandle, Outcome, StatusEvent};
use smsrelay_core::models::{CardType, Configuration};
use smsrelay_core::RelayClient;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

/// Controller plus the settings every relay command needs
pub struct Session {
    controller: AcquisitionController,
    api_key: String,
    json: bool,
}

impl Session {
    pub fn new(config: &Configuration, api_key_flag: Option<String>, json: bool) -> Result<Self> {
        let api_key = resolve_api_key(api_key_flag, std::env::var(API_KEY_ENV).ok(), config);
        let client = RelayClient::with_timeout(&config.base_url, config.request_timeout())
            .context("Failed to create relay client")?;
        tracing::debug!(base_url = client.base_url(), "Relay client ready");
        Ok(Self {
            controller: AcquisitionController::new(Arc::new(client)),
            api_key,
            json,
        })
    }
}

/// Handle the 'number' command
pub async fn handle_number(
    session: &Session,
    phone: Option<String>,
    card_type: &str,
) -> Result<()> {
    let card_type = CardType::from(card_type);
    let handle = session
        .controller
        .start_acquire_number(&session.api_key, phone.as_deref(), card_type)?;
    if !session.json {
        println!("📞 Requesting a number (card type: {})...", card_type);
    }
    let outcome = drive(session, handle).await;
    finish(outcome)
}

/// Handle the 'sms' command
pub async fn handle_sms(session: &Session, phone: &str, keyword: &str) -> Result<()> {
    let handle = session
        .controller
        .start_fetch_sms(&session.api_key, phone, keyword)?;
    if !session.json {
        println!("⏳ Waiting for SMS on {} (Ctrl+C to cancel)...", phone.trim());
    }
    let outcome = drive(session, handle).await;
    finish(outcome)
}

/// Handle the 'release' command
pub async fn handle_release(session: &Session, phone: &str) -> Result<()> {
    let handle = session
        .controller
        .start_release_number(&session.api_key, phone)?;
    let outcome = drive(session, handle).await;
    finish(outcome)
}

/// Handle 'config --init'
pub async fn handle_config_init(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }
    Configuration::default()
        .save_to_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
    println!("✅ Configuration written to {}", path.display());
    println!("Set api_key there or export {}", API_KEY_ENV);
    Ok(())
}

/// Handle 'config --show'
pub fn handle_config_show(config: &Configuration, path: &Path) -> Result<()> {
    let mut shown = config.clone();
    shown.api_key = shown.api_key.as_deref().map(mask_api_key);
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

/// Exit status used when a second Ctrl+C abandons the operation
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// What a Ctrl+C does while an operation runs
#[derive(Debug, PartialEq, Eq)]
enum InterruptAction {
    /// Ask the controller to stop at its next check point
    Cancel,
    /// Leave immediately without waiting for the in-flight request
    Exit,
}

fn interrupt_action(cancel_requested: bool) -> InterruptAction {
    if cancel_requested {
        InterruptAction::Exit
    } else {
        InterruptAction::Cancel
    }
}

/// Print events until the operation ends. The first Ctrl+C requests
/// cancellation, a second one exits.
async fn drive(session: &Session, mut handle: OperationHandle) -> Outcome {
    let mut cancel_requested = false;
    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_event(&event, session.json),
                None => break,
            },
            _ = signal::ctrl_c() => match interrupt_action(cancel_requested) {
                InterruptAction::Cancel => {
                    cancel_requested = true;
                    session.controller.cancel();
                    if !session.json {
                        println!("\n⚠️  Cancelling... (Ctrl+C again to quit)");
                    }
                }
                InterruptAction::Exit => {
                    if !session.json {
                        println!("\n⚠️  Interrupted");
                    }
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            },
        }
    }
    let outcome = handle.finish().await;
    if matches!(outcome, Outcome::Cancelled) {
        if session.json {
            let line = serde_json::json!({
                "type": "cancelled",
                "timestamp": chrono::Utc::now().to_rfc3339()
            });
            println!("{}", line);
        } else {
            println!("Cancelled by user");
        }
    }
    outcome
}

fn print_event(event: &StatusEvent, json: bool) {
    if json {
        println!("{}", event_json(event));
        return;
    }
    match event {
        StatusEvent::SmsReceived { .. }
        | StatusEvent::NumberAcquired { .. }
        | StatusEvent::NumberReleased { .. } => println!("✅ {}", event),
        StatusEvent::TimedOut { .. } | StatusEvent::Failed { .. } => println!("❌ {}", event),
        StatusEvent::NotYet { .. } | StatusEvent::AttemptFailed { .. } => println!("   {}", event),
    }
}

fn event_json(event: &StatusEvent) -> serde_json::Value {
    let mut value = serde_json::to_value(event).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(map) = value.as_object_mut() {
        map.insert("line".to_string(), serde_json::Value::String(event.to_string()));
        map.insert(
            "timestamp".to_string(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
    value
}

/// Map an outcome to the process result: timeouts and failures exit non-zero.
fn finish(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Completed(_) | Outcome::Succeeded { .. } | Outcome::Cancelled => Ok(()),
        Outcome::TimedOut => Err(anyhow::anyhow!("Timed out waiting for SMS")),
        Outcome::Failed(reason) => Err(anyhow::anyhow!("Operation failed: {}", reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsrelay_core::models::RelayResponse;

    #[test]
    fn test_event_json_includes_line() {
        let event = StatusEvent::NotYet {
            attempt: 2,
            max_attempts: 12,
        };
        let value = event_json(&event);
        assert_eq!(value["type"], "not_yet");
        assert_eq!(value["attempt"], 2);
        assert_eq!(value["line"], event.to_string());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_finish_exit_status() {
        let response = RelayResponse::from_value(serde_json::json!({"code": 0}));
        assert!(finish(Outcome::Completed(response)).is_ok());
        assert!(finish(Outcome::Cancelled).is_ok());
        assert!(finish(Outcome::TimedOut).is_err());
        let err = finish(Outcome::Failed("connection refused".into())).unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_second_interrupt_exits() {
        assert_eq!(interrupt_action(false), InterruptAction::Cancel);
        assert_eq!(interrupt_action(true), InterruptAction::Exit);
    }

    #[tokio::test]
    async fn test_number_rejects_missing_api_key_before_starting() {
        let config = Configuration {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Configuration::default()
        };
        let mut session = Session::new(&config, None, false).unwrap();
        session.api_key = String::new();
        let err = handle_number(&session, None, "any").await.unwrap_err();
        assert!(err.to_string().contains("API key is required"));
        assert!(!session.controller.is_busy());
    }

    #[tokio::test]
    async fn test_session_rejects_missing_api_key_before_network() {
        std::env::remove_var(API_KEY_ENV);
        let config = Configuration {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Configuration::default()
        };
        let session = Session::new(&config, None, true).unwrap();
        let err = handle_release(&session, "13800000000").await.unwrap_err();
        assert!(err.to_string().contains("API key is required"));
        assert!(!session.controller.is_busy());
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_release() {
        let config = Configuration {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_seconds: Some(2),
            ..Configuration::default()
        };
        let session = Session::new(&config, Some("key".into()), true).unwrap();
        let err = handle_release(&session, "13800000000").await.unwrap_err();
        assert!(err.to_string().contains("Operation failed"));
    }
}

//! # smsrelay core library
//!
//! Relay client, acquisition controller, configuration and logging for leasing
//! virtual phone numbers from an SMS-relay service and polling them for
//! verification codes.

pub mod client;
pub mod controller;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use client::{RelayClient, SmsRelay, TransportError};
pub use controller::{AcquisitionController, ControllerError, OperationHandle, Outcome, StatusEvent};
pub use models::*;

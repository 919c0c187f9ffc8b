//! Data models for smsrelay

pub mod configuration;
pub mod relay;

pub use configuration::*;
pub use relay::*;

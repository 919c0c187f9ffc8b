//! Input checks performed before any request leaves the controller

use crate::models::Credentials;
use thiserror::Error;

/// A required input was missing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("Phone number is required")]
    MissingPhone,
}

pub fn validate_api_key(credentials: &Credentials) -> Result<(), ValidationError> {
    if credentials.is_empty() {
        return Err(ValidationError::MissingApiKey);
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().is_empty() {
        return Err(ValidationError::MissingPhone);
    }
    Ok(())
}

//! Client for the SMS-relay HTTP API.
//!
//! [`SmsRelay`] is the seam the acquisition controller talks to; [`RelayClient`]
//! is the reqwest-backed implementation. Neither retries: retry policy belongs
//! to the caller.

use crate::models::{Credentials, NumberRequest, RelayResponse, SmsQuery};
use async_trait::async_trait;
use thiserror::Error;

pub mod relay_client;

pub use relay_client::{RelayClient, DEFAULT_BASE_URL};

/// Transport-level failure talking to the relay service
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Network failure calling {endpoint}: {source}")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Relay service returned HTTP {status} for {endpoint}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The three exchanges offered by the relay service.
#[async_trait]
pub trait SmsRelay: Send + Sync {
    /// Lease a number, optionally a specific one and of a given card type.
    async fn acquire_number(
        &self,
        credentials: &Credentials,
        request: &NumberRequest,
    ) -> Result<RelayResponse, TransportError>;

    /// Fetch the latest SMS for a leased number matching the keyword.
    async fn fetch_sms(
        &self,
        credentials: &Credentials,
        query: &SmsQuery,
    ) -> Result<RelayResponse, TransportError>;

    /// Return a leased number to the service.
    async fn release_number(
        &self,
        credentials: &Credentials,
        phone: &str,
    ) -> Result<RelayResponse, TransportError>;
}

/// Query parameters for `getKeywordNumber`. An absent phone filter is left out.
pub(crate) fn acquire_params<'a>(
    credentials: &'a Credentials,
    request: &'a NumberRequest,
) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![("apikey", credentials.api_key())];
    if let Some(phone) = request.phone_filter.as_deref() {
        params.push(("phone", phone));
    }
    params.push(("cardType", request.card_type.wire_label()));
    params
}

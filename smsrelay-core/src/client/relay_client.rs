use crate::client::{acquire_params, SmsRelay, TransportError};
use crate::models::{Credentials, NumberRequest, RelayResponse, SmsQuery};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Production endpoint of the relay service
pub const DEFAULT_BASE_URL: &str = "http://lubansms.com/v2/api";

const ACQUIRE_NUMBER_PATH: &str = "getKeywordNumber";
const FETCH_SMS_PATH: &str = "getKeywordSms";
const RELEASE_NUMBER_PATH: &str = "delKeywordNumber";

/// Stateless HTTP client for the relay service; safe to share across operations.
#[derive(Debug, Clone)]
pub struct RelayClient {
    base_url: String,
    client: Client,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            client: Client::new(),
        }
    }

    /// Build a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Client)?;
        Ok(Self {
            base_url: normalize_base_url(base_url.into()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(
        &self,
        path: &'static str,
        params: &[(&str, &str)],
    ) -> Result<RelayResponse, TransportError> {
        tracing::debug!(endpoint = path, "Calling relay service");

        let response = self
            .client
            .get(self.endpoint(path))
            .query(params)
            .send()
            .await
            .map_err(|source| TransportError::Network {
                endpoint: path,
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Network {
                endpoint: path,
                source,
            })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                endpoint: path,
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let decoded = RelayResponse::from_body(body).map_err(|source| TransportError::Decode {
            endpoint: path,
            source,
        })?;
        tracing::debug!(endpoint = path, code = ?decoded.code(), "Relay service replied");
        Ok(decoded)
    }
}

fn normalize_base_url(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[async_trait]
impl SmsRelay for RelayClient {
    async fn acquire_number(
        &self,
        credentials: &Credentials,
        request: &NumberRequest,
    ) -> Result<RelayResponse, TransportError> {
        let params = acquire_params(credentials, request);
        self.get(ACQUIRE_NUMBER_PATH, &params).await
    }

    async fn fetch_sms(
        &self,
        credentials: &Credentials,
        query: &SmsQuery,
    ) -> Result<RelayResponse, TransportError> {
        let params = [
            ("apikey", credentials.api_key()),
            ("phone", query.phone.as_str()),
            ("keyword", query.keyword.as_str()),
        ];
        self.get(FETCH_SMS_PATH, &params).await
    }

    async fn release_number(
        &self,
        credentials: &Credentials,
        phone: &str,
    ) -> Result<RelayResponse, TransportError> {
        let params = [("apikey", credentials.api_key()), ("phone", phone)];
        self.get(RELEASE_NUMBER_PATH, &params).await
    }
}

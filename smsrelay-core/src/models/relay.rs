//! Relay service request and response types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Card type filter used when leasing a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Physical,
    Virtual,
    #[default]
    Any,
}

impl CardType {
    /// Label the relay service expects in the `cardType` query parameter.
    pub fn wire_label(&self) -> &'static str {
        match self {
            CardType::Physical => "实卡",
            CardType::Virtual => "虚卡",
            CardType::Any => "全部",
        }
    }

    /// Parse a user supplied card type. Unrecognized values fall back to `Any`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "physical" | "实卡" => CardType::Physical,
            "virtual" | "虚卡" => CardType::Virtual,
            _ => CardType::Any,
        }
    }
}

impl From<&str> for CardType {
    fn from(value: &str) -> Self {
        Self::parse_lenient(value)
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardType::Physical => "physical",
            CardType::Virtual => "virtual",
            CardType::Any => "any",
        };
        f.write_str(name)
    }
}

/// API key for the relay service. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into().trim().to_string(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .finish()
    }
}

/// Filters for leasing a number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberRequest {
    /// Specific number to lease; None leases any available number
    pub phone_filter: Option<String>,
    pub card_type: CardType,
}

impl NumberRequest {
    /// Build a request. A blank phone filter is treated as absent.
    pub fn new(phone_filter: Option<&str>, card_type: CardType) -> Self {
        let phone_filter = phone_filter
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Self {
            phone_filter,
            card_type,
        }
    }
}

/// Identifies which SMS to fetch for a leased number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsQuery {
    pub phone: String,
    /// Keyword the message must contain; may be empty
    pub keyword: String,
}

impl SmsQuery {
    pub fn new(phone: &str, keyword: &str) -> Self {
        Self {
            phone: phone.trim().to_string(),
            keyword: keyword.trim().to_string(),
        }
    }
}

/// Decoded response from the relay service.
///
/// The body is kept verbatim alongside its parsed form; only `code` and `msg`
/// carry meaning here.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    raw: String,
    body: Value,
}

impl RelayResponse {
    /// Parse a raw response body.
    pub fn from_body(raw: impl Into<String>) -> Result<Self, serde_json::Error> {
        let raw = raw.into();
        let body = serde_json::from_str(&raw)?;
        Ok(Self { raw, body })
    }

    pub fn from_value(body: Value) -> Self {
        Self {
            raw: body.to_string(),
            body,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Service status code; `0` means success.
    pub fn code(&self) -> Option<i64> {
        self.body.get("code").and_then(Value::as_i64)
    }

    /// Numeric `0`, integer or float, means success.
    pub fn is_success(&self) -> bool {
        self.body.get("code").and_then(Value::as_f64) == Some(0.0)
    }

    /// Message payload. Strings are returned as-is, anything else as JSON text.
    pub fn message(&self) -> Option<String> {
        match self.body.get("msg") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

impl fmt::Display for RelayResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_type_parsing() {
        assert_eq!(CardType::parse_lenient("physical"), CardType::Physical);
        assert_eq!(CardType::parse_lenient(" Virtual "), CardType::Virtual);
        assert_eq!(CardType::parse_lenient("实卡"), CardType::Physical);
        assert_eq!(CardType::parse_lenient("虚卡"), CardType::Virtual);
        assert_eq!(CardType::parse_lenient("全部"), CardType::Any);
        assert_eq!(CardType::parse_lenient("satellite"), CardType::Any);
        assert_eq!(CardType::parse_lenient(""), CardType::Any);
    }

    #[test]
    fn test_card_type_wire_labels() {
        assert_eq!(CardType::Physical.wire_label(), "实卡");
        assert_eq!(CardType::Virtual.wire_label(), "虚卡");
        assert_eq!(CardType::Any.wire_label(), "全部");
        assert_eq!(CardType::default(), CardType::Any);
    }

    #[test]
    fn test_credentials_are_trimmed_and_masked() {
        let credentials = Credentials::new("  secret-key \n");
        assert_eq!(credentials.api_key(), "secret-key");
        assert!(!format!("{:?}", credentials).contains("secret-key"));
        assert!(Credentials::new("   ").is_empty());
    }

    #[test]
    fn test_blank_phone_filter_is_absent() {
        assert_eq!(NumberRequest::new(Some("  "), CardType::Any).phone_filter, None);
        assert_eq!(
            NumberRequest::new(Some(" 13800000000 "), CardType::Physical).phone_filter,
            Some("13800000000".to_string())
        );
    }

    #[test]
    fn test_response_code_and_message() {
        let response = RelayResponse::from_body(r#"{"code":0,"msg":"Your code is 4821"}"#).unwrap();
        assert!(response.is_success());
        assert_eq!(response.message().as_deref(), Some("Your code is 4821"));

        let pending = RelayResponse::from_body(r#"{"code":1,"msg":null}"#).unwrap();
        assert!(!pending.is_success());
        assert_eq!(pending.message(), None);

        let structured = RelayResponse::from_body(r#"{"code":0,"msg":{"sms":"hi"}}"#).unwrap();
        assert_eq!(structured.message().as_deref(), Some(r#"{"sms":"hi"}"#));
    }

    #[test]
    fn test_response_without_integer_code_is_not_success() {
        let response = RelayResponse::from_body(r#"{"code":"0"}"#).unwrap();
        assert_eq!(response.code(), None);
        assert!(!response.is_success());
        assert!(RelayResponse::from_body("[]").unwrap().code().is_none());
    }

    #[test]
    fn test_float_zero_code_is_success() {
        let response = RelayResponse::from_body(r#"{"code":0.0,"msg":"code 9911"}"#).unwrap();
        assert!(response.is_success());
        assert_eq!(response.message().as_deref(), Some("code 9911"));

        let pending = RelayResponse::from_body(r#"{"code":1.0}"#).unwrap();
        assert!(!pending.is_success());
    }

    #[test]
    fn test_response_display_is_raw_body() {
        let raw = r#"{"numbers":["+15550001111"],"code":0}"#;
        let response = RelayResponse::from_body(raw).unwrap();
        assert_eq!(response.to_string(), raw);
    }
}

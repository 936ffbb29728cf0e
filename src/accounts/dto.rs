use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::Account;

// Request fields are optional so a missing field is reported as a 400 by the
// handler instead of a deserialization rejection.

/// Request body for signup.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub phone: Option<PhoneInput>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Clients send the phone either as a string or as a bare JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PhoneInput {
    Text(String),
    Digits(u64),
    /// Anything else is kept so the format check can reject it with its own message.
    Other(serde_json::Value),
}

impl PhoneInput {
    pub fn into_text(self) -> String {
        match self {
            PhoneInput::Text(s) => s,
            PhoneInput::Digits(n) => n.to_string(),
            PhoneInput::Other(v) => v.to_string(),
        }
    }
}

/// Request body for signin.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for profile update.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
}

/// Request body for password reset.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub email: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SigninResponse {
    pub message: String,
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub data: Account,
}

/// Plain `{"message": ...}` reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn phone_of(body: serde_json::Value) -> Option<String> {
        serde_json::from_value::<SignupRequest>(body)
            .expect("signup body deserializes")
            .phone
            .map(PhoneInput::into_text)
    }

    #[test]
    fn phone_accepts_string_or_number() {
        assert_eq!(phone_of(json!({ "phone": "1234567890" })).as_deref(), Some("1234567890"));
        assert_eq!(phone_of(json!({ "phone": 1234567890u64 })).as_deref(), Some("1234567890"));
        assert_eq!(phone_of(json!({})), None);
    }

    #[test]
    fn odd_phone_values_still_deserialize() {
        assert_eq!(phone_of(json!({ "phone": -1234567890i64 })).as_deref(), Some("-1234567890"));
        assert_eq!(phone_of(json!({ "phone": true })).as_deref(), Some("true"));
    }
}

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ActivityError;

/// A chat participant.
///
/// `user_id` is the stable unique key; `email` is display metadata and is
/// empty when the platform omits it. Two identities are the same entity
/// iff their `user_id` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

/// A message in the stream, validated. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
    pub message_id: String,
    pub sender: Identity,
    pub timestamp: DateTime<Utc>,
}

/// A user reference as the platform sends it.
///
/// `user_id` arrives as a JSON number or string depending on the endpoint;
/// `email` may be missing entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserRef {
    /// Resolve this reference into a typed [`Identity`].
    ///
    /// A missing or unusable `user_id` is a `DataShape` error; a missing
    /// email becomes an empty string.
    pub fn identity(&self) -> Result<Identity, ActivityError> {
        let raw = self
            .user_id
            .as_ref()
            .ok_or_else(|| ActivityError::DataShape("user record missing user_id".into()))?;
        let user_id = normalize_user_id(raw)
            .ok_or_else(|| ActivityError::DataShape(format!("unusable user_id value: {raw}")))?;
        Ok(Identity {
            user_id,
            email: self.email.clone().unwrap_or_default(),
        })
    }
}

/// One message as returned by the message-list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
}

impl MessageEnvelope {
    /// Validate and convert into a typed [`StreamMessage`].
    pub fn message(&self) -> Result<StreamMessage, ActivityError> {
        let message_id = self
            .message_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ActivityError::DataShape("message missing message_id".into()))?;
        let sender = self
            .user
            .as_ref()
            .ok_or_else(|| ActivityError::DataShape(format!("message {message_id} missing sender")))?
            .identity()?;
        let millis = self.timestamp.ok_or_else(|| {
            ActivityError::DataShape(format!("message {message_id} missing timestamp"))
        })?;
        let timestamp = Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
            ActivityError::DataShape(format!(
                "message {message_id} has out-of-range timestamp {millis}"
            ))
        })?;
        Ok(StreamMessage {
            message_id: message_id.to_string(),
            sender,
            timestamp,
        })
    }
}

/// One roster record from the membership endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
}

/// Read-receipt status for a single message.
///
/// An absent or empty `read` array is a valid answer: nobody has read the
/// message yet. It is not a lookup failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageStatus {
    #[serde(default)]
    pub read: Vec<UserRef>,
}

/// Wrapper shape of the membership endpoint response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipResponse {
    #[serde(default)]
    pub members: Vec<RosterMember>,
}

/// Normalize a raw user id into the stable join key.
///
/// Strings are trimmed (whitespace-insensitive identity) and must be
/// non-empty; numeric ids are rendered in decimal. Anything else is
/// unusable.
pub fn normalize_user_id(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

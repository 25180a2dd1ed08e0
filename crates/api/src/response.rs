//! Response envelope and server error shapes.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Fallback shown when the server gives us nothing usable.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Field keys checked, in order, when extracting a user-facing message from
/// a rejected mutation. `detail` and `message` are consulted after these.
const FIELD_PRIORITY: [&str; 5] = [
    "non_field_errors",
    "title",
    "place",
    "people_count",
    "experience",
];

/// Standard `{ success, data, message }` wrapper around every JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope<Value> {
    /// Unwrap the payload, treating `success: false` as a rejection carrying
    /// the server's message. Operations without a payload yield `null`.
    pub fn into_data(self) -> Result<Value, String> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(self.message.unwrap_or_else(|| GENERIC_FAILURE.to_string()))
        }
    }
}

/// Parsed body of a non-2xx response. Servers report either field-keyed
/// messages (string or list-of-strings per key), a `detail` string, or both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl ErrorBody {
    /// Parse the raw response text; a body that is not JSON becomes `detail`.
    pub fn from_raw(text: &str) -> Self {
        if let Ok(body) = serde_json::from_str::<ErrorBody>(text) {
            return body;
        }
        let trimmed = text.trim();
        Self {
            detail: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            ..Self::default()
        }
    }

    /// First field-level message by `FIELD_PRIORITY`, then `detail`, then
    /// `message`.
    pub fn first_error(&self) -> Option<String> {
        FIELD_PRIORITY
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(first_message))
            .or_else(|| self.detail.clone())
            .or_else(|| self.message.clone())
    }

    pub fn user_message(&self) -> String {
        self.first_error()
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    }
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_unwraps_payload() {
        let envelope: Envelope<Value> =
            serde_json::from_str(r#"{"success": true, "data": {"id": 7}}"#).unwrap();
        assert_eq!(envelope.into_data().unwrap()["id"], 7);
    }

    #[test]
    fn envelope_rejection_carries_message() {
        let envelope: Envelope<Value> =
            serde_json::from_str(r#"{"success": false, "message": "nope"}"#).unwrap();
        assert_eq!(envelope.into_data().unwrap_err(), "nope");
    }

    #[test]
    fn field_errors_follow_priority_order() {
        let body = ErrorBody::from_raw(
            r#"{"experience": ["too short"], "title": ["title taken"], "detail": "bad request"}"#,
        );
        assert_eq!(body.first_error().as_deref(), Some("title taken"));
    }

    #[test]
    fn detail_wins_over_unknown_fields() {
        let body = ErrorBody::from_raw(r#"{"price": ["whatever"], "detail": "bad request"}"#);
        assert_eq!(body.first_error().as_deref(), Some("bad request"));
    }

    #[test]
    fn non_json_body_becomes_detail() {
        let body = ErrorBody::from_raw("upstream exploded");
        assert_eq!(body.first_error().as_deref(), Some("upstream exploded"));
    }

    #[test]
    fn empty_body_falls_back_to_generic() {
        let body = ErrorBody::from_raw("");
        assert_eq!(body.first_error(), None);
        assert_eq!(body.user_message(), GENERIC_FAILURE);
    }
}

//! Uniform JSON envelope: `{success, message?, data?}`.
//!
//! Business outcomes (including rejections) always travel in this envelope
//! with HTTP 200; only unexpected faults surface as transport errors.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Soft rejection that still carries a payload (the online-without-review
    /// admission response).
    pub fn rejected_with(data: T) -> Self {
        Self {
            success: false,
            message: None,
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Success with no payload.
pub fn ok_empty() -> Envelope<serde_json::Value> {
    Envelope {
        success: true,
        message: None,
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_omits_message() {
        let body = serde_json::to_value(Envelope::ok(serde_json::json!({"publishId": 7}))).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": true, "data": {"publishId": 7}})
        );
    }

    #[test]
    fn fail_envelope_omits_data() {
        let body =
            serde_json::to_value(Envelope::<serde_json::Value>::fail("out of range")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": false, "message": "out of range"})
        );
    }

    #[test]
    fn soft_rejection_carries_data_without_message() {
        let body = serde_json::to_value(Envelope::rejected_with(
            serde_json::json!({"text": "review required"}),
        ))
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": false, "data": {"text": "review required"}})
        );
    }
}

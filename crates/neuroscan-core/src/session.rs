//! Per-client session state: last prediction and conversation history.
//!
//! Sessions are keyed by an opaque token and serialized as JSON when stored
//! in the durable backend, so every field tolerates absence on read.

use serde::{Deserialize, Serialize};

/// Sentinel stored as `last_prediction` when an upload fails domain
/// validation. Downstream checks match on the `invalid` prefix.
pub const INVALID_IMAGE_SENTINEL: &str = "invalid image";

/// True when a stored prediction value is the invalid-image sentinel.
pub fn is_invalid_label(label: &str) -> bool {
    label.to_lowercase().starts_with("invalid")
}

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn. History is append-only, insertion order significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub message: String,
}

/// Server-side state for one client.
///
/// `last_prediction` holds either a label from the catalog or
/// [`INVALID_IMAGE_SENTINEL`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prediction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_confidence: Option<f64>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

impl Session {
    /// Append one turn to the conversation history.
    pub fn push_turn(&mut self, role: Role, message: impl Into<String>) {
        self.history.push(ChatTurn {
            role,
            message: message.into(),
        });
    }

    /// Record a prediction outcome, overwriting any previous one.
    pub fn record_prediction(&mut self, label: impl Into<String>, confidence: f64) {
        self.last_prediction = Some(label.into());
        self.last_confidence = Some(confidence);
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_is_empty() {
        let s = Session::default();
        assert!(s.last_prediction.is_none());
        assert!(s.last_confidence.is_none());
        assert!(s.history.is_empty());
    }

    #[test]
    fn json_roundtrip_preserves_history_order() {
        let mut s = Session::default();
        s.record_prediction("glioma_tumor", 0.91);
        s.push_turn(Role::User, "what does this mean?");
        s.push_turn(Role::Assistant, "a glioma was detected");

        let json = serde_json::to_string(&s).unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
        assert_eq!(parsed.history[0].role, Role::User);
        assert_eq!(parsed.history[1].role, Role::Assistant);
    }

    #[test]
    fn deserializes_sparse_session_blob() {
        // Durable-backend blobs written before a prediction only carry history.
        let parsed: Session = serde_json::from_str(r#"{"history": []}"#).unwrap();
        assert_eq!(parsed, Session::default());
    }

    #[test]
    fn sentinel_detection_is_prefix_based() {
        assert!(is_invalid_label(INVALID_IMAGE_SENTINEL));
        assert!(is_invalid_label("Invalid image - not a scan"));
        assert!(!is_invalid_label("glioma_tumor"));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}

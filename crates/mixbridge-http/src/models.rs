//! Request and response models for the HTTP API.
//!
//! Core types are never serialized directly; route modules convert
//! them into these structs with free functions.

use serde::{Deserialize, Serialize};

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub target: String,
    pub listen_port: u16,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: String,
    pub strips_known: bool,
    pub enumeration_complete: bool,
}

/// Generic acknowledgement for fire-and-forget commands.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

// =============================================================================
// Strips
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Strip {
    pub ssid: i32,
    pub name: String,
    pub muted: bool,
    pub soloed: bool,
}

#[derive(Debug, Serialize)]
pub struct StripDetail {
    pub ssid: i32,
    pub kind: String,
    pub name: String,
    pub inputs: i32,
    pub outputs: i32,
    pub muted: bool,
    pub soloed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValueSet {
    pub value: f32,
}

#[derive(Debug, Deserialize)]
pub struct BoolSet {
    pub state: bool,
}

// =============================================================================
// Plugins & parameters
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Plugin {
    pub id: usize,
    pub name: String,
    pub kind: String,
    pub enabled: bool,
    pub parameter_count: usize,
}

#[derive(Debug, Serialize)]
pub struct Parameter {
    pub id: i32,
    pub name: String,
    pub value: f64,
    pub real_value: f64,
    pub display: String,
    pub unit: String,
    pub kind: String,
    pub min: f64,
    pub max: f64,
    pub controllable: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Unit-keyed parameter value. Exactly one field should be set; the
/// populated field selects the conversion to the normalized range.
#[derive(Debug, Default, Deserialize)]
pub struct ParameterSet {
    pub db: Option<f64>,
    pub hz: Option<f64>,
    pub ratio: Option<f64>,
    pub percent: Option<f64>,
    pub ms: Option<f64>,
    pub sec: Option<f64>,
    pub q: Option<f64>,
    pub value: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ParameterSetResult {
    pub name: String,
    pub id: i32,
    /// Normalized value that went out on the wire.
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Serialize)]
pub struct Suggestions {
    pub input: String,
    pub suggestions: Vec<String>,
}

// =============================================================================
// Selection
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Selection {
    pub strip_id: Option<i32>,
    pub plugin_id: Option<usize>,
    pub mode: String,
    pub expanded: bool,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectStripRequest {
    pub ssid: i32,
}

#[derive(Debug, Deserialize)]
pub struct ExpandRequest {
    pub ssid: i32,
    #[serde(default = "default_true")]
    pub expanded: bool,
}

/// Plugin selection: absolute `id` or relative `delta`, optionally
/// adopting a new strip.
#[derive(Debug, Deserialize)]
pub struct SelectPluginRequest {
    pub id: Option<usize>,
    pub delta: Option<i32>,
    pub ssid: Option<i32>,
}

// =============================================================================
// Transport & session
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f32,
}

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotRequest {
    #[serde(default)]
    pub switch_to_new: bool,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            suggestions: None,
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("bad_request", message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new("conflict", message)
    }

    pub fn invalid_value(message: &str) -> Self {
        Self::new("invalid_value", message)
    }

    pub fn send_failed(message: &str) -> Self {
        Self::new("send_failed", message)
    }

    pub fn internal(message: &str) -> Self {
        Self::new("internal_error", message)
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        if !suggestions.is_empty() {
            self.suggestions = Some(suggestions);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_omits_empty_suggestions() {
        let plain = serde_json::to_string(&ErrorResponse::not_found("nope")).unwrap();
        assert!(!plain.contains("suggestions"));

        let with = serde_json::to_string(
            &ErrorResponse::not_found("nope").with_suggestions(vec!["Threshold".to_string()]),
        )
        .unwrap();
        assert!(with.contains("\"suggestions\":[\"Threshold\"]"));

        // An empty suggestion list stays omitted.
        let empty = serde_json::to_string(
            &ErrorResponse::not_found("nope").with_suggestions(Vec::new()),
        )
        .unwrap();
        assert!(!empty.contains("suggestions"));
    }

    #[test]
    fn test_parameter_set_unit_keys() {
        let req: ParameterSet = serde_json::from_str(r#"{"db": -6.0}"#).unwrap();
        assert_eq!(req.db, Some(-6.0));
        assert_eq!(req.hz, None);

        let empty: ParameterSet = serde_json::from_str("{}").unwrap();
        assert!(empty.db.is_none() && empty.value.is_none());
    }

    #[test]
    fn test_activate_defaults_to_true() {
        let req: ActivateRequest = serde_json::from_str("{}").unwrap();
        assert!(req.active);
        let req: ActivateRequest = serde_json::from_str(r#"{"active": false}"#).unwrap();
        assert!(!req.active);
    }

    #[test]
    fn test_snapshot_request_defaults() {
        let req: SnapshotRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.switch_to_new);
    }
}

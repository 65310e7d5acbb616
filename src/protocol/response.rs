//! Parsing of robot controller replies. Every reply is a JSON document with
//! six fixed top-level keys; the `Result` value is endpoint-specific and is
//! kept untyped for the caller to interpret.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Key inside the `Status` map that carries the robot's coarse state.
pub const STATUS_KEY: &str = "Status";

/// One parsed reply from the robot controller.
///
/// Constructed only by [`ResponsePayload::parse`]; a body missing any of
/// the required keys never produces a partially-populated payload.
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Status")]
    pub status: HashMap<String, String>,
    #[serde(rename = "LastID")]
    pub last_id: i64,
    /// 0 means no error.
    #[serde(rename = "ErrorCode")]
    pub error_code: i64,
    /// "NA" when there is no error.
    #[serde(rename = "ErrorMessage")]
    pub error_message: String,
    /// Endpoint-specific value; can be a scalar, object, array, or null.
    #[serde(rename = "Result")]
    pub result: Value,
}

impl ResponsePayload {
    /// Parse a raw reply body. Fails with
    /// [`ClientError::MalformedResponse`] when the body is not valid JSON
    /// or lacks one of the required top-level keys.
    pub fn parse(raw: &[u8]) -> ClientResult<Self> {
        serde_json::from_slice(raw).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    /// The robot state advertised in the `Status` map, when present.
    pub fn state(&self) -> Option<RobotState> {
        self.status
            .get(STATUS_KEY)
            .map(|s| RobotState::from(s.as_str()))
    }

    pub fn is_error(&self) -> bool {
        self.error_code != 0
    }
}

/// Coarse robot state as observed via `Status.Status`.
///
/// The robot walks `Idle -> Busy -> {Idle, Error, Dialog}`; `Dialog` needs
/// an explicit close-dialog action and `Error` an explicit reset before the
/// robot returns to `Idle`. The client only observes these transitions,
/// it never enforces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotState {
    Idle,
    Busy,
    Error,
    Dialog,
    /// Any state string the client does not recognize.
    Other(String),
}

impl RobotState {
    pub fn as_str(&self) -> &str {
        match self {
            RobotState::Idle => "Idle",
            RobotState::Busy => "Busy",
            RobotState::Error => "Error",
            RobotState::Dialog => "Dialog",
            RobotState::Other(s) => s,
        }
    }
}

impl From<&str> for RobotState {
    fn from(s: &str) -> Self {
        match s {
            "Idle" => RobotState::Idle,
            "Busy" => RobotState::Busy,
            "Error" => RobotState::Error,
            "Dialog" => RobotState::Dialog,
            other => RobotState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body_with_result(result: Value) -> Vec<u8> {
        json!({
            "Time": "2024-05-17 09:30:12",
            "Status": {"Status": "Idle"},
            "LastID": 42,
            "ErrorCode": 0,
            "ErrorMessage": "NA",
            "Result": result,
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_parse_round_trip_for_all_result_shapes() {
        let shapes = vec![
            json!("Home"),
            json!(3.5),
            json!({"Position": {"X": 0, "Y": 0, "Z": 500}}),
            json!(["Home", "Waste", "Probe"]),
            Value::Null,
        ];

        for shape in shapes {
            let raw = body_with_result(shape.clone());
            let payload = ResponsePayload::parse(&raw).unwrap();
            assert_eq!(payload.time, "2024-05-17 09:30:12");
            assert_eq!(payload.status.get("Status").unwrap(), "Idle");
            assert_eq!(payload.last_id, 42);
            assert_eq!(payload.error_code, 0);
            assert_eq!(payload.error_message, "NA");
            assert_eq!(payload.result, shape);

            // Re-serializing reproduces the input field-for-field
            let reserialized: Value = serde_json::to_value(&payload).unwrap();
            let original: Value = serde_json::from_slice(&raw).unwrap();
            assert_eq!(reserialized, original);
        }
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let result = ResponsePayload::parse(b"not json at all");
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));

        let result = ResponsePayload::parse(b"");
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_rejects_missing_keys() {
        let full: Value = serde_json::from_slice(&body_with_result(Value::Null)).unwrap();
        for key in ["Time", "Status", "LastID", "ErrorCode", "ErrorMessage", "Result"] {
            let mut trimmed = full.clone();
            trimmed.as_object_mut().unwrap().remove(key);
            let raw = trimmed.to_string().into_bytes();
            let result = ResponsePayload::parse(&raw);
            assert!(
                matches!(result, Err(ClientError::MalformedResponse(_))),
                "parse accepted a body missing {}",
                key
            );
        }
    }

    #[test]
    fn test_parse_rejects_non_object_body() {
        let result = ResponsePayload::parse(b"[1, 2, 3]");
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
    }

    #[test]
    fn test_state_observation() {
        let payload = ResponsePayload::parse(&body_with_result(Value::Null)).unwrap();
        assert_eq!(payload.state(), Some(RobotState::Idle));
        assert!(!payload.is_error());

        let raw = json!({
            "Time": "t",
            "Status": {"Status": "Dispensing"},
            "LastID": 1,
            "ErrorCode": 17,
            "ErrorMessage": "nozzle clog",
            "Result": null,
        })
        .to_string();
        let payload = ResponsePayload::parse(raw.as_bytes()).unwrap();
        assert_eq!(
            payload.state(),
            Some(RobotState::Other("Dispensing".to_string()))
        );
        assert!(payload.is_error());
    }
}

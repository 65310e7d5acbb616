//! Shared types for the capability layer: the on-disk record format, the
//! endpoint kind, and the in-memory table published by discovery.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed prefix every robot endpoint path starts with.
pub const API_PREFIX: &str = "/DoD/";

/// What an endpoint does, as far as the client cares: read-only query,
/// actuating command, or session management.
///
/// Records written by this client carry the kind explicitly, decided once
/// at authoring time. Records without it (legacy and hand-edited files)
/// fall back to the lexical path rules in [`EndpointKind::from_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Get,
    Do,
    Connect,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Get => "get",
            EndpointKind::Do => "do",
            EndpointKind::Connect => "connect",
        }
    }

    /// Classify a path lexically: segment after the prefix starting with
    /// "get" or "do", or a path containing "connect" case-insensitively.
    pub fn from_path(api: &str) -> Option<EndpointKind> {
        let rest = api.strip_prefix(API_PREFIX)?;
        if rest.starts_with("get") {
            Some(EndpointKind::Get)
        } else if rest.starts_with("do") {
            Some(EndpointKind::Do)
        } else if api.to_lowercase().contains("connect") {
            Some(EndpointKind::Connect)
        } else {
            None
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One known endpoint as persisted in the capability file.
///
/// `api` is the path template, e.g. `/DoD/do/Move?PositionName={value}`;
/// `payload` is the last-cached example reply body for the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRecord {
    #[serde(rename = "API")]
    pub api: String,
    /// Declared parameter shape, if the endpoint takes any.
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "__comments__", default)]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EndpointKind>,
}

impl CapabilityRecord {
    /// Effective kind: the explicit field when present, lexical otherwise.
    pub fn effective_kind(&self) -> Option<EndpointKind> {
        self.kind.or_else(|| EndpointKind::from_path(&self.api))
    }

    /// Action segment of the path, e.g. "Move" for
    /// `/DoD/do/Move?PositionName={value}`.
    pub fn action(&self) -> &str {
        action_of(&self.api)
    }
}

/// Action segment of a path template: the last path segment before any
/// query string.
pub(crate) fn action_of(api: &str) -> &str {
    let base = api.split('?').next().unwrap_or(api);
    base.rsplit('/').next().unwrap_or(base)
}

/// Three-way partition of the known endpoints, rebuilt in full on every
/// discovery pass and published read-only by the client.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    /// Read-only query paths.
    pub get: Vec<String>,
    /// Actuating path templates mapped to the enumerated legal argument
    /// values the robot reported, or `None` where resolution has not
    /// happened (continuous-range endpoints, failures, unresolved yet).
    pub do_args: HashMap<String, Option<Value>>,
    /// Connect/disconnect paths.
    pub connect: Vec<String>,
}

impl CapabilityTable {
    /// Legal values for the `do` endpoint whose action segment is `action`,
    /// flattened to strings for argument validation. Empty when the
    /// endpoint is unknown or its enumeration is unresolved.
    pub fn do_values(&self, action: &str) -> Vec<String> {
        let values = self
            .do_args
            .iter()
            .find(|(api, _)| action_of(api) == action)
            .and_then(|(_, values)| values.as_ref());
        match values {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(other) => vec![other.to_string()],
            None => Vec::new(),
        }
    }

    /// Names of the read-only endpoints, e.g. "Status" for
    /// `/DoD/get/Status`.
    pub fn get_names(&self) -> Vec<String> {
        self.get.iter().map(|api| action_of(api).to_string()).collect()
    }
}

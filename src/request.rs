//! Request and result types exchanged with the HTTP layer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A simulated request to resolve.
///
/// Deserializes from the proxy payload (`environmentId`, `path`, `method`,
/// `query`, `headers`, `body`); the project comes from the caller's
/// credentials rather than the payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockRequest {
    #[serde(default)]
    pub project_id: String,

    /// Environment to use; the project's default environment when absent
    #[serde(default)]
    pub environment_id: Option<String>,

    pub path: String,

    pub method: String,

    #[serde(default)]
    pub query: HashMap<String, String>,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request body; a string is parsed as JSON for body conditions
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Error returned when a request payload is missing required fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("path and method are required")]
pub struct MissingField;

impl MockRequest {
    /// Create a request with empty query, headers and body.
    pub fn new(project_id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    /// Reject payloads without a path or method.
    pub fn validate(&self) -> Result<(), MissingField> {
        if self.path.is_empty() || self.method.trim().is_empty() {
            return Err(MissingField);
        }
        Ok(())
    }
}

/// A concrete mocked response chosen for a request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockedResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
    /// Milliseconds the transport should wait before answering
    pub delay: u64,
    pub endpoint_id: String,
    pub response_id: String,
}

/// Why a request was not mocked. Only used for diagnostics; callers see
/// `mockFound: false` in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// No enabled environment for the project (or the requested id)
    NoEnvironment,
    /// The environment's mode forbids mocking this path
    PolicyDenied,
    /// Mocking was allowed but no endpoint produced a response
    NoMatch,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::NoEnvironment => "no_environment",
            MissReason::PolicyDenied => "policy_denied",
            MissReason::NoMatch => "no_match",
        }
    }
}

/// Internal outcome of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Mocked(MockedResponse),
    Miss(MissReason),
}

/// Result handed back to the HTTP layer.
///
/// Serializes to `{"mockFound":false}` or to `{"mockFound":true,
/// "statusCode":..,"headers":..,"body":..,"delay":..,"endpointId":..,
/// "responseId":..}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockResult {
    pub mock_found: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub response: Option<MockedResponse>,
}

impl MockResult {
    pub fn not_found() -> Self {
        Self {
            mock_found: false,
            response: None,
        }
    }

    pub fn found(response: MockedResponse) -> Self {
        Self {
            mock_found: true,
            response: Some(response),
        }
    }
}

impl From<Resolution> for MockResult {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Mocked(response) => MockResult::found(response),
            Resolution::Miss(_) => MockResult::not_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_proxy_payload() {
        let payload = r#"{
            "environmentId": "env-1",
            "path": "/api/users/42",
            "method": "get",
            "headers": {"X-Api-Version": "2"},
            "body": null
        }"#;
        let request: MockRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(request.environment_id.as_deref(), Some("env-1"));
        assert_eq!(request.method, "get");
        assert!(request.query.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_path_and_method() {
        assert_eq!(MockRequest::new("p", "", "/a").validate(), Err(MissingField));
        assert_eq!(MockRequest::new("p", "GET", "").validate(), Err(MissingField));
    }

    #[test]
    fn test_not_found_serialization() {
        let json = serde_json::to_string(&MockResult::not_found()).unwrap();
        assert_eq!(json, r#"{"mockFound":false}"#);
    }

    #[test]
    fn test_found_serialization() {
        let result = MockResult::found(MockedResponse {
            status_code: 200,
            headers: BTreeMap::from([("X-Mock".to_string(), "1".to_string())]),
            body: json!({"ok": true}),
            delay: 0,
            endpoint_id: "ep-1".to_string(),
            response_id: "resp-1".to_string(),
        });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "mockFound": true,
                "statusCode": 200,
                "headers": {"X-Mock": "1"},
                "body": {"ok": true},
                "delay": 0,
                "endpointId": "ep-1",
                "responseId": "resp-1"
            })
        );
    }

    #[test]
    fn test_resolution_collapses_misses() {
        for reason in [
            MissReason::NoEnvironment,
            MissReason::PolicyDenied,
            MissReason::NoMatch,
        ] {
            assert_eq!(MockResult::from(Resolution::Miss(reason)), MockResult::not_found());
        }
    }
}

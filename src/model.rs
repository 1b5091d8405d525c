//! Rule data model.
//!
//! Environments own endpoints, endpoints own responses, and both endpoints
//! and responses may be gated by conditions. The engine only ever reads
//! these values; whoever stores them owns their lifecycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A named rule-set scope within a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    /// Unique identifier
    pub id: String,

    /// Owning project
    pub project_id: String,

    /// Display name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Policy for which traffic gets mocked
    #[serde(default)]
    pub mode: Mode,

    /// Glob patterns mocked in `whitelist` mode
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Glob patterns never mocked in `blacklist` mode
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Whether this is the project's default environment
    #[serde(default)]
    pub is_default: bool,

    /// Whether this environment is active
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

/// Environment-wide mock policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Mock only requests that hit a defined endpoint
    #[default]
    Selective,
    /// Attempt to mock everything
    Global,
    /// Mock only paths matching a whitelist pattern
    Whitelist,
    /// Mock everything except paths matching a blacklist pattern
    Blacklist,
    /// Any mode value this engine does not know; never mocks
    #[serde(other)]
    Unknown,
}

/// HTTP verbs an endpoint can be registered for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a supported HTTP verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    /// Parse a method name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// A method + path-template rule within an environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    /// Unique identifier
    pub id: String,

    /// Owning environment (filled in by the store when nested in a rule set)
    #[serde(default)]
    pub environment_id: String,

    /// Path template, e.g. `/api/users/:id` or `/api/files/*`
    pub path: String,

    /// HTTP method
    pub method: Method,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Whether this endpoint is active
    #[serde(default = "default_true")]
    pub is_enabled: bool,

    /// Ascending tie-break among endpoints (lower = tried first)
    #[serde(default)]
    pub order: i32,

    /// Conditions that must all hold for the endpoint to apply
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Candidate responses
    #[serde(default)]
    pub responses: Vec<Response>,
}

/// One synthetic HTTP response attached to an endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    /// Unique identifier
    pub id: String,

    /// Owning endpoint (filled in by the store when nested in a rule set)
    #[serde(default)]
    pub endpoint_id: String,

    /// Optional display name
    #[serde(default)]
    pub name: Option<String>,

    /// HTTP status code
    #[serde(default = "default_status")]
    pub status_code: u16,

    /// Response body, passed through verbatim
    #[serde(default)]
    pub body: serde_json::Value,

    /// Response headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Delay the transport should apply before answering (ms)
    #[serde(default)]
    pub delay: u64,

    /// Fallback response when no conditional response matches
    #[serde(default)]
    pub is_default: bool,

    /// Whether this response is a candidate at all
    #[serde(default = "default_true")]
    pub is_enabled: bool,

    /// Ascending tie-break among responses
    #[serde(default)]
    pub order: i32,

    /// Conditions that must all hold for the response to be chosen
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// An atomic predicate over one facet of the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    #[serde(default)]
    pub id: String,

    /// Which part of the request the key refers to
    #[serde(rename = "type")]
    pub kind: ConditionType,

    /// Parameter name, header name or JSON path
    pub key: String,

    pub operator: Operator,

    /// Comparison operand (unused by `exists`/`not_exists`)
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub is_case_sensitive: bool,

    #[serde(default)]
    pub order: i32,
}

/// Request facet a condition reads from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    PathParam,
    QueryParam,
    Header,
    BodyJsonPath,
    /// Unrecognized type; never yields a value
    #[serde(other)]
    Unknown,
}

/// Comparison applied to the extracted value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    Contains,
    Matches,
    GreaterThan,
    LessThan,
    Exists,
    NotExists,
    /// Unrecognized operator; always evaluates to false
    #[serde(other)]
    Unknown,
}

fn default_true() -> bool {
    true
}

fn default_status() -> u16 {
    200
}

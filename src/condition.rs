//! Condition evaluation.
//!
//! Conditions are evaluated against a [`RequestContext`] assembled once per
//! request. Evaluation is total: a missing value, an unparseable body, a bad
//! regex or a non-numeric operand make the condition false instead of
//! surfacing an error.

use crate::model::{Condition, ConditionType, Operator};
use regex::RegexBuilder;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

/// Request facets visible to conditions.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Parameters bound by the endpoint's path template
    pub path_params: &'a HashMap<String, String>,
    /// Query parameters
    pub query: &'a HashMap<String, String>,
    /// Request headers
    pub headers: &'a HashMap<String, String>,
    /// Request body; `Null` when the body was absent or not valid JSON
    pub body: Cow<'a, Value>,
}

impl<'a> RequestContext<'a> {
    /// Build a context, decoding a string body as JSON.
    ///
    /// A string that is not valid JSON becomes `Null`, so JSON path
    /// conditions on it see no value.
    pub fn new(
        path_params: &'a HashMap<String, String>,
        query: &'a HashMap<String, String>,
        headers: &'a HashMap<String, String>,
        body: &'a Value,
    ) -> Self {
        let body = match body {
            Value::String(raw) => Cow::Owned(serde_json::from_str(raw).unwrap_or(Value::Null)),
            other => Cow::Borrowed(other),
        };

        Self {
            path_params,
            query,
            headers,
            body,
        }
    }
}

/// Check that every condition holds. An empty list always holds.
pub fn all_hold(conditions: &[Condition], context: &RequestContext<'_>) -> bool {
    conditions.iter().all(|condition| evaluate(condition, context))
}

/// Evaluate a single condition.
pub fn evaluate(condition: &Condition, context: &RequestContext<'_>) -> bool {
    let extracted = extract(condition, context);

    let actual = match (condition.operator, extracted) {
        (Operator::Exists, value) => return value.is_some(),
        (Operator::NotExists, value) => return value.is_none(),
        (_, None) => return false,
        (_, Some(value)) => value,
    };

    let case_sensitive = condition.is_case_sensitive;
    let expected = condition.value.as_deref();

    match condition.operator {
        Operator::Equals => expected
            .is_some_and(|expected| fold(&actual, case_sensitive) == fold(expected, case_sensitive)),
        Operator::Contains => expected.is_some_and(|expected| {
            let needle = fold(expected, case_sensitive);
            !needle.is_empty() && fold(&actual, case_sensitive).contains(&*needle)
        }),
        Operator::Matches => {
            match RegexBuilder::new(expected.unwrap_or(""))
                .case_insensitive(!case_sensitive)
                .build()
            {
                Ok(regex) => regex.is_match(&actual),
                Err(e) => {
                    tracing::debug!(condition_id = %condition.id, error = %e, "Invalid condition regex");
                    false
                }
            }
        }
        Operator::GreaterThan => compare_numbers(&actual, expected, |a, b| a > b),
        Operator::LessThan => compare_numbers(&actual, expected, |a, b| a < b),
        Operator::Exists | Operator::NotExists | Operator::Unknown => false,
    }
}

/// Pull the value a condition refers to out of the request.
///
/// Empty path, query and header values are treated as absent.
fn extract<'c>(condition: &Condition, context: &'c RequestContext<'_>) -> Option<Cow<'c, str>> {
    let value = match condition.kind {
        ConditionType::PathParam => context.path_params.get(&condition.key),
        ConditionType::QueryParam => context.query.get(&condition.key),
        ConditionType::Header if condition.is_case_sensitive => context.headers.get(&condition.key),
        ConditionType::Header => header_ignore_case(context.headers, &condition.key),
        ConditionType::BodyJsonPath => {
            return json_path(&context.body, &condition.key).and_then(scalar_text);
        }
        ConditionType::Unknown => None,
    };

    value
        .filter(|v| !v.is_empty())
        .map(|v| Cow::Borrowed(v.as_str()))
}

/// Case-insensitive header lookup.
///
/// An exact key wins; otherwise the lexicographically smallest key that
/// differs only in case.
fn header_ignore_case<'h>(headers: &'h HashMap<String, String>, name: &str) -> Option<&'h String> {
    headers.get(name).or_else(|| {
        headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, v)| v)
    })
}

/// Walk a dot-separated path (optionally prefixed by `$.`) through `root`.
fn json_path<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Array(_) | Value::Object(_) => Some(Cow::Owned(value.to_string())),
    }
}

fn fold(value: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.to_lowercase())
    }
}

fn compare_numbers(actual: &str, expected: Option<&str>, cmp: impl Fn(f64, f64) -> bool) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    match (parse_finite(actual), parse_finite(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// Parse a number, rejecting `inf`, `infinity` and `NaN`.
fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

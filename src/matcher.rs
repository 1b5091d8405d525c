//! Path matching.
//!
//! Two independent matchers live here:
//!
//! - [`match_path`] matches endpoint path templates segment by segment and
//!   extracts `:name` parameters. It never builds a regex.
//! - [`matches_glob`] matches free-form whitelist/blacklist patterns by
//!   converting them into an anchored regex.

use regex::Regex;
use std::collections::HashMap;

/// Result of matching a request path against an endpoint template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    /// Whether the template accepted the path
    pub matched: bool,
    /// Parameters bound by `:name` segments
    pub params: HashMap<String, String>,
}

impl PathMatch {
    fn miss() -> Self {
        Self::default()
    }

    fn hit(params: HashMap<String, String>) -> Self {
        Self {
            matched: true,
            params,
        }
    }
}

enum TemplateSegment<'a> {
    Literal(&'a str),
    Param(&'a str),
    Wildcard,
}

impl<'a> TemplateSegment<'a> {
    fn parse(segment: &'a str) -> Self {
        if let Some(name) = segment.strip_prefix(':') {
            TemplateSegment::Param(name)
        } else if segment == "*" {
            TemplateSegment::Wildcard
        } else {
            TemplateSegment::Literal(segment)
        }
    }
}

/// Match `path` against an endpoint path `template`.
///
/// Both are split on `/`. With equal segment counts every segment must
/// agree: `:name` binds the raw request segment, `*` accepts any single
/// segment and anything else must be equal (case-sensitive). With differing
/// counts the template only matches when its last segment is `*`, in which
/// case the request must start with the literal segments before it; no
/// parameters are bound.
pub fn match_path(template: &str, path: &str) -> PathMatch {
    let template_parts: Vec<&str> = template.split('/').collect();
    let path_parts: Vec<&str> = path.split('/').collect();

    if template_parts.len() == path_parts.len() {
        return match walk_segments(&template_parts, &path_parts) {
            Some(params) => PathMatch::hit(params),
            None => PathMatch::miss(),
        };
    }

    // Trailing wildcard: everything at or below the literal prefix
    if let Some((&"*", prefix)) = template_parts.split_last() {
        if path_parts.len() >= prefix.len() && prefix.iter().zip(&path_parts).all(|(t, p)| t == p) {
            return PathMatch::hit(HashMap::new());
        }
    }

    PathMatch::miss()
}

fn walk_segments(template: &[&str], path: &[&str]) -> Option<HashMap<String, String>> {
    let mut params = HashMap::new();

    for (pattern, actual) in template.iter().zip(path) {
        match TemplateSegment::parse(pattern) {
            TemplateSegment::Param(name) => {
                params.insert(name.to_string(), (*actual).to_string());
            }
            TemplateSegment::Wildcard => {}
            TemplateSegment::Literal(lit) => {
                if lit != *actual {
                    return None;
                }
            }
        }
    }

    Some(params)
}

/// Match `path` against a whitelist/blacklist glob pattern.
///
/// `*` matches any run of characters (including `/`), `:name` matches one
/// non-empty segment, all other characters are literal.
pub fn matches_glob(path: &str, pattern: &str) -> bool {
    match Regex::new(&glob_to_regex(pattern)) {
        Ok(regex) => regex.is_match(path),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "Invalid glob pattern");
            false
        }
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::from("^");
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '*' => {
                regex.push_str(&regex::escape(&literal));
                literal.clear();
                regex.push_str(".*");
            }
            ':' if chars.peek().is_some_and(|next| *next != '/') => {
                regex.push_str(&regex::escape(&literal));
                literal.clear();
                // Parameter name runs up to the next slash
                while chars.next_if(|next| *next != '/').is_some() {}
                regex.push_str("[^/]+");
            }
            _ => literal.push(ch),
        }
    }

    regex.push_str(&regex::escape(&literal));
    regex.push('$');
    regex
}

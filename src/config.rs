//! Rule-set configuration.
//!
//! A rule set is a YAML document declaring environments with their nested
//! endpoints, responses and conditions, plus resolver settings.

use crate::model::{Condition, Endpoint, Environment, Operator, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Top-level rule-set document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    /// Environments and their rules
    #[serde(default)]
    pub environments: Vec<EnvironmentDefinition>,

    /// Resolver settings
    #[serde(default)]
    pub settings: ResolverSettings,
}

impl RuleSetConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut environment_ids = HashSet::new();
        let mut default_projects = HashSet::new();
        let mut endpoint_ids = HashSet::new();

        for (i, definition) in self.environments.iter().enumerate() {
            let env = &definition.environment;
            if env.id.is_empty() {
                anyhow::bail!("Environment {}: id cannot be empty", i);
            }
            if !environment_ids.insert(env.id.as_str()) {
                anyhow::bail!("Environment {}: duplicate id", env.id);
            }
            if env.is_default && !default_projects.insert(env.project_id.as_str()) {
                anyhow::bail!(
                    "Environment {}: project {} already has a default environment",
                    env.id,
                    env.project_id
                );
            }

            for endpoint in &definition.endpoints {
                if !endpoint_ids.insert(endpoint.id.as_str()) {
                    anyhow::bail!("Endpoint {}: duplicate id", endpoint.id);
                }
                validate_endpoint(endpoint)
                    .map_err(|e| anyhow::anyhow!("Environment {}: {}", env.id, e))?;
            }
        }
        Ok(())
    }

    /// Total number of endpoints across all environments.
    pub fn endpoint_count(&self) -> usize {
        self.environments.iter().map(|d| d.endpoints.len()).sum()
    }
}

/// An environment together with the endpoints it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentDefinition {
    #[serde(flatten)]
    pub environment: Environment,

    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

fn validate_endpoint(endpoint: &Endpoint) -> anyhow::Result<()> {
    if endpoint.id.is_empty() {
        anyhow::bail!("Endpoint id cannot be empty");
    }
    if endpoint.path.is_empty() {
        anyhow::bail!("Endpoint {}: path cannot be empty", endpoint.id);
    }
    validate_conditions(&endpoint.conditions)
        .map_err(|e| anyhow::anyhow!("Endpoint {}: {}", endpoint.id, e))?;

    let mut response_ids = HashSet::new();
    let mut defaults = 0;
    for response in &endpoint.responses {
        if !response_ids.insert(response.id.as_str()) {
            anyhow::bail!("Endpoint {}: duplicate response id {}", endpoint.id, response.id);
        }
        if response.is_default {
            defaults += 1;
        }
        validate_response(response)
            .map_err(|e| anyhow::anyhow!("Endpoint {}: {}", endpoint.id, e))?;
    }
    if defaults > 1 {
        anyhow::bail!(
            "Endpoint {}: at most one default response allowed, found {}",
            endpoint.id,
            defaults
        );
    }
    Ok(())
}

fn validate_response(response: &Response) -> anyhow::Result<()> {
    if response.id.is_empty() {
        anyhow::bail!("Response id cannot be empty");
    }
    if response.status_code < 100 || response.status_code > 599 {
        anyhow::bail!(
            "Response {}: invalid status code: {}",
            response.id,
            response.status_code
        );
    }
    validate_conditions(&response.conditions)
        .map_err(|e| anyhow::anyhow!("Response {}: {}", response.id, e))
}

/// Reject regex conditions that would never match because they do not compile.
fn validate_conditions(conditions: &[Condition]) -> anyhow::Result<()> {
    for condition in conditions {
        if condition.operator == Operator::Matches {
            if let Some(pattern) = &condition.value {
                regex::Regex::new(pattern).map_err(|e| {
                    anyhow::anyhow!("Condition on {}: invalid regex: {}", condition.key, e)
                })?;
            }
        }
    }
    Ok(())
}

/// Resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverSettings {
    /// Log every request that resolves to a mock
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log requests that are not mocked
    #[serde(default = "default_true")]
    pub log_unmatched: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
        }
    }
}

fn default_true() -> bool {
    true
}

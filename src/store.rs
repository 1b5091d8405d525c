//! Rule storage.
//!
//! The resolver reads rules through [`RuleStore`]; each call returns owned
//! values, so a resolution works on the snapshot it read even if the store
//! changes underneath it.

use crate::config::RuleSetConfig;
use crate::model::{Endpoint, Environment, Method};
use async_trait::async_trait;

/// Errors raised by a rule store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("rule store unavailable: {0}")]
    Unavailable(String),

    /// The backend answered but the query failed
    #[error("rule store query failed: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Read-only access to mock rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Find the environment to use for a project.
    ///
    /// With an id, the environment must belong to `project_id` and be
    /// enabled. Without one, the project's enabled default environment.
    async fn get_environment(
        &self,
        project_id: &str,
        environment_id: Option<&str>,
    ) -> Result<Option<Environment>, StoreError>;

    /// Enabled endpoints of an environment for one method, with their
    /// responses and conditions, ordered by `order`.
    async fn list_endpoints(
        &self,
        environment_id: &str,
        method: Method,
    ) -> Result<Vec<Endpoint>, StoreError>;
}

/// Rule store held entirely in memory, usually loaded from a rule-set file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleStore {
    environments: Vec<Environment>,
    endpoints: Vec<Endpoint>,
}

impl InMemoryRuleStore {
    pub fn new(environments: Vec<Environment>, endpoints: Vec<Endpoint>) -> Self {
        Self {
            environments,
            endpoints,
        }
    }

    /// Flatten a rule-set configuration, filling in parent ids.
    pub fn from_config(config: &RuleSetConfig) -> Self {
        let mut environments = Vec::with_capacity(config.environments.len());
        let mut endpoints = Vec::new();

        for definition in &config.environments {
            environments.push(definition.environment.clone());

            for endpoint in &definition.endpoints {
                let mut endpoint = endpoint.clone();
                endpoint.environment_id = definition.environment.id.clone();
                for response in &mut endpoint.responses {
                    response.endpoint_id = endpoint.id.clone();
                }
                endpoints.push(endpoint);
            }
        }

        Self::new(environments, endpoints)
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn get_environment(
        &self,
        project_id: &str,
        environment_id: Option<&str>,
    ) -> Result<Option<Environment>, StoreError> {
        let found = self.environments.iter().find(|env| {
            env.project_id == project_id
                && env.is_enabled
                && match environment_id {
                    Some(id) => env.id == id,
                    None => env.is_default,
                }
        });
        Ok(found.cloned())
    }

    async fn list_endpoints(
        &self,
        environment_id: &str,
        method: Method,
    ) -> Result<Vec<Endpoint>, StoreError> {
        let mut endpoints: Vec<Endpoint> = self
            .endpoints
            .iter()
            .filter(|ep| ep.environment_id == environment_id && ep.is_enabled && ep.method == method)
            .cloned()
            .collect();
        endpoints.sort_by_key(|ep| ep.order);
        Ok(endpoints)
    }
}

//! Mock resolution entry point.

use crate::config::ResolverSettings;
use crate::model::Method;
use crate::request::{MissReason, MockRequest, MockResult, Resolution};
use crate::selector::select;
use crate::store::{RuleStore, StoreError};
use tracing::{debug, info};

/// Resolves requests against the rules in a [`RuleStore`].
///
/// Holds no mutable state; share it between tasks behind an `Arc`.
pub struct MockResolver<S> {
    store: S,
    settings: ResolverSettings,
}

impl<S: RuleStore> MockResolver<S> {
    /// Create a resolver with default settings.
    pub fn new(store: S) -> Self {
        Self::with_settings(store, ResolverSettings::default())
    }

    pub fn with_settings(store: S, settings: ResolverSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a request to a mock result.
    ///
    /// Only store failures are errors; every other outcome is a result,
    /// with misses reported as `mockFound: false`.
    pub async fn resolve(&self, request: &MockRequest) -> Result<MockResult, StoreError> {
        self.resolve_detailed(request).await.map(MockResult::from)
    }

    /// Resolve a request, keeping the reason a request was not mocked.
    pub async fn resolve_detailed(&self, request: &MockRequest) -> Result<Resolution, StoreError> {
        let environment = self
            .store
            .get_environment(&request.project_id, request.environment_id.as_deref())
            .await?;

        let Some(environment) = environment else {
            self.log_miss(request, MissReason::NoEnvironment);
            return Ok(Resolution::Miss(MissReason::NoEnvironment));
        };

        let endpoints = match request.method.parse::<Method>() {
            Ok(method) => self.store.list_endpoints(&environment.id, method).await?,
            Err(e) => {
                debug!(error = %e, "Request method has no endpoints");
                Vec::new()
            }
        };

        debug!(
            environment_id = %environment.id,
            mode = ?environment.mode,
            endpoints = endpoints.len(),
            "Loaded rules"
        );

        let resolution = select(&environment, &endpoints, request);

        match &resolution {
            Resolution::Mocked(response) => {
                if self.settings.log_matches {
                    info!(
                        endpoint_id = %response.endpoint_id,
                        response_id = %response.response_id,
                        method = %request.method,
                        path = %request.path,
                        status = response.status_code,
                        "Request resolved to mock"
                    );
                }
            }
            Resolution::Miss(reason) => self.log_miss(request, *reason),
        }

        Ok(resolution)
    }

    fn log_miss(&self, request: &MockRequest, reason: MissReason) {
        if self.settings.log_unmatched {
            info!(
                project_id = %request.project_id,
                method = %request.method,
                path = %request.path,
                reason = reason.as_str(),
                "No mock for request"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetConfig;
    use crate::model::{Endpoint, Environment};
    use crate::store::InMemoryRuleStore;
    use async_trait::async_trait;
    use serde_json::json;

    fn test_config() -> RuleSetConfig {
        let yaml = r#"
environments:
  - id: env-global
    project_id: proj-1
    name: Global
    mode: global
    is_default: true
    endpoints:
      - id: user-by-id
        path: /api/users/:id
        method: GET
        responses:
          - id: user-ok
            status_code: 200
            is_default: true
            body:
              ok: true

  - id: env-selective
    project_id: proj-1
    name: Selective
    mode: selective
    whitelist: ["*"]

  - id: env-whitelist
    project_id: proj-1
    name: Whitelist
    mode: whitelist
    whitelist: ["/api/users/*"]
    endpoints:
      - id: wl-users
        path: /api/users/:id
        method: GET
        responses:
          - id: wl-users-ok
            is_default: true
      - id: wl-orders
        path: /api/orders
        method: GET
        responses:
          - id: wl-orders-ok
            is_default: true

  - id: env-checkout
    project_id: proj-1
    name: Checkout
    mode: selective
    endpoints:
      - id: checkout
        path: /api/checkout
        method: POST
        responses:
          - id: checkout-declined
            status_code: 402
            order: 1
            delay: 250
            headers:
              X-Mock-Reason: declined
            body:
              error: card_declined
            conditions:
              - type: body_json_path
                key: $.payment.card
                operator: equals
                value: "4000000000000002"
          - id: checkout-big
            status_code: 202
            order: 2
            conditions:
              - type: body_json_path
                key: $.payment.amount
                operator: greater_than
                value: "1000"
          - id: checkout-ok
            status_code: 201
            order: 3
            is_default: true
            body:
              status: paid

  - id: env-off
    project_id: proj-1
    name: Off
    mode: global
    is_enabled: false
"#;
        RuleSetConfig::from_yaml(yaml).unwrap()
    }

    fn resolver() -> MockResolver<InMemoryRuleStore> {
        MockResolver::new(InMemoryRuleStore::from_config(&test_config()))
    }

    #[tokio::test]
    async fn test_end_to_end_global() {
        let request = MockRequest::new("proj-1", "GET", "/api/users/42");
        let result = resolver().resolve(&request).await.unwrap();

        assert!(result.mock_found);
        let response = result.response.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, json!({"ok": true}));
        assert_eq!(response.endpoint_id, "user-by-id");
        assert_eq!(response.response_id, "user-ok");
    }

    #[tokio::test]
    async fn test_global_unmatched_path() {
        let request = MockRequest::new("proj-1", "GET", "/api/unknown");
        let resolution = resolver().resolve_detailed(&request).await.unwrap();
        assert_eq!(resolution, Resolution::Miss(MissReason::NoMatch));
    }

    #[tokio::test]
    async fn test_selective_without_endpoints() {
        let request = MockRequest::new("proj-1", "GET", "/api/users/1").with_environment("env-selective");
        let resolution = resolver().resolve_detailed(&request).await.unwrap();
        assert_eq!(resolution, Resolution::Miss(MissReason::PolicyDenied));
        assert!(!MockResult::from(resolution).mock_found);
    }

    #[tokio::test]
    async fn test_whitelist_mode() {
        let resolver = resolver();

        let request = MockRequest::new("proj-1", "GET", "/api/users/5").with_environment("env-whitelist");
        let result = resolver.resolve(&request).await.unwrap();
        assert_eq!(result.response.unwrap().response_id, "wl-users-ok");

        // Endpoint exists but the path is not whitelisted
        let request = MockRequest::new("proj-1", "GET", "/api/orders").with_environment("env-whitelist");
        let resolution = resolver.resolve_detailed(&request).await.unwrap();
        assert_eq!(resolution, Resolution::Miss(MissReason::PolicyDenied));
    }

    #[tokio::test]
    async fn test_missing_environment() {
        let resolver = resolver();

        let request = MockRequest::new("proj-1", "GET", "/api/users/1").with_environment("env-off");
        let resolution = resolver.resolve_detailed(&request).await.unwrap();
        assert_eq!(resolution, Resolution::Miss(MissReason::NoEnvironment));

        let request = MockRequest::new("proj-9", "GET", "/api/users/1");
        let result = resolver.resolve(&request).await.unwrap();
        assert_eq!(result, MockResult::not_found());
    }

    #[tokio::test]
    async fn test_body_conditions_select_response() {
        let resolver = resolver();
        let base = MockRequest::new("proj-1", "post", "/api/checkout").with_environment("env-checkout");

        let declined = base
            .clone()
            .with_body(json!({"payment": {"card": "4000000000000002", "amount": 5}}));
        let response = resolver.resolve(&declined).await.unwrap().response.unwrap();
        assert_eq!(response.response_id, "checkout-declined");
        assert_eq!(response.status_code, 402);
        assert_eq!(response.delay, 250);
        assert_eq!(response.headers["X-Mock-Reason"], "declined");

        // String bodies are decoded before evaluation
        let big = base
            .clone()
            .with_body(json!(r#"{"payment": {"card": "4242", "amount": 1500}}"#));
        let response = resolver.resolve(&big).await.unwrap().response.unwrap();
        assert_eq!(response.response_id, "checkout-big");

        let plain = base.clone().with_body(json!("not json at all"));
        let response = resolver.resolve(&plain).await.unwrap().response.unwrap();
        assert_eq!(response.response_id, "checkout-ok");
        assert_eq!(response.body, json!({"status": "paid"}));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let request = MockRequest::new("proj-1", "BREW", "/api/users/42");
        let resolution = resolver().resolve_detailed(&request).await.unwrap();
        assert_eq!(resolution, Resolution::Miss(MissReason::NoMatch));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let resolver = resolver();
        let request = MockRequest::new("proj-1", "POST", "/api/checkout")
            .with_environment("env-checkout")
            .with_header("Content-Type", "application/json")
            .with_body(json!({"payment": {"card": "4000000000000002"}}));

        let first = serde_json::to_vec(&resolver.resolve(&request).await.unwrap()).unwrap();
        let second = serde_json::to_vec(&resolver.resolve(&request).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    /// Store that fails either while looking up the environment or while
    /// listing its endpoints.
    struct FailingStore {
        fail_listing: bool,
    }

    #[async_trait]
    impl RuleStore for FailingStore {
        async fn get_environment(
            &self,
            project_id: &str,
            _environment_id: Option<&str>,
        ) -> Result<Option<Environment>, StoreError> {
            if !self.fail_listing {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            Ok(Some(Environment {
                id: "env-1".to_string(),
                project_id: project_id.to_string(),
                name: "Flaky".to_string(),
                description: None,
                mode: crate::model::Mode::Global,
                whitelist: vec![],
                blacklist: vec![],
                is_default: true,
                is_enabled: true,
            }))
        }

        async fn list_endpoints(
            &self,
            _environment_id: &str,
            _method: Method,
        ) -> Result<Vec<Endpoint>, StoreError> {
            let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "statement timeout");
            Err(StoreError::Query(Box::new(cause)))
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let resolver = MockResolver::new(FailingStore { fail_listing: false });
        let request = MockRequest::new("proj-1", "GET", "/api/users/1");
        let err = resolver.resolve(&request).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_endpoint_query_failure_propagates() {
        use std::error::Error;

        let resolver = MockResolver::new(FailingStore { fail_listing: true });
        let request = MockRequest::new("proj-1", "GET", "/api/users/1");
        let err = resolver.resolve_detailed(&request).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(err.to_string().contains("statement timeout"));
        assert!(err.source().is_some());

        // Unknown methods never reach the endpoint listing
        let request = MockRequest::new("proj-1", "BREW", "/api/users/1");
        let resolution = resolver.resolve_detailed(&request).await.unwrap();
        assert_eq!(resolution, Resolution::Miss(MissReason::NoMatch));
    }

    #[test]
    fn test_store_snapshot_from_config() {
        let resolver = resolver();
        let store = resolver.store();
        assert_eq!(store.environments().len(), 5);
        assert_eq!(store.endpoints().len(), 4);
        assert!(store
            .endpoints()
            .iter()
            .filter(|ep| ep.id.starts_with("wl-"))
            .all(|ep| ep.environment_id == "env-whitelist"));
    }

    #[test]
    fn test_resolver_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockResolver<InMemoryRuleStore>>();
    }
}

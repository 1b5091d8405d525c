//! Mock API Resolution Engine
//!
//! Decides whether a simulated HTTP request arriving for a project should be
//! answered with a mocked response, and which one.
//!
//! # Features
//!
//! - **Path Templates**: `/api/users/:id` parameters and trailing `/*` wildcards
//! - **Conditions**: match on path params, query params, headers or JSON body fields
//! - **Ordered Responses**: first matching response wins, with a default fallback
//! - **Environment Modes**: selective, global, whitelist and blacklist policies
//! - **Pluggable Storage**: rules are read through the [`RuleStore`] trait
//!
//! # Example Rule Set
//!
//! ```yaml
//! environments:
//!   - id: staging
//!     project_id: my-app
//!     name: Staging mocks
//!     mode: selective
//!     is_default: true
//!     endpoints:
//!       - id: user-by-id
//!         path: /api/users/:id
//!         method: GET
//!         responses:
//!           - id: user-ok
//!             status_code: 200
//!             is_default: true
//!             body:
//!               name: Ada
//! ```

pub mod condition;
pub mod config;
pub mod matcher;
pub mod model;
pub mod policy;
pub mod request;
pub mod resolver;
pub mod selector;
pub mod store;

pub use config::{ResolverSettings, RuleSetConfig};
pub use request::{MockRequest, MockResult, MockedResponse, Resolution};
pub use resolver::MockResolver;
pub use store::{InMemoryRuleStore, RuleStore, StoreError};

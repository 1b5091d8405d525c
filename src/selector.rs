//! Endpoint and response selection.
//!
//! Given one environment and the endpoints loaded for the request's method,
//! walk the endpoints in order and pick the first response that applies.

use crate::condition::{all_hold, RequestContext};
use crate::matcher::match_path;
use crate::model::{Endpoint, Environment, Method, Response};
use crate::policy::environment_allows;
use crate::request::{MissReason, MockRequest, MockedResponse, Resolution};
use tracing::debug;

/// Select a response for `request` among `endpoints`.
///
/// Endpoints that are disabled or registered for another method are
/// ignored, the rest are tried by ascending `order`. The first endpoint
/// whose path and conditions match decides the outcome unless it has no
/// usable response, in which case scanning continues.
pub fn select(environment: &Environment, endpoints: &[Endpoint], request: &MockRequest) -> Resolution {
    let method = request.method.parse::<Method>().ok();
    let mut candidates: Vec<&Endpoint> = endpoints
        .iter()
        .filter(|endpoint| endpoint.is_enabled && Some(endpoint.method) == method)
        .collect();
    candidates.sort_by_key(|endpoint| endpoint.order);

    for endpoint in &candidates {
        let path_match = match_path(&endpoint.path, &request.path);
        if !path_match.matched {
            continue;
        }

        let context = RequestContext::new(&path_match.params, &request.query, &request.headers, &request.body);

        if !all_hold(&endpoint.conditions, &context) {
            debug!(endpoint_id = %endpoint.id, "Endpoint conditions not met");
            continue;
        }

        // Mode is a gate for the whole request, not just this endpoint
        if !environment_allows(environment, &request.path, true) {
            debug!(
                endpoint_id = %endpoint.id,
                mode = ?environment.mode,
                "Environment mode forbids mocking this path"
            );
            return Resolution::Miss(MissReason::PolicyDenied);
        }

        if let Some(response) = pick_response(endpoint, &context) {
            return Resolution::Mocked(package(endpoint, response));
        }

        debug!(endpoint_id = %endpoint.id, "Endpoint matched but no response applies");
    }

    if environment_allows(environment, &request.path, !candidates.is_empty()) {
        Resolution::Miss(MissReason::NoMatch)
    } else {
        Resolution::Miss(MissReason::PolicyDenied)
    }
}

/// Choose the response for a matched endpoint.
///
/// Responses are tried by ascending `order`, defaults after non-defaults of
/// equal order. When none of them has passing conditions the endpoint's
/// default response is used regardless of its own conditions.
fn pick_response<'e>(endpoint: &'e Endpoint, context: &RequestContext<'_>) -> Option<&'e Response> {
    let mut responses: Vec<&Response> = endpoint.responses.iter().filter(|r| r.is_enabled).collect();
    responses.sort_by_key(|response| (response.order, response.is_default));

    responses
        .iter()
        .find(|response| all_hold(&response.conditions, context))
        .or_else(|| responses.iter().find(|response| response.is_default))
        .copied()
}

fn package(endpoint: &Endpoint, response: &Response) -> MockedResponse {
    MockedResponse {
        status_code: response.status_code,
        headers: response.headers.clone(),
        body: response.body.clone(),
        delay: response.delay,
        endpoint_id: endpoint.id.clone(),
        response_id: response.id.clone(),
    }
}

//! Lambda-style invocation events.
//!
//! Deployments behind an API gateway deliver each request as a JSON event rather than as a raw
//! HTTP request. This module routes such events onto [`BundleService`] and wraps the result in
//! the gateway's proxy response shape.

use crate::{BUNDLE_PATH, STATUS_PATH};
use pathology_core::{ApiResponse, BundleService};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// An API gateway proxy event. Fields not listed here are ignored.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    /// Raw request body.
    #[serde(default)]
    pub body: Option<String>,

    /// Request path (REST API events).
    #[serde(default)]
    pub path: Option<String>,

    /// Request path (HTTP API events).
    #[serde(default)]
    pub raw_path: Option<String>,

    #[serde(default)]
    pub http_method: Option<String>,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub request_context: Option<RequestContext>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub http: Option<HttpContext>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HttpContext {
    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub path: Option<String>,
}

impl InvocationEvent {
    /// Request path, if the event carries one.
    pub fn route_path(&self) -> Option<&str> {
        self.path
            .as_deref()
            .or(self.raw_path.as_deref())
            .or_else(|| self.http_context()?.path.as_deref())
            .filter(|path| !path.is_empty())
    }

    /// Upper-cased HTTP method, if the event carries one.
    pub fn method(&self) -> Option<String> {
        self.http_method
            .as_deref()
            .or_else(|| self.http_context()?.method.as_deref())
            .map(str::to_ascii_uppercase)
    }

    fn http_context(&self) -> Option<&HttpContext> {
        self.request_context.as_ref()?.http.as_ref()
    }
}

/// Proxy response returned to the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl From<ApiResponse> for InvocationResponse {
    fn from(response: ApiResponse) -> Self {
        Self {
            status_code: response.status,
            headers: response.headers,
            body: response.body,
        }
    }
}

/// Route an event to the matching operation.
///
/// An event without a path is treated as a bundle submission.
pub fn dispatch(service: &BundleService, event: &InvocationEvent) -> InvocationResponse {
    let path = event.route_path();
    let method = event.method();
    tracing::debug!(?path, ?method, "invocation event");

    let response = match (method.as_deref(), path) {
        (None | Some("GET"), Some(STATUS_PATH)) => service.status(),
        (None | Some("POST"), None | Some(BUNDLE_PATH)) => {
            service.post_bundle(event.body.as_deref())
        }
        _ => ApiResponse::not_found(),
    };

    response.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::ResourceRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> BundleService {
        BundleService::new(Arc::new(
            ResourceRegistry::r4().expect("standard registry"),
        ))
    }

    fn event(value: serde_json::Value) -> InvocationEvent {
        serde_json::from_value(value).expect("valid event")
    }

    fn bundle_body() -> String {
        json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": [{
                "fullUrl": "patient",
                "resource": {
                    "resourceType": "Patient",
                    "identifier": {
                        "system": "https://fhir.nhs.uk/Id/nhs-number",
                        "value": "nhs_number",
                    },
                },
            }],
        })
        .to_string()
    }

    #[test]
    fn event_without_path_submits_bundle() {
        let response = dispatch(&service(), &event(json!({ "body": bundle_body() })));

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/fhir+json")
        );
    }

    #[test]
    fn event_without_body_reports_no_payload() {
        let response = dispatch(&service(), &InvocationEvent::default());

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, "No payload provided.");
    }

    #[test]
    fn routes_status_probe() {
        let response = dispatch(
            &service(),
            &event(json!({ "path": "/_status", "httpMethod": "GET" })),
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "OK");
    }

    #[test]
    fn routes_http_api_events() {
        let response = dispatch(
            &service(),
            &event(json!({
                "rawPath": "/FHIR/R4/Bundle",
                "requestContext": { "http": { "method": "post" } },
                "body": bundle_body(),
            })),
        );

        assert_eq!(response.status_code, 200);
    }

    #[test]
    fn unknown_route_is_not_found() {
        let service = service();
        let events = [
            json!({ "path": "/unknown" }),
            json!({ "path": "/_status", "httpMethod": "POST" }),
            json!({ "path": "/FHIR/R4/Bundle", "httpMethod": "DELETE" }),
        ];

        for value in events {
            let response = dispatch(&service, &event(value));
            assert_eq!(response.status_code, 404);
            assert_eq!(response.body, "Not found.");
            assert_eq!(
                response.headers.get("Content-Type").map(String::as_str),
                Some("text/plain")
            );
        }
    }

    #[test]
    fn response_uses_gateway_field_names() {
        let response = InvocationResponse::from(service().status());
        let json = serde_json::to_value(&response).expect("serialise");

        assert_eq!(
            json,
            json!({
                "statusCode": 200,
                "headers": { "Content-Type": "text/plain" },
                "body": "OK",
            })
        );
    }
}

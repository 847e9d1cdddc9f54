//! # API REST
//!
//! REST API implementation for the pathology service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Lambda-style invocation events (see [`invocation`])
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (CORS, panics, mapping [`ApiResponse`] onto HTTP)
//!
//! Validation and business rules live in `pathology-core`; handlers only translate.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod invocation;

pub use config::{ConfigError, RestConfig};

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use fhir::ResourceRegistry;
use invocation::{InvocationEvent, InvocationResponse};
use pathology_core::{ApiResponse, BundleService};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const STATUS_PATH: &str = "/_status";
pub const BUNDLE_PATH: &str = "/FHIR/R4/Bundle";
pub const INVOCATION_PATH: &str = "/2015-03-31/functions/function/invocations";

/// Application state shared across REST API handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    service: BundleService,
}

impl AppState {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self {
            service: BundleService::new(registry),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(status, post_bundle, invoke),
    components(schemas(InvocationEvent, InvocationResponse))
)]
struct ApiDoc;

/// Build the REST router.
///
/// The OpenAPI document and Swagger UI are mounted only when `config` enables them.
pub fn router(state: AppState, config: &RestConfig) -> Router {
    let mut app = Router::new()
        .route(STATUS_PATH, get(status))
        .route(BUNDLE_PATH, post(post_bundle))
        .route(INVOCATION_PATH, post(invoke));

    if config.enable_docs() {
        app = app
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app.layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the REST API until the process receives Ctrl-C.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(config: RestConfig, registry: Arc<ResourceRegistry>) -> anyhow::Result<()> {
    let app = router(AppState::new(registry), &config);

    tracing::info!("++ Starting pathology REST on {}", config.addr());
    if config.enable_docs() {
        tracing::info!("API docs at http://{}/swagger-ui", config.addr());
    }

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- REST server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}

#[utoipa::path(
    get,
    path = "/_status",
    responses(
        (status = 200, description = "Service is alive", body = String, content_type = "text/plain")
    )
)]
/// Status probe used by load balancers and deployment checks.
async fn status(State(state): State<AppState>) -> Response {
    into_http(state.service.status())
}

#[utoipa::path(
    post,
    path = "/FHIR/R4/Bundle",
    request_body(
        content = String,
        description = "FHIR R4 test result Bundle",
        content_type = "application/fhir+json"
    ),
    responses(
        (status = 200, description = "Bundle accepted and re-issued with a new identifier", body = String, content_type = "application/fhir+json"),
        (status = 400, description = "Missing, invalid or rejected bundle", body = String, content_type = "application/fhir+json"),
        (status = 500, description = "Unexpected failure", body = String, content_type = "text/plain")
    )
)]
/// Validate a test result bundle.
///
/// An empty request body is treated as no payload.
async fn post_bundle(State(state): State<AppState>, body: String) -> Response {
    let payload = (!body.is_empty()).then_some(body.as_str());
    into_http(state.service.post_bundle(payload))
}

#[utoipa::path(
    post,
    path = "/2015-03-31/functions/function/invocations",
    request_body = InvocationEvent,
    responses(
        (status = 200, description = "Result of the routed operation", body = InvocationResponse),
        (status = 400, description = "Body is not an invocation event", body = String, content_type = "text/plain")
    )
)]
/// Handle an API gateway proxy event.
///
/// The event is read from the raw body so callers need not set a content type.
async fn invoke(State(state): State<AppState>, body: String) -> Response {
    let event = if body.trim().is_empty() {
        InvocationEvent::default()
    } else {
        match serde_json::from_str::<InvocationEvent>(&body) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "invalid invocation event");
                return (StatusCode::BAD_REQUEST, "Invalid invocation event.").into_response();
            }
        }
    };

    Json(invocation::dispatch(&state.service, &event)).into_response()
}

/// Convert a transport-neutral response into an HTTP response.
fn into_http(response: ApiResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = (status, response.body).into_response();

    for (name, value) in &response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                http.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping invalid response header"),
        }
    }

    http
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("request handler panicked");
    into_http(ApiResponse::unexpected_error())
}

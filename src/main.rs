use std::sync::Arc;

use api_rest::RestConfig;
use fhir::ResourceRegistry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the pathology service
///
/// Starts the REST server, which accepts FHIR test result bundles directly and as Lambda-style
/// invocation events.
///
/// # Environment Variables
/// - `PATHOLOGY_REST_ADDR`: REST server address (default: "0.0.0.0:8080")
/// - `PATHOLOGY_ENABLE_DOCS`: mount OpenAPI/Swagger UI routes (default: "true")
/// - `RUST_LOG`: tracing filter
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pathology_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("pathology_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RestConfig::from_env()?;
    let registry = Arc::new(ResourceRegistry::r4()?);
    tracing::info!(
        resource_types = ?registry.resource_types(),
        "resource registry ready"
    );

    api_rest::serve(config, registry).await
}

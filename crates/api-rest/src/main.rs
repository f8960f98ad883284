//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST and WebSocket API on its own, logging at debug level for this crate.
//!
//! ## Intended use
//! Useful for development when iterating on handlers. The workspace's main `medairon-run`
//! binary serves the same router for deployments.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// # Environment Variables
/// - `MEDAIRON_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - see [`api_rest::state_from_env`] for the rest
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration cannot be resolved,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=debug".parse()?)
                .add_directive("medairon_core=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDAIRON_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let state = api_rest::state_from_env()?;

    tracing::info!("-- Starting MedAIron REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}

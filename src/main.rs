use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for MedAIron
///
/// Serves the REST API, the `/ws` real-time channel and Swagger UI from one listener, and
/// shuts down cleanly on Ctrl-C.
///
/// # Environment Variables
/// - `MEDAIRON_REST_ADDR`: listen address (default: "0.0.0.0:3000")
/// - `HOSPITAL_DATA_DIR`: directory for hospital data (default: "hospital_data")
/// - `NOTIFIER_BUFFER`: per-connection real-time event buffer (default: 64)
/// - `JWT_SECRET`: secret for verifying bearer tokens (required)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medairon_run=info".parse()?)
                .add_directive("medairon_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDAIRON_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let state = api_rest::state_from_env()?;
    tracing::info!(
        "++ Starting MedAIron on {} (data: {})",
        addr,
        state.cfg.data_dir().display()
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_rest::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("MedAIron stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

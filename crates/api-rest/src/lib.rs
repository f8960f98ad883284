//! # API REST
//!
//! REST and real-time API for MedAIron.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Bearer authentication, resolving each request to a core `Caller`
//! - The `/ws` WebSocket endpoint bridging clinical sessions to the topic registry
//! - OpenAPI/Swagger documentation
//!
//! Uses `api-shared` for wire types and authentication; all domain rules live in
//! `medairon-core`.

#![warn(rust_2018_idioms)]

pub mod error;
mod handlers;
mod realtime;

use api_shared::JwtAuthenticator;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use medairon_core::config::subscriber_buffer_from_env_value;
use medairon_core::constants::DEFAULT_DATA_DIR;
use medairon_core::{Caller, CoreConfig, Hospital, TopicRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub hospital: Hospital,
    pub registry: Arc<TopicRegistry>,
    pub auth: Arc<JwtAuthenticator>,
}

impl AppState {
    /// Wires services over the file store at `cfg.data_dir()`, publishing through a fresh
    /// topic registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open(cfg: Arc<CoreConfig>, auth: JwtAuthenticator) -> Result<Self, ApiError> {
        let registry = Arc::new(TopicRegistry::new(cfg.subscriber_buffer()));
        let hospital = Hospital::open(&cfg, registry.clone())?;
        Ok(Self {
            cfg,
            hospital,
            registry,
            auth: Arc::new(auth),
        })
    }
}

/// Resolves configuration from the process environment once, at startup.
///
/// # Environment Variables
/// - `HOSPITAL_DATA_DIR`: data directory (default: "hospital_data"; created if missing)
/// - `NOTIFIER_BUFFER`: per-connection event buffer (default: 64)
/// - `JWT_SECRET`: HS256 secret used to verify bearer tokens (required)
///
/// # Errors
/// Returns an error if `JWT_SECRET` is missing or empty, `NOTIFIER_BUFFER` is not a number in
/// range, or the data directory cannot be created.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let data_dir = std::env::var("HOSPITAL_DATA_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_DIR.into());
    let buffer = subscriber_buffer_from_env_value(std::env::var("NOTIFIER_BUFFER").ok())?;
    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir), buffer)?);

    let secret = std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
    let auth = JwtAuthenticator::new(&secret)?;

    tracing::info!(data_dir = %cfg.data_dir().display(), buffer, "configuration resolved");
    Ok(AppState::open(cfg, auth)?)
}

/// The authenticated caller of a request, taken from `Authorization: Bearer <token>`.
pub struct Authenticated(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let caller = state.auth.authenticate_header(header)?;
        Ok(Authenticated(caller))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::create_staff,
        handlers::create_patient,
        handlers::get_patient,
        handlers::assign_staff,
        handlers::record_vitals,
        handlers::list_vitals,
        handlers::vitals_trends,
        handlers::list_alerts,
        handlers::acknowledge_alert,
        handlers::dismiss_alert,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::dto::ErrorRes,
        api_shared::dto::CreateStaffReq,
        api_shared::dto::StaffRes,
        api_shared::dto::CreatePatientReq,
        api_shared::dto::PatientRes,
        api_shared::dto::AssignStaffReq,
        api_shared::dto::RecordVitalsReq,
        api_shared::dto::VitalReadingRes,
        api_shared::dto::RecordVitalsRes,
        api_shared::dto::AlertRes,
        api_shared::dto::DailyTrendRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full router: REST endpoints, `/ws`, Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/staff", post(handlers::create_staff))
        .route("/patients", post(handlers::create_patient))
        .route("/patients/:id", get(handlers::get_patient))
        .route("/patients/:id/assign", put(handlers::assign_staff))
        .route(
            "/patients/:id/vitals",
            post(handlers::record_vitals).get(handlers::list_vitals),
        )
        .route("/patients/:id/vitals/trends", get(handlers::vitals_trends))
        .route("/alerts", get(handlers::list_alerts))
        .route("/alerts/:id/acknowledge", patch(handlers::acknowledge_alert))
        .route("/alerts/:id", delete(handlers::dismiss_alert))
        .route("/ws", get(realtime::subscribe))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

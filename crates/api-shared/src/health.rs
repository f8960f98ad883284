use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Health check shared by every API surface.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static health check; does not touch storage.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "MedAIron is alive".into(),
        }
    }
}

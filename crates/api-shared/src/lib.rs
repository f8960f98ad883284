//! # API Shared
//!
//! Shared definitions for the MedAIron HTTP and real-time APIs.
//!
//! Contains:
//! - Wire DTOs (`dto` module) with OpenAPI schemas and conversions from core types
//! - Shared services like `HealthService`
//! - Bearer-token authentication (`auth` module)
//!
//! Used by `api-rest` and by the workspace binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{AuthError, JwtAuthenticator};
pub use health::{HealthRes, HealthService};

//! REST handlers.
//!
//! Each handler authenticates, converts the wire request into core input, calls one core
//! service and converts the result back. Core operations are synchronous file I/O.

use crate::{ApiError, AppState, Authenticated};
use api_shared::dto::{
    AlertRes, AssignStaffReq, CreatePatientReq, CreateStaffReq, DailyTrendRes, ErrorRes,
    PatientRes, RecordVitalsReq, RecordVitalsRes, StaffRes, VitalReadingRes,
};
use api_shared::{HealthRes, HealthService};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use medairon_core::AlertFilter;
use medairon_uuid::RecordId;
use serde::Deserialize;
use utoipa::IntoParams;

fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint. No authentication.
pub(crate) async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/staff",
    request_body = CreateStaffReq,
    responses(
        (status = 201, description = "Staff member registered", body = StaffRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes),
        (status = 403, description = "Caller is not an administrator", body = ErrorRes)
    )
)]
pub(crate) async fn create_staff(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    body: Result<Json<CreateStaffReq>, JsonRejection>,
) -> Result<(StatusCode, Json<StaffRes>), ApiError> {
    let Json(req) = body?;
    let member = state
        .hospital
        .staff
        .register(&caller, req.into_new_staff()?)?;
    Ok((StatusCode::CREATED, Json(StaffRes::from(&member))))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 403, description = "Caller is not an administrator", body = ErrorRes)
    )
)]
pub(crate) async fn create_patient(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    body: Result<Json<CreatePatientReq>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let Json(req) = body?;
    let patient = state
        .hospital
        .patients
        .register(&caller, req.into_new_patient()?)?;
    Ok((StatusCode::CREATED, Json(PatientRes::from(&patient))))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 403, description = "Caller may not see this patient", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient = state.hospital.patients.get(&caller, &parse_id(&id)?)?;
    Ok(Json(PatientRes::from(&patient)))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/assign",
    params(("id" = String, Path, description = "Patient id")),
    request_body = AssignStaffReq,
    responses(
        (status = 200, description = "Care team updated", body = PatientRes),
        (status = 400, description = "Invalid assignment", body = ErrorRes),
        (status = 403, description = "Caller is not an administrator", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
pub(crate) async fn assign_staff(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
    body: Result<Json<AssignStaffReq>, JsonRejection>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient_id = parse_id(&id)?;
    let Json(req) = body?;
    let patient = state
        .hospital
        .patients
        .assign_staff(&caller, &patient_id, req.into_assignment()?)?;
    Ok(Json(PatientRes::from(&patient)))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/vitals",
    params(("id" = String, Path, description = "Patient id")),
    request_body = RecordVitalsReq,
    responses(
        (status = 201, description = "Reading stored with the alerts it raised", body = RecordVitalsRes),
        (status = 400, description = "Invalid reading", body = ErrorRes),
        (status = 403, description = "Caller is not assigned to this patient", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Record a vital-sign reading.
///
/// The reading is stored first; alerts and notifications are best effort, so the response
/// lists only the alerts that were actually persisted.
pub(crate) async fn record_vitals(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
    body: Result<Json<RecordVitalsReq>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordVitalsRes>), ApiError> {
    let patient_id = parse_id(&id)?;
    let Json(req) = body?;
    let outcome = state
        .hospital
        .ingestion
        .record(&caller, &patient_id, req.into())?;
    let (reading, alerts) = outcome.into_reading_and_alerts();
    Ok((
        StatusCode::CREATED,
        Json(RecordVitalsRes::new(&reading, &alerts)),
    ))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/vitals",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Readings, most recent first", body = [VitalReadingRes]),
        (status = 403, description = "Caller is not assigned to this patient", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
pub(crate) async fn list_vitals(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<VitalReadingRes>>, ApiError> {
    let readings = state.hospital.vitals.list(&caller, &parse_id(&id)?)?;
    Ok(Json(readings.iter().map(VitalReadingRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/vitals/trends",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Daily aggregates, oldest day first", body = [DailyTrendRes]),
        (status = 403, description = "Caller is not assigned to this patient", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
pub(crate) async fn vitals_trends(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<DailyTrendRes>>, ApiError> {
    let trends = state.hospital.vitals.trends(&caller, &parse_id(&id)?)?;
    Ok(Json(trends.iter().map(DailyTrendRes::from).collect()))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct AlertQuery {
    /// Include dismissed alerts (default false).
    #[serde(default)]
    include_dismissed: bool,
    /// Only alerts for this patient.
    #[serde(default)]
    patient_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/alerts",
    params(AlertQuery),
    responses(
        (status = 200, description = "Alerts, newest first", body = [AlertRes]),
        (status = 403, description = "Caller role may not view alerts", body = ErrorRes)
    )
)]
pub(crate) async fn list_alerts(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    query: Result<Query<AlertQuery>, QueryRejection>,
) -> Result<Json<Vec<AlertRes>>, ApiError> {
    let Query(query) = query?;
    let mut filter = if query.include_dismissed {
        AlertFilter::all()
    } else {
        AlertFilter::active()
    };
    if let Some(patient_id) = query.patient_id.as_deref() {
        filter = filter.for_patient(parse_id(patient_id)?);
    }
    let alerts = state.hospital.alerts.list(&caller, filter)?;
    Ok(Json(alerts.iter().map(AlertRes::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/alerts/{id}/acknowledge",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert acknowledged", body = AlertRes),
        (status = 403, description = "Caller role may not manage alerts", body = ErrorRes),
        (status = 404, description = "Alert not found", body = ErrorRes)
    )
)]
pub(crate) async fn acknowledge_alert(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AlertRes>, ApiError> {
    let alert = state.hospital.alerts.acknowledge(&caller, &parse_id(&id)?)?;
    Ok(Json(AlertRes::from(&alert)))
}

#[utoipa::path(
    delete,
    path = "/alerts/{id}",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert dismissed (kept, hidden from the active list)", body = AlertRes),
        (status = 403, description = "Caller role may not manage alerts", body = ErrorRes),
        (status = 404, description = "Alert not found", body = ErrorRes)
    )
)]
pub(crate) async fn dismiss_alert(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AlertRes>, ApiError> {
    let alert = state.hospital.alerts.dismiss(&caller, &parse_id(&id)?)?;
    Ok(Json(AlertRes::from(&alert)))
}

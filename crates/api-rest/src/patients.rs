//! Patient, somatometry and growth endpoints.

use crate::error::{api_error, ApiResult};
use crate::AppState;
use api_shared::{
    ErrorRes, GrowthRes, ListPatientsRes, ListSomatometryRes, PatientReq, PatientRes,
    SomatometryReq, SomatometryRes,
};
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
};
use clinic_core::RecordId;

pub(crate) fn parse_id(context: &str, id: &str) -> ApiResult<RecordId> {
    RecordId::parse(id).map_err(|e| api_error(context, e.into()))
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "List of patients", body = ListPatientsRes)
    )
)]
/// List all patients, ordered by family name.
pub(crate) async fn list_patients(State(state): State<AppState>) -> Json<ListPatientsRes> {
    let patients = state
        .patients
        .list()
        .into_iter()
        .map(PatientRes::from)
        .collect();
    Json(ListPatientsRes { patients })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientReq,
    responses(
        (status = 201, description = "Patient created", body = PatientRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create a new patient record.
pub(crate) async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<PatientReq>,
) -> ApiResult<(StatusCode, Json<PatientRes>)> {
    let details = req
        .into_details()
        .map_err(|e| api_error("Create patient", e))?;
    let patient = state
        .patients
        .create(details)
        .map_err(|e| api_error("Create patient", e))?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 400, description = "Invalid id", body = ErrorRes),
        (status = 404, description = "Not found", body = ErrorRes)
    )
)]
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<PatientRes>> {
    let id = parse_id("Get patient", &id)?;
    let patient = state
        .patients
        .get(&id)
        .map_err(|e| api_error("Get patient", e))?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Not found", body = ErrorRes)
    )
)]
/// Replace a patient's details.
pub(crate) async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<PatientReq>,
) -> ApiResult<Json<PatientRes>> {
    let id = parse_id("Update patient", &id)?;
    let details = req
        .into_details()
        .map_err(|e| api_error("Update patient", e))?;
    let patient = state
        .patients
        .update(&id, details)
        .map_err(|e| api_error("Update patient", e))?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/somatometry",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Somatometry rows, oldest first", body = ListSomatometryRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
pub(crate) async fn list_somatometry(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<ListSomatometryRes>> {
    let id = parse_id("List somatometry", &id)?;
    let records = state
        .somatometry
        .list(&id)
        .map_err(|e| api_error("List somatometry", e))?;
    Ok(Json(ListSomatometryRes {
        records: records.into_iter().map(SomatometryRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/somatometry",
    params(("id" = String, Path, description = "Patient id")),
    request_body = SomatometryReq,
    responses(
        (status = 201, description = "Row recorded; bmi and age_months derived", body = SomatometryRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Record a new somatometry row.
pub(crate) async fn create_somatometry(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<SomatometryReq>,
) -> ApiResult<(StatusCode, Json<SomatometryRes>)> {
    let id = parse_id("Create somatometry", &id)?;
    let input = req
        .into_input()
        .map_err(|e| api_error("Create somatometry", e))?;
    let record = state
        .somatometry
        .create(&id, input)
        .map_err(|e| api_error("Create somatometry", e))?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/somatometry/{record_id}",
    params(
        ("id" = String, Path, description = "Patient id"),
        ("record_id" = String, Path, description = "Somatometry row id")
    ),
    request_body = SomatometryReq,
    responses(
        (status = 200, description = "Row updated in place", body = SomatometryRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Not found", body = ErrorRes)
    )
)]
pub(crate) async fn update_somatometry(
    State(state): State<AppState>,
    AxumPath((id, record_id)): AxumPath<(String, String)>,
    Json(req): Json<SomatometryReq>,
) -> ApiResult<Json<SomatometryRes>> {
    let id = parse_id("Update somatometry", &id)?;
    let record_id = parse_id("Update somatometry", &record_id)?;
    let input = req
        .into_input()
        .map_err(|e| api_error("Update somatometry", e))?;
    let record = state
        .somatometry
        .update(&id, &record_id, input)
        .map_err(|e| api_error("Update somatometry", e))?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/growth",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Latest assessment and chart overlays", body = GrowthRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Growth assessment of the latest row plus chart data for every indicator.
pub(crate) async fn patient_growth(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<GrowthRes>> {
    let id = parse_id("Patient growth", &id)?;
    let growth = state
        .somatometry
        .growth(&id)
        .map_err(|e| api_error("Patient growth", e))?;
    Ok(Json(growth.into()))
}

//! Appointment and appointment-status endpoints.
//!
//! Every response that carries an appointment also carries the actions it currently offers, so
//! clients never derive edit/cancel/status-menu availability themselves.

use crate::error::{api_error, ApiResult};
use crate::patients::parse_id;
use crate::AppState;
use api_shared::{
    AppointmentReq, AppointmentRes, AppointmentUpdateReq, CancelReq, ErrorRes,
    ListAppointmentsRes, ListStatusesRes, StatusChangeReq, StatusRes, TransitionsRes,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use clinic_core::{Appointment, AppointmentStatus, ClinicError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct AppointmentsQuery {
    patient_id: Option<String>,
}

fn to_res(state: &AppState, appointment: Appointment) -> AppointmentRes {
    let actions = state.appointments.actions(&appointment, Utc::now());
    AppointmentRes::new(appointment, &actions)
}

#[utoipa::path(
    get,
    path = "/appointment-statuses",
    responses(
        (status = 200, description = "The static status table", body = ListStatusesRes)
    )
)]
pub(crate) async fn list_statuses() -> Json<ListStatusesRes> {
    Json(ListStatusesRes {
        statuses: AppointmentStatus::all().iter().map(StatusRes::from).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/appointment-statuses/{id}/transitions",
    params(("id" = u8, Path, description = "Current status id")),
    responses(
        (status = 200, description = "Statuses reachable from this one", body = TransitionsRes),
        (status = 404, description = "Unknown status", body = ErrorRes)
    )
)]
/// Allowed transitions out of a status; empty for terminal statuses.
pub(crate) async fn list_transitions(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u8>,
) -> ApiResult<Json<TransitionsRes>> {
    if AppointmentStatus::from_id(id).is_none() {
        return Err(api_error(
            "List transitions",
            ClinicError::NotFound {
                kind: "appointment status",
                id: id.to_string(),
            },
        ));
    }
    let allowed = state.cfg.transitions().allowed(id);
    Ok(Json(TransitionsRes::new(id, allowed)))
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(("patient_id" = Option<String>, Query, description = "Only this patient's appointments")),
    responses(
        (status = 200, description = "Appointments in start-time order", body = ListAppointmentsRes),
        (status = 400, description = "Invalid patient id", body = ErrorRes)
    )
)]
pub(crate) async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentsQuery>,
) -> ApiResult<Json<ListAppointmentsRes>> {
    let patient_id = query
        .patient_id
        .as_deref()
        .map(|id| parse_id("List appointments", id))
        .transpose()?;

    let appointments = state
        .appointments
        .list(patient_id.as_ref())
        .into_iter()
        .map(|a| to_res(&state, a))
        .collect();
    Ok(Json(ListAppointmentsRes { appointments }))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = AppointmentReq,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Book an appointment; it starts in the `Scheduled` status.
pub(crate) async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<AppointmentReq>,
) -> ApiResult<(StatusCode, Json<AppointmentRes>)> {
    let new = req
        .into_new()
        .map_err(|e| api_error("Create appointment", e))?;
    let appointment = state
        .appointments
        .create(new, Utc::now())
        .map_err(|e| api_error("Create appointment", e))?;
    Ok((StatusCode::CREATED, Json(to_res(&state, appointment))))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment with its current actions", body = AppointmentRes),
        (status = 404, description = "Not found", body = ErrorRes)
    )
)]
pub(crate) async fn get_appointment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<AppointmentRes>> {
    let id = parse_id("Get appointment", &id)?;
    let appointment = state
        .appointments
        .get(&id)
        .map_err(|e| api_error("Get appointment", e))?;
    Ok(Json(to_res(&state, appointment)))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = AppointmentUpdateReq,
    responses(
        (status = 200, description = "Appointment updated", body = AppointmentRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Not found", body = ErrorRes),
        (status = 422, description = "Appointment is terminal or past", body = ErrorRes)
    )
)]
pub(crate) async fn update_appointment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<AppointmentUpdateReq>,
) -> ApiResult<Json<AppointmentRes>> {
    let id = parse_id("Update appointment", &id)?;
    let update = req
        .into_update()
        .map_err(|e| api_error("Update appointment", e))?;
    let appointment = state
        .appointments
        .update(&id, update, Utc::now())
        .map_err(|e| api_error("Update appointment", e))?;
    Ok(Json(to_res(&state, appointment)))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/status",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = StatusChangeReq,
    responses(
        (status = 200, description = "Transition stored", body = AppointmentRes),
        (status = 400, description = "Unknown status", body = ErrorRes),
        (status = 404, description = "Not found", body = ErrorRes),
        (status = 422, description = "Transition not allowed or notes missing", body = ErrorRes)
    )
)]
/// Commit a status transition.
///
/// The response is the appointment as stored after the change.
pub(crate) async fn change_status(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<StatusChangeReq>,
) -> ApiResult<Json<AppointmentRes>> {
    let id = parse_id("Change status", &id)?;
    let appointment = state
        .appointments
        .change_status(&id, req.status_id, req.notes, Utc::now())
        .map_err(|e| api_error("Change status", e))?;
    Ok(Json(to_res(&state, appointment)))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = CancelReq,
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentRes),
        (status = 404, description = "Not found", body = ErrorRes),
        (status = 422, description = "Notes missing, or appointment terminal or past", body = ErrorRes)
    )
)]
pub(crate) async fn cancel_appointment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<CancelReq>,
) -> ApiResult<Json<AppointmentRes>> {
    let id = parse_id("Cancel appointment", &id)?;
    let appointment = state
        .appointments
        .cancel(&id, req.notes, Utc::now())
        .map_err(|e| api_error("Cancel appointment", e))?;
    Ok(Json(to_res(&state, appointment)))
}

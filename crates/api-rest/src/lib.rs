//! # API REST
//!
//! REST API implementation for the clinic service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, API-key checks)
//!
//! Uses `api-shared` for wire types and `clinic-core` for every data operation.

#![warn(rust_2018_idioms)]

mod appointments;
mod error;
mod patients;
mod reference;

pub use error::{ApiError, ApiResult};

use api_shared::{validate_api_key, ErrorRes, HealthRes, HealthService, API_KEY_HEADER};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clinic_core::{AppointmentService, CoreConfig, PatientService, SomatometryService};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Shared by every handler. Built once at startup from the resolved [`CoreConfig`].
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    patients: PatientService,
    appointments: AppointmentService,
    somatometry: SomatometryService,
    api_key: Option<Arc<str>>,
}

impl AppState {
    /// `api_key`: when set (and not blank), every route except `/health` requires a matching
    /// `x-api-key` header.
    pub fn new(cfg: Arc<CoreConfig>, api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(Arc::from);

        Self {
            patients: PatientService::new(cfg.clone()),
            appointments: AppointmentService::new(cfg.clone()),
            somatometry: SomatometryService::new(cfg.clone()),
            cfg,
            api_key,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        patients::list_patients,
        patients::create_patient,
        patients::get_patient,
        patients::update_patient,
        patients::list_somatometry,
        patients::create_somatometry,
        patients::update_somatometry,
        patients::patient_growth,
        appointments::list_statuses,
        appointments::list_transitions,
        appointments::list_appointments,
        appointments::create_appointment,
        appointments::get_appointment,
        appointments::update_appointment,
        appointments::change_status,
        appointments::cancel_appointment,
        reference::reference_rows,
        reference::slider_bounds_for,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::PatientReq,
        api_shared::PatientRes,
        api_shared::ListPatientsRes,
        api_shared::SomatometryReq,
        api_shared::SomatometryRes,
        api_shared::ListSomatometryRes,
        api_shared::PercentileRowRes,
        api_shared::ReferenceRes,
        api_shared::BoundsRes,
        api_shared::IndicatorAssessmentRes,
        api_shared::AssessmentRes,
        api_shared::ChartPointRes,
        api_shared::ChartOverlayRes,
        api_shared::GrowthRes,
        api_shared::StatusRes,
        api_shared::ListStatusesRes,
        api_shared::TransitionsRes,
        api_shared::ActionsRes,
        api_shared::StatusChangeRes,
        api_shared::AppointmentRes,
        api_shared::ListAppointmentsRes,
        api_shared::AppointmentReq,
        api_shared::AppointmentUpdateReq,
        api_shared::StatusChangeReq,
        api_shared::CancelReq,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router: API routes, Swagger UI and CORS.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/patients",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            "/patients/:id",
            get(patients::get_patient).put(patients::update_patient),
        )
        .route(
            "/patients/:id/somatometry",
            get(patients::list_somatometry).post(patients::create_somatometry),
        )
        .route(
            "/patients/:id/somatometry/:record_id",
            axum::routing::put(patients::update_somatometry),
        )
        .route("/patients/:id/growth", get(patients::patient_growth))
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/appointments/:id",
            get(appointments::get_appointment).put(appointments::update_appointment),
        )
        .route("/appointments/:id/status", post(appointments::change_status))
        .route(
            "/appointments/:id/cancel",
            post(appointments::cancel_appointment),
        )
        .route("/appointment-statuses", get(appointments::list_statuses))
        .route(
            "/appointment-statuses/:id/transitions",
            get(appointments::list_transitions),
        )
        .route(
            "/reference/:indicator/:sex",
            get(reference::reference_rows),
        )
        .route(
            "/reference/:indicator/:sex/bounds",
            get(reference::slider_bounds_for),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match validate_api_key(provided, state.api_key.as_deref()) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            tracing::warn!("rejected {} {}: {}", req.method(), req.uri().path(), e);
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorRes {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks; never requires an API key.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method};
    use chrono::{Duration, Utc};
    use clinic_core::growth::ReferenceTable;
    use clinic_core::TransitionTable;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app(api_key: Option<&str>) -> (Router, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = Arc::new(
            CoreConfig::new(
                temp_dir.path().to_path_buf(),
                ReferenceTable::bundled().expect("bundled table"),
                TransitionTable::default(),
            )
            .expect("CoreConfig::new should succeed"),
        );
        let state = AppState::new(cfg, api_key.map(str::to_string));
        (router(state), temp_dir)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = axum::http::Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = app.clone().oneshot(req).await.expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create_patient(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/patients",
            Some(json!({
                "given_names": "Mateo",
                "family_name": "Rivas",
                "birth_date": "2023-01-15",
                "sex": "male"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().expect("patient id").to_string()
    }

    #[tokio::test]
    async fn health_is_open_even_with_api_key() {
        let (app, _dir) = test_app(Some("s3cret"));
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn api_key_is_enforced_when_configured() {
        let (app, _dir) = test_app(Some("s3cret"));

        let (status, body) = send(&app, Method::GET, "/patients", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("missing API key"));

        let req = axum::http::Request::builder()
            .uri("/patients")
            .header(API_KEY_HEADER, "s3cret")
            .body(Body::empty())
            .expect("valid request");
        let response = app.clone().oneshot(req).await.expect("router is infallible");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn somatometry_feeds_growth_assessment() {
        let (app, _dir) = test_app(None);
        let patient_id = create_patient(&app).await;

        let (status, record) = send(
            &app,
            Method::POST,
            &format!("/patients/{patient_id}/somatometry"),
            Some(json!({
                "measurement_date": "2024-01-15",
                "weight": 9.6,
                "height": 75.7,
                "head_circumference": 46.1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record["age_months"], json!(12));
        assert_eq!(record["bmi"], json!(16.75));

        let (status, growth) =
            send(&app, Method::GET, &format!("/patients/{patient_id}/growth"), None).await;
        assert_eq!(status, StatusCode::OK);
        let indicators = growth["assessment"]["indicators"]
            .as_array()
            .expect("indicators");
        let weight = indicators
            .iter()
            .find(|i| i["indicator"] == json!("weight"))
            .expect("weight assessed");
        assert_eq!(weight["percentile"], json!(50.0));
        assert_eq!(weight["classification"], json!("Normal"));
        assert_eq!(growth["charts"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn somatometry_rejects_client_supplied_bmi() {
        let (app, _dir) = test_app(None);
        let patient_id = create_patient(&app).await;

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/patients/{patient_id}/somatometry"),
            Some(json!({
                "measurement_date": "2024-01-15",
                "weight": 9.6,
                "height": 75.7,
                "bmi": 99.0
            })),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn appointment_status_flow() {
        let (app, _dir) = test_app(None);
        let patient_id = create_patient(&app).await;
        let scheduled_at = (Utc::now() + Duration::days(3)).to_rfc3339();

        let (status, appt) = send(
            &app,
            Method::POST,
            "/appointments",
            Some(json!({
                "patient_id": patient_id,
                "scheduled_at": scheduled_at,
                "duration_minutes": 30,
                "reason": "Well-child visit"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(appt["status_id"], json!(0));
        assert_eq!(appt["actions"]["can_edit"], json!(true));
        let id = appt["id"].as_str().expect("appointment id").to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/appointments/{id}/status"),
            Some(json!({ "status_id": 15 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().expect("message").contains("notes"));

        let (_, unchanged) = send(&app, Method::GET, &format!("/appointments/{id}"), None).await;
        assert_eq!(unchanged["status_id"], json!(0));

        let (status, cancelled) = send(
            &app,
            Method::POST,
            &format!("/appointments/{id}/status"),
            Some(json!({ "status_id": 15, "notes": "Doctor unavailable" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"]["terminal"], json!(true));
        assert_eq!(cancelled["actions"]["can_cancel"], json!(false));
        assert_eq!(cancelled["actions"]["next_statuses"], json!([]));

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/appointments/{id}/cancel"),
            Some(json!({ "notes": "again" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn transitions_endpoint() {
        let (app, _dir) = test_app(None);

        let (status, body) =
            send(&app, Method::GET, "/appointment-statuses/6/transitions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transitions"], json!([]));

        let (status, body) =
            send(&app, Method::GET, "/appointment-statuses/0/transitions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["transitions"].as_array().expect("list").is_empty());

        let (status, _) =
            send(&app, Method::GET, "/appointment-statuses/99/transitions", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, statuses) = send(&app, Method::GET, "/appointment-statuses", None).await;
        assert_eq!(statuses["statuses"].as_array().map(Vec::len), Some(17));
    }

    #[tokio::test]
    async fn reference_and_bounds() {
        let (app, _dir) = test_app(None);

        let (status, body) = send(&app, Method::GET, "/reference/weight/male", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unit"], json!("kg"));

        let (status, bounds) = send(
            &app,
            Method::GET,
            "/reference/weight/male/bounds?age_months=12",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bounds["min"], json!(6.2));
        assert_eq!(bounds["max"], json!(13.6));
        assert_eq!(bounds["fallback"], json!(false));

        let (status, _) = send(&app, Method::GET, "/reference/shoe-size/male", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_ids_are_bad_requests() {
        let (app, _dir) = test_app(None);

        let (status, _) = send(&app, Method::GET, "/patients/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::GET,
            "/patients/00112233445566778899aabbccddeeff",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

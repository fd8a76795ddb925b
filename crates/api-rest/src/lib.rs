//! # API REST
//!
//! REST API implementation for the clinic.
//!
//! Handles:
//! - HTTP endpoints with axum over the file-backed template and attendance services
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes, authentication headers)
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

use api_shared::{
    resolve_actor, validate_api_key, ActorHeaders, AuthError, DeleteRes, ErrorBody, HealthRes,
    HealthService,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path as AxumPath, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clinica_core::constants::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER, ACTOR_SPECIALTY_HEADER};
use clinica_core::models::{
    Appointment, AppointmentStatus, AttendanceRecord, ContentEnvelope, MedicalRecord,
    NewTemplate, Patient, QueueEntry, RecordPayload, Template, TemplateId, TemplateKind,
};
use anyhow::Context;
use clinica_core::{
    AttendanceService, ClinicError, CoreConfig, FormsService, PrimarySaveMode, Role, User,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Shared by all request handlers. The services are stateless over the clinic data directory,
/// so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    forms: Arc<FormsService>,
    attendance: Arc<AttendanceService>,
    api_key: Arc<str>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            forms: Arc::new(FormsService::new(cfg.clone())),
            attendance: Arc::new(AttendanceService::new(cfg.clone())),
            cfg,
            api_key: api_key.into(),
        }
    }
}

/// Resolves the server state from the environment.
///
/// # Environment Variables
/// - `CLINIC_DATA_DIR`: clinic data directory, created if missing (default: `clinic_data`)
/// - `API_KEY`: shared key clients must present as a bearer token (required)
///
/// # Errors
///
/// Fails if `API_KEY` is unset or the data directory cannot be created.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let clinic_data_dir = std::env::var("CLINIC_DATA_DIR")
        .unwrap_or_else(|_| clinica_core::constants::DEFAULT_CLINIC_DATA_DIR.into());
    let clinic_data_path = PathBuf::from(clinic_data_dir);
    std::fs::create_dir_all(&clinic_data_path)
        .with_context(|| format!("cannot create {}", clinic_data_path.display()))?;

    let api_key = std::env::var("API_KEY").context("API_KEY must be set")?;

    // The server only stores what clients submit; the save mode is an editor setting.
    let cfg = Arc::new(CoreConfig::new(clinic_data_path, PrimarySaveMode::default())?);
    Ok(AppState::new(cfg, api_key))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_templates,
        create_template,
        get_template,
        update_template,
        delete_template,
        my_appointments,
        get_record,
        start_attendance,
        cancel_attendance,
        finish_attendance,
        patient_history,
    ),
    components(schemas(
        HealthRes,
        ErrorBody,
        DeleteRes,
        Template,
        TemplateId,
        TemplateKind,
        NewTemplate,
        Patient,
        Appointment,
        AppointmentStatus,
        QueueEntry,
        MedicalRecord,
        RecordPayload,
        ContentEnvelope,
        AttendanceRecord,
        Role,
        User,
    ))
)]
pub struct ApiDoc;

/// Builds the router with every endpoint, Swagger UI and a permissive CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forms/templates", get(list_templates).post(create_template))
        .route(
            "/forms/templates/:id",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
        .route("/attendance/my-appointments", get(my_appointments))
        .route("/attendance/:id/record", get(get_record))
        .route("/attendance/:id/start", post(start_attendance))
        .route("/attendance/:id/cancel", post(cancel_attendance))
        .route("/attendance/:id/finish", post(finish_attendance))
        .route("/attendance/patient/:id/history", get(patient_history))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// ERRORS AND AUTHENTICATION
// ============================================================================

/// Error response: a status code and an [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            match err {
                ClinicError::InvalidInput(_)
                | ClinicError::InvalidInstance { .. }
                | ClinicError::InvalidSlice { .. }
                | ClinicError::Text(_)
                | ClinicError::Uuid(_) => StatusCode::BAD_REQUEST,
                ClinicError::Forbidden(_) => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {:?}", err);
            Self(status, "Internal error".into())
        } else {
            Self(status, err.to_string())
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ErrorBody::new(self.1))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// The authenticated user a request acts for.
///
/// Extraction fails with `401` unless the request carries the configured API key as a bearer
/// token and names its user in the identity headers.
pub struct Actor(pub User);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
}

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        validate_api_key(header_str(headers, "authorization"), &state.api_key)?;
        let user = resolve_actor(ActorHeaders {
            id: header_str(headers, ACTOR_ID_HEADER),
            role: header_str(headers, ACTOR_ROLE_HEADER),
            specialty: header_str(headers, ACTOR_SPECIALTY_HEADER),
        })?;
        Ok(Actor(user))
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Unauthenticated; used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/forms/templates",
    responses(
        (status = 200, description = "Active templates in catalog order", body = [Template]),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
/// List the template catalog
///
/// Returns every active template. There is no filtering; clients highlight templates that
/// match the user's specialty themselves.
#[axum::debug_handler]
async fn list_templates(State(state): State<AppState>, _actor: Actor) -> Json<Vec<Template>> {
    Json(state.forms.list_templates())
}

#[utoipa::path(
    post,
    path = "/forms/templates",
    request_body = NewTemplate,
    responses(
        (status = 201, description = "Template created", body = Template),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn create_template(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(req): Json<NewTemplate>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    let template = state.forms.create_template(req)?;
    tracing::debug!(user_id = %actor.id, template_id = %template.id, "template created via REST");
    Ok((StatusCode::CREATED, Json(template)))
}

#[utoipa::path(
    get,
    path = "/forms/templates/{id}",
    responses(
        (status = 200, description = "Template", body = Template),
        (status = 404, description = "Template not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn get_template(
    State(state): State<AppState>,
    _actor: Actor,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Template> {
    Ok(Json(state.forms.get_template(&id)?))
}

#[utoipa::path(
    put,
    path = "/forms/templates/{id}",
    request_body = NewTemplate,
    responses(
        (status = 200, description = "Template updated", body = Template),
        (status = 404, description = "Template not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn update_template(
    State(state): State<AppState>,
    _actor: Actor,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<NewTemplate>,
) -> ApiResult<Template> {
    Ok(Json(state.forms.update_template(&id, req)?))
}

#[utoipa::path(
    delete,
    path = "/forms/templates/{id}",
    responses(
        (status = 200, description = "Template deleted", body = DeleteRes),
        (status = 404, description = "Template not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn delete_template(
    State(state): State<AppState>,
    _actor: Actor,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<DeleteRes> {
    state.forms.delete_template(&id)?;
    Ok(Json(DeleteRes { ok: true }))
}

#[utoipa::path(
    get,
    path = "/attendance/my-appointments",
    responses(
        (status = 200, description = "The volunteer's queue by date and time", body = [QueueEntry]),
        (status = 403, description = "Not a volunteer", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn my_appointments(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> ApiResult<Vec<QueueEntry>> {
    Ok(Json(state.attendance.my_appointments(&actor)?))
}

#[utoipa::path(
    get,
    path = "/attendance/{id}/record",
    responses(
        (status = 200, description = "Appointment, patient and record (null if none)", body = AttendanceRecord),
        (status = 404, description = "Appointment not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn get_record(
    State(state): State<AppState>,
    _actor: Actor,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<AttendanceRecord> {
    Ok(Json(state.attendance.get_record(&id)?))
}

#[utoipa::path(
    post,
    path = "/attendance/{id}/start",
    responses(
        (status = 200, description = "Appointment in progress", body = Appointment),
        (status = 403, description = "Appointment belongs to another volunteer", body = ErrorBody),
        (status = 404, description = "Appointment not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn start_attendance(
    State(state): State<AppState>,
    Actor(actor): Actor,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Appointment> {
    Ok(Json(state.attendance.start(&actor, &id)?))
}

#[utoipa::path(
    post,
    path = "/attendance/{id}/cancel",
    responses(
        (status = 200, description = "Appointment reverted to scheduled", body = Appointment),
        (status = 403, description = "Appointment belongs to another volunteer", body = ErrorBody),
        (status = 404, description = "Appointment not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
async fn cancel_attendance(
    State(state): State<AppState>,
    Actor(actor): Actor,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Appointment> {
    Ok(Json(state.attendance.cancel(&actor, &id)?))
}

#[utoipa::path(
    post,
    path = "/attendance/{id}/finish",
    request_body = RecordPayload,
    responses(
        (status = 200, description = "Record created or replaced", body = MedicalRecord),
        (status = 403, description = "Appointment belongs to another volunteer", body = ErrorBody),
        (status = 404, description = "Appointment not found", body = ErrorBody)
    )
)]
/// Create or replace the record of an appointment
///
/// Base fields and the whole `content` envelope are replaced. Clients that own a single slice
/// must send the full envelope they read, with only their slice changed.
#[axum::debug_handler]
async fn finish_attendance(
    State(state): State<AppState>,
    Actor(actor): Actor,
    AxumPath(id): AxumPath<String>,
    Json(payload): Json<RecordPayload>,
) -> ApiResult<MedicalRecord> {
    Ok(Json(state.attendance.finish(&actor, &id, payload)?))
}

#[utoipa::path(
    get,
    path = "/attendance/patient/{id}/history",
    responses(
        (status = 200, description = "Records newest first", body = [MedicalRecord])
    )
)]
#[axum::debug_handler]
async fn patient_history(
    State(state): State<AppState>,
    _actor: Actor,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Vec<MedicalRecord>> {
    Ok(Json(state.attendance.patient_history(&id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use clinica_core::{NewAppointment, NonEmptyText};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    fn setup() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let cfg = Arc::new(
            CoreConfig::new(dir.path().to_path_buf(), PrimarySaveMode::default()).unwrap(),
        );
        let state = AppState::new(cfg, KEY);
        (dir, state)
    }

    fn request(
        method: &str,
        uri: &str,
        actor: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {KEY}"));
        if let Some((id, role)) = actor {
            builder = builder
                .header(ACTOR_ID_HEADER, id)
                .header(ACTOR_ROLE_HEADER, role);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let (_dir, state) = setup();
        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], true);
    }

    #[tokio::test]
    async fn test_wrong_key_is_unauthorized() {
        let (_dir, state) = setup();
        let response = router(state)
            .oneshot(
                Request::get("/forms/templates")
                    .header("authorization", "Bearer wrong")
                    .header(ACTOR_ID_HEADER, "adm")
                    .header(ACTOR_ROLE_HEADER, "ADMIN")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_template_crud() {
        let (_dir, state) = setup();
        let app = router(state);
        let admin = Some(("adm", "ADMIN"));

        let created = app
            .clone()
            .oneshot(request(
                "POST",
                "/forms/templates",
                admin,
                Some(json!({"title": "Anamnese Nutricional", "specialties": ["nutri"]})),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let listed = app
            .clone()
            .oneshot(request("GET", "/forms/templates", admin, None))
            .await
            .unwrap();
        let listed = body_json(listed).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["type"], "dynamic");

        let blank = app
            .clone()
            .oneshot(request("POST", "/forms/templates", admin, Some(json!({"title": " "}))))
            .await
            .unwrap();
        assert_eq!(blank.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let deleted = app
            .clone()
            .oneshot(request("DELETE", &format!("/forms/templates/{id}"), admin, None))
            .await
            .unwrap();
        assert_eq!(body_json(deleted).await, json!({"ok": true}));

        let missing = app
            .oneshot(request("GET", &format!("/forms/templates/{id}"), admin, None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_attendance_flow() {
        let (_dir, state) = setup();
        let patient = state
            .attendance
            .register_patient(NonEmptyText::new("Maria").unwrap())
            .unwrap();
        let appointment = state
            .attendance
            .schedule(NewAppointment {
                patient_id: patient.id.clone(),
                volunteer_id: "vol-1".into(),
                date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
                time: "10:00".into(),
            })
            .unwrap();
        let app = router(state);
        let volunteer = Some(("vol-1", "VOLUNTEER"));

        let queue = app
            .clone()
            .oneshot(request("GET", "/attendance/my-appointments", volunteer, None))
            .await
            .unwrap();
        let queue = body_json(queue).await;
        assert_eq!(queue[0]["patient_name"], "Maria");

        let foreign = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/attendance/{}/start", appointment.id),
                Some(("vol-2", "VOLUNTEER")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

        let record = app
            .clone()
            .oneshot(request(
                "GET",
                &format!("/attendance/{}/record", appointment.id),
                volunteer,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(body_json(record).await["record"], Value::Null);

        let finished = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/attendance/{}/finish", appointment.id),
                volunteer,
                Some(json!({
                    "chief_complaint": "dor",
                    "history": "2 dias",
                    "content": {"filled_forms": [], "mealPlan": []}
                })),
            ))
            .await
            .unwrap();
        assert_eq!(finished.status(), StatusCode::OK);
        let finished = body_json(finished).await;
        assert_eq!(finished["content"], json!({"filled_forms": [], "mealPlan": []}));

        let history = app
            .oneshot(request(
                "GET",
                &format!("/attendance/patient/{}/history", patient.id),
                Some(("staff-1", "STAFF")),
                None,
            ))
            .await
            .unwrap();
        let history = body_json(history).await;
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["volunteer_id"], "vol-1");
    }

    #[tokio::test]
    async fn test_unknown_appointment_is_not_found() {
        let (_dir, state) = setup();
        let response = router(state)
            .oneshot(request(
                "GET",
                "/attendance/nope/record",
                Some(("vol-1", "VOLUNTEER")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("nope"));
    }
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use chrono::Local;

use crate::{
    AppState, auth::verify_token, error::ApiError, models::ClassPayload, models::NextClass,
    models::NotesPayload, models::UnitNotes, schedule,
    validation::{validate_day, validate_time_string},
};

#[derive(Debug, serde::Deserialize)]
pub struct AuthQuery {
    pub token: Option<String>,
}

fn authorize(
    state: &AppState,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    query: &AuthQuery,
) -> Result<(), ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, query.token.as_deref())
}

fn validate_payload(payload: &ClassPayload) -> Result<(), ApiError> {
    validate_day(payload.day)?;
    validate_time_string(&payload.start_time)?;
    if !payload.end_time.is_empty() {
        validate_time_string(&payload.end_time)?;
    }
    Ok(())
}

#[utoipa::path(get, path = "/", tag = "timetable")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Unit Timetable API",
        "endpoints": {
            "/timetable": "All classes sorted by day and start time",
            "/timetable/classes": "Create a class (POST)",
            "/timetable/classes/{id}": "Fetch, update or delete one class",
            "/timetable/next": "The next upcoming class",
            "/timetable/day/{day}": "Classes for one day (0 = Sunday)",
            "/timetable.ical": "Download the coming week as an iCal file",
            "/units": "Distinct units with class counts",
            "/units/{unit}/classes": "Classes for one unit",
            "/units/{unit}/notes": "Read or replace notes for a unit"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "timetable")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "timetable")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    get,
    path = "/timetable",
    params(
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "All classes sorted by day, start time, unit", body = [crate::models::ClassEntry]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn list_timetable(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    Ok(Json(state.store.all_sorted()))
}

#[utoipa::path(
    post,
    path = "/timetable/classes",
    request_body = ClassPayload,
    responses(
        (status = 201, description = "Class created and reminder armed", body = crate::models::ClassEntry),
        (status = 400, description = "Invalid day or time"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn create_class(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Json(payload): Json<ClassPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    validate_payload(&payload)?;

    let entry = state.store.add(payload);
    state.scheduler.arm(&entry.id);
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/timetable/classes/{id}",
    params(("id" = String, Path, description = "Class id")),
    responses(
        (status = 200, body = crate::models::ClassEntry),
        (status = 404, description = "Unknown class id")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn get_class(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    let entry = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("class {id} not found")))?;
    Ok(Json(entry))
}

#[utoipa::path(
    put,
    path = "/timetable/classes/{id}",
    params(("id" = String, Path, description = "Class id")),
    request_body = ClassPayload,
    responses(
        (status = 200, description = "Class updated and reminder re-armed", body = crate::models::ClassEntry),
        (status = 400, description = "Invalid day or time"),
        (status = 404, description = "Unknown class id")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn update_class(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Path(id): Path<String>,
    Json(payload): Json<ClassPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    validate_payload(&payload)?;

    let entry = state.store.update(&id, payload)?;
    // The old timer may hold pre-edit timing; replace it.
    state.scheduler.arm(&entry.id);
    Ok(Json(entry))
}

#[utoipa::path(
    delete,
    path = "/timetable/classes/{id}",
    params(("id" = String, Path, description = "Class id")),
    responses(
        (status = 204, description = "Class deleted, reminder cancelled"),
        (status = 404, description = "Unknown class id")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn delete_class(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    // Cancel before removal so no fire can land on a half-deleted entry.
    state.scheduler.cancel(&id);
    state.store.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/timetable/classes/{id}/notes",
    params(("id" = String, Path, description = "Class id")),
    request_body = NotesPayload,
    responses(
        (status = 200, description = "Notes replaced on the class", body = crate::models::ClassEntry),
        (status = 404, description = "Unknown class id")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn put_class_notes(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Path(id): Path<String>,
    Json(payload): Json<NotesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    // Notes carry no timing, so the outstanding timer stays as it is.
    state.store.update_entry_notes(&id, payload.text)?;
    let entry = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("class {id} not found")))?;
    Ok(Json(entry))
}

#[utoipa::path(
    get,
    path = "/timetable/next",
    responses(
        (status = 200, description = "The next upcoming class", body = crate::models::NextClass),
        (status = 404, description = "No classes recorded")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn next_class(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;

    let now = Local::now().naive_local();
    let entries = state.store.all();
    let (entry, starts_at) = schedule::next_class(&entries, now)
        .ok_or_else(|| ApiError::NotFound("No upcoming classes".into()))?;

    Ok(Json(NextClass {
        day: schedule::day_short(entry.day).to_string(),
        minutes_until: (starts_at - now).num_minutes(),
        starts_at,
        class: entry.clone(),
    }))
}

#[utoipa::path(
    get,
    path = "/timetable/day/{day}",
    params(("day" = u8, Path, description = "Day-of-week index, 0 = Sunday")),
    responses(
        (status = 200, description = "That day's classes sorted by start time", body = [crate::models::ClassEntry]),
        (status = 400, description = "Day outside 0-6")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn classes_for_day(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Path(day): Path<u8>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    let day = validate_day(day)?;
    Ok(Json(state.store.classes_for_day(day)))
}

#[utoipa::path(
    get,
    path = "/timetable.ical",
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "No classes recorded")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "timetable"
)]
pub async fn get_ical(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;

    let classes = state.store.all_sorted();
    if classes.is_empty() {
        return Err(ApiError::NotFound("No classes found".into()));
    }

    let body = state
        .exporter
        .generate(&classes, Local::now().naive_local());
    Ok((
        StatusCode::OK,
        [
            ("content-type", "text/calendar"),
            (
                "content-disposition",
                "attachment; filename=unit_timetable.ics",
            ),
        ],
        body,
    ))
}

#[utoipa::path(
    get,
    path = "/units",
    responses(
        (status = 200, description = "Distinct units with class counts", body = [crate::models::UnitSummary])
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "units"
)]
pub async fn list_units(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    Ok(Json(state.store.unique_units()))
}

#[utoipa::path(
    get,
    path = "/units/{unit}/classes",
    params(("unit" = String, Path, description = "Unit name")),
    responses(
        (status = 200, description = "Classes for the unit, sorted by day and start time", body = [crate::models::ClassEntry])
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "units"
)]
pub async fn unit_classes(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Path(unit): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    Ok(Json(state.store.classes_for_unit(&unit)))
}

#[utoipa::path(
    get,
    path = "/units/{unit}/notes",
    params(("unit" = String, Path, description = "Unit name")),
    responses(
        (status = 200, description = "Notes for the unit (empty string when none)", body = crate::models::UnitNotes)
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "units"
)]
pub async fn get_unit_notes(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Path(unit): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    let text = state.store.notes_for_unit(&unit);
    Ok(Json(UnitNotes { unit, text }))
}

#[utoipa::path(
    put,
    path = "/units/{unit}/notes",
    params(("unit" = String, Path, description = "Unit name")),
    request_body = NotesPayload,
    responses(
        (status = 200, description = "Notes replaced", body = crate::models::UnitNotes)
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "units"
)]
pub async fn put_unit_notes(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<AuthQuery>,
    Path(unit): Path<String>,
    Json(payload): Json<NotesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    state.store.save_notes_for_unit(&unit, payload.text.clone());
    Ok(Json(UnitNotes {
        unit,
        text: payload.text,
    }))
}

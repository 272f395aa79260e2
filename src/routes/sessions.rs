use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session_dto::{CreateEntryPayload, SessionListQuery, SessionResponse, UpdateEntryPayload},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/sessions",
    params(
        ("start_date" = Option<String>, Query, description = "First day, defaults to 30 days ago"),
        ("end_date" = Option<String>, Query, description = "Last day, defaults to today"),
        ("project_id" = Option<Uuid>, Query, description = "Only this project")
    ),
    responses(
        (status = 200, description = "Caller's sessions ordered by day then start", body = Vec<SessionResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<SessionListQuery>,
) -> Result<impl IntoResponse> {
    let (from, to) = state
        .dashboard_service
        .range(query.start_date.as_deref(), query.end_date.as_deref());
    let now = state.clock.now();
    let sessions: Vec<SessionResponse> = state
        .timer_service
        .list_in_range(actor.id, from, to, query.project_id)
        .await?
        .into_iter()
        .map(|s| SessionResponse::at(s, now))
        .collect();
    Ok(Json(sessions))
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateEntryPayload,
    responses(
        (status = 201, description = "Manual entry created", body = SessionResponse),
        (status = 400, description = "Invalid interval or overlapping entry")
    )
)]
#[axum::debug_handler]
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state.timer_service.create_entry(&actor, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::at(session, state.clock.now())),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = UpdateEntryPayload,
    responses(
        (status = 200, description = "Entry updated", body = SessionResponse),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Session is still running")
    )
)]
#[axum::debug_handler]
pub async fn update_entry(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEntryPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state.timer_service.update_entry(&actor, id, payload).await?;
    Ok(Json(SessionResponse::at(session, state.clock.now())))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 403, description = "Neither owner nor manager"),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.timer_service.delete_entry(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

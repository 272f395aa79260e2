use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::session_dto::{RunningTimerResponse, SessionResponse, StartTimerPayload},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/timer",
    responses(
        (status = 200, description = "Running session with live hours, or null", body = RunningTimerResponse)
    )
)]
#[axum::debug_handler]
pub async fn running(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let now = state.clock.now();
    let running = state
        .timer_service
        .running(actor.id)
        .await?
        .map(|session| RunningTimerResponse::at(session, now));
    Ok(Json(json!({ "running": running })))
}

/// The body is optional; an empty request starts an unassigned timer.
#[utoipa::path(
    post,
    path = "/api/timer/start",
    request_body = StartTimerPayload,
    responses(
        (status = 201, description = "Timer started", body = RunningTimerResponse),
        (status = 409, description = "A timer is already running")
    )
)]
#[axum::debug_handler]
pub async fn start(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Option<Json<StartTimerPayload>>,
) -> Result<impl IntoResponse> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let session = state.timer_service.start(&actor, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RunningTimerResponse::at(session, state.clock.now())),
    ))
}

#[utoipa::path(
    post,
    path = "/api/timer/stop",
    responses(
        (status = 200, description = "Timer stopped", body = SessionResponse),
        (status = 404, description = "No running timer")
    )
)]
#[axum::debug_handler]
pub async fn stop(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let session = state.timer_service.stop(&actor).await?;
    Ok(Json(SessionResponse::at(session, state.clock.now())))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::report_dto::SubmitReportPayload,
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/reports",
    responses(
        (status = 200, description = "Caller's reports, most recent first", body = Vec<Report>)
    )
)]
#[axum::debug_handler]
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let reports = state.report_service.list_for_user(actor.id).await?;
    Ok(Json(reports))
}

#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = SubmitReportPayload,
    responses(
        (status = 201, description = "Report submitted for review", body = Report),
        (status = 400, description = "Blank content, negative hours or nothing to total"),
        (status = 409, description = "A pending report already exists for this period")
    )
)]
#[axum::debug_handler]
pub async fn submit_report(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<SubmitReportPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let report = state.report_service.submit(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = Report),
        (status = 403, description = "Not the owner and not a manager"),
        (status = 404, description = "Report not found")
    )
)]
#[axum::debug_handler]
pub async fn get_report(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let report = state.report_service.get(&actor, id).await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/history",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Submission and review events, oldest first"),
        (status = 403, description = "Not the owner and not a manager")
    )
)]
#[axum::debug_handler]
pub async fn report_history(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let history = state.report_service.history(&actor, id).await?;
    Ok(Json(history))
}

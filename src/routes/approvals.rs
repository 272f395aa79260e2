use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::report_dto::{DecisionPayload, ReviewedQuery},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/approvals/pending",
    responses(
        (status = 200, description = "Review queue, oldest first", body = Vec<ReportWithSubmitter>),
        (status = 403, description = "Manager role required")
    )
)]
#[axum::debug_handler]
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    actor.require_manager()?;
    let reports = state.approval_service.list_pending().await?;
    Ok(Json(reports))
}

#[utoipa::path(
    get,
    path = "/api/approvals/reviewed",
    params(
        ("status" = String, Query, description = "approved or rejected"),
        ("limit" = Option<i64>, Query, description = "At most 50")
    ),
    responses(
        (status = 200, description = "Latest decisions", body = Vec<ReportWithSubmitter>),
        (status = 400, description = "Status is not terminal")
    )
)]
#[axum::debug_handler]
pub async fn list_reviewed(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ReviewedQuery>,
) -> Result<impl IntoResponse> {
    let reports = state
        .approval_service
        .list_reviewed(&actor, query.status, query.limit)
        .await?;
    Ok(Json(reports))
}

#[utoipa::path(
    post,
    path = "/api/approvals/{id}/decide",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Decision recorded", body = Report),
        (status = 403, description = "Manager role required"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report was already decided")
    )
)]
#[axum::debug_handler]
pub async fn decide(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let report = state.approval_service.decide(&actor, id, payload).await?;
    Ok(Json(report))
}

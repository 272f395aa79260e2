use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    dto::dashboard_dto::{EmployeeHoursQuery, RangeQuery},
    error::Result,
    models::user::Actor,
    services::export_service::{ExportService, CSV_CONTENT_TYPE},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/analytics/project-hours",
    params(
        ("start_date" = Option<String>, Query, description = "First day, defaults to 30 days ago"),
        ("end_date" = Option<String>, Query, description = "Last day, defaults to today")
    ),
    responses(
        (status = 200, description = "Hours per project across all users", body = Vec<ProjectHours>),
        (status = 403, description = "Manager role required")
    )
)]
#[axum::debug_handler]
pub async fn project_hours(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse> {
    let (from, to) = state
        .dashboard_service
        .range(query.start_date.as_deref(), query.end_date.as_deref());
    let rows = state.dashboard_service.project_hours(&actor, from, to).await?;
    let total_hours: f64 = rows.iter().map(|r| r.hours).sum();
    Ok(Json(serde_json::json!({
        "start_date": from,
        "end_date": to,
        "rows": rows,
        "total_hours": crate::utils::time::round2(total_hours),
    })))
}

#[utoipa::path(
    get,
    path = "/api/analytics/project-hours/export",
    params(
        ("start_date" = Option<String>, Query, description = "First day"),
        ("end_date" = Option<String>, Query, description = "Last day")
    ),
    responses(
        (status = 200, description = "hours_by_project.csv download"),
        (status = 403, description = "Manager role required")
    )
)]
#[axum::debug_handler]
pub async fn export_project_hours(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse> {
    let (from, to) = state
        .dashboard_service
        .range(query.start_date.as_deref(), query.end_date.as_deref());
    let rows = state.dashboard_service.project_hours(&actor, from, to).await?;
    let buffer = ExportService::project_hours_csv(&rows)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"hours_by_project.csv\"",
            ),
        ],
        buffer,
    ))
}

#[utoipa::path(
    get,
    path = "/api/analytics/employee-hours",
    params(
        ("start_date" = Option<String>, Query, description = "First day, defaults to 30 days ago"),
        ("end_date" = Option<String>, Query, description = "Last day, defaults to today"),
        ("project_id" = Option<String>, Query, description = "Restrict to one project")
    ),
    responses(
        (status = 200, description = "Hours per employee and project", body = Vec<EmployeeProjectHours>),
        (status = 403, description = "Manager role required")
    )
)]
#[axum::debug_handler]
pub async fn employee_hours(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<EmployeeHoursQuery>,
) -> Result<impl IntoResponse> {
    let (from, to) = state
        .dashboard_service
        .range(query.start_date.as_deref(), query.end_date.as_deref());
    let rows = state
        .dashboard_service
        .employee_project_hours(&actor, from, to, query.project_id)
        .await?;
    Ok(Json(serde_json::json!({
        "start_date": from,
        "end_date": to,
        "project_id": query.project_id,
        "rows": rows,
    })))
}

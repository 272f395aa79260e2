use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    dto::dashboard_dto::{ExportFormat, ExportKind, ExportQuery},
    dto::session_dto::SessionListQuery,
    error::Result,
    models::user::Actor,
    services::export_service::{ExportService, CSV_CONTENT_TYPE, XLSX_CONTENT_TYPE},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/timesheet",
    params(
        ("start_date" = Option<String>, Query, description = "First day, defaults to 30 days ago"),
        ("end_date" = Option<String>, Query, description = "Last day, defaults to today"),
        ("project_id" = Option<String>, Query, description = "Only this project (UUID)")
    ),
    responses(
        (status = 200, description = "Entries with per-project and per-day totals", body = TimesheetView)
    )
)]
#[axum::debug_handler]
pub async fn timesheet(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<SessionListQuery>,
) -> Result<impl IntoResponse> {
    let (from, to) = state
        .dashboard_service
        .range(query.start_date.as_deref(), query.end_date.as_deref());
    let view = state
        .dashboard_service
        .timesheet(&actor, from, to, query.project_id)
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/timesheet/export",
    params(
        ("format" = Option<String>, Query, description = "csv (default) or xlsx"),
        ("kind" = Option<String>, Query, description = "summary or details (default), csv only"),
        ("start_date" = Option<String>, Query, description = "First day"),
        ("end_date" = Option<String>, Query, description = "Last day"),
        ("project_id" = Option<String>, Query, description = "Only this project (UUID)")
    ),
    responses(
        (status = 200, description = "File download")
    )
)]
#[axum::debug_handler]
pub async fn export(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let (from, to) = state
        .dashboard_service
        .range(query.start_date.as_deref(), query.end_date.as_deref());
    let view = state
        .dashboard_service
        .timesheet(&actor, from, to, query.project_id)
        .await?;

    let (buffer, content_type, filename) = match (query.format, query.kind) {
        (ExportFormat::Xlsx, _) => (
            ExportService::timesheet_xlsx(&view)?,
            XLSX_CONTENT_TYPE,
            format!("timesheet_{}_{}.xlsx", from.format("%Y%m%d"), to.format("%Y%m%d")),
        ),
        (ExportFormat::Csv, ExportKind::Summary) => (
            ExportService::timesheet_summary_csv(&view.by_project)?,
            CSV_CONTENT_TYPE,
            "timesheet_summary.csv".to_string(),
        ),
        (ExportFormat::Csv, ExportKind::Details) => (
            ExportService::timesheet_details_csv(&view.entries)?,
            CSV_CONTENT_TYPE,
            "timesheet_details.csv".to_string(),
        ),
    };
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::project_dto::{CreateProjectPayload, ProjectListQuery, UpdateProjectPayload},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/projects",
    params(
        ("include_inactive" = Option<bool>, Query, description = "Managers only")
    ),
    responses(
        (status = 200, description = "Projects ordered by name", body = Vec<Project>)
    )
)]
#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse> {
    let projects = state
        .project_service
        .list(&actor, query.include_inactive)
        .await?;
    Ok(Json(projects))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let project = state.project_service.get(id).await?;
    Ok(Json(project))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectPayload,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 403, description = "Manager role required")
    )
)]
#[axum::debug_handler]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let project = state.project_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = UpdateProjectPayload,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 403, description = "Manager role required"),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let project = state.project_service.update(&actor, id, payload).await?;
    Ok(Json(project))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 403, description = "Manager role required"),
        (status = 409, description = "Project has timesheet entries")
    )
)]
#[axum::debug_handler]
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.project_service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::path::PathBuf;
use uuid::Uuid;

use crate::{
    dto::auth_dto::{UserListQuery, UserResponse},
    error::{Error, Result},
    models::user::Actor,
    services::user_service::avatar_relative_path,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get(actor.id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/me",
    responses(
        (status = 204, description = "Account and owned records deleted")
    )
)]
#[axum::debug_handler]
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    state.user_service.delete(&actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/me/avatar",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar stored", body = UserResponse),
        (status = 400, description = "Missing file or unsupported image type")
    )
)]
#[axum::debug_handler]
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get(actor.id).await?;

    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        if field.name() != Some("avatar") {
            continue;
        }
        let filename = field.file_name().unwrap_or("avatar").to_string();
        let relative = avatar_relative_path(&user.username, &filename)?;
        let data = field.bytes().await.map_err(Error::Multipart)?;
        if data.is_empty() {
            return Err(Error::BadRequest("Uploaded file is empty".to_string()));
        }

        let target = PathBuf::from(&state.config.media_dir).join(&relative);
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&target, data).await?;
        tracing::info!(user_id = %actor.id, path = %relative, "avatar uploaded");

        let user = state.user_service.set_avatar(&actor, &relative).await?;
        return Ok(Json(UserResponse::from(user)));
    }

    Err(Error::BadRequest("avatar file is required".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("role" = Option<String>, Query, description = "employee or manager")
    ),
    responses(
        (status = 200, description = "Directory ordered by username", body = Vec<UserResponse>),
        (status = 403, description = "Manager role required")
    )
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse> {
    let users = state.user_service.list(&actor, query.role).await?;
    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Profile, sessions, reports and 90-day project totals"),
        (status = 403, description = "Manager role required"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn user_detail(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state.dashboard_service.user_detail(&actor, id).await?;
    Ok(Json(detail))
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    dto::auth_dto::{AuthResponse, LoginPayload, RegisterPayload, UserResponse},
    error::Result,
    middleware::auth::issue_token,
    models::user::User,
    AppState,
};

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse> {
    let token = issue_token(
        &state.config.jwt_secret,
        &user,
        state.config.jwt_ttl_hours,
        state.clock.now(),
    )?;
    Ok(AuthResponse {
        token,
        user: UserResponse::from(user),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username already taken")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed bearer token", body = AuthResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .authenticate(&payload.username, &payload.password)
        .await?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(auth_response(&state, user)?))
}

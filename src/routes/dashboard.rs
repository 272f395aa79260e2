use axum::{extract::State, response::IntoResponse, Extension, Json};

use crate::{error::Result, models::user::Actor, AppState};

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Employee or manager view, tagged by role", body = Dashboard)
    )
)]
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let dashboard = state.dashboard_service.for_actor(&actor).await?;
    Ok(Json(dashboard))
}

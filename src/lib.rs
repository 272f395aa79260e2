pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::{
    auth::{require_auth, require_manager},
    cors::api_cors,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::services::{
    approval_service::ApprovalService, dashboard_service::DashboardService,
    project_service::ProjectService, report_service::ReportService, timer_service::TimerService,
    user_service::UserService,
};
use crate::utils::time::{system_clock, SharedClock};

/// Avatars are small; anything larger is refused before it hits the handler.
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub clock: SharedClock,
    pub user_service: UserService,
    pub project_service: ProjectService,
    pub timer_service: TimerService,
    pub report_service: ReportService,
    pub approval_service: ApprovalService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        Self::with_clock(pool, config, system_clock())
    }

    pub fn with_clock(pool: PgPool, config: Arc<Config>, clock: SharedClock) -> Self {
        Self {
            user_service: UserService::new(pool.clone(), clock.clone()),
            project_service: ProjectService::new(pool.clone(), clock.clone()),
            timer_service: TimerService::new(pool.clone(), clock.clone()),
            report_service: ReportService::new(pool.clone(), clock.clone()),
            approval_service: ApprovalService::new(pool.clone(), clock.clone()),
            dashboard_service: DashboardService::new(pool.clone(), clock.clone()),
            pool,
            config,
            clock,
        }
    }
}

/// Full HTTP surface; shared by the binary and the router tests.
pub fn app(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login));

    let manager_api = Router::new()
        .route("/api/users", get(routes::users::list_users))
        .route("/api/users/:id", get(routes::users::user_detail))
        .route("/api/approvals/pending", get(routes::approvals::list_pending))
        .route("/api/approvals/reviewed", get(routes::approvals::list_reviewed))
        .route("/api/approvals/:id/decide", post(routes::approvals::decide))
        .route(
            "/api/analytics/project-hours",
            get(routes::analytics::project_hours),
        )
        .route(
            "/api/analytics/project-hours/export",
            get(routes::analytics::export_project_hours),
        )
        .route(
            "/api/analytics/employee-hours",
            get(routes::analytics::employee_hours),
        )
        .route_layer(from_fn(require_manager));

    let member_api = Router::new()
        .route(
            "/api/me",
            get(routes::users::me).delete(routes::users::delete_me),
        )
        .route("/api/me/avatar", post(routes::users::upload_avatar))
        .route("/api/dashboard", get(routes::dashboard::dashboard))
        .route("/api/timer", get(routes::timer::running))
        .route("/api/timer/start", post(routes::timer::start))
        .route("/api/timer/stop", post(routes::timer::stop))
        .route(
            "/api/sessions",
            get(routes::sessions::list_sessions).post(routes::sessions::create_entry),
        )
        .route(
            "/api/sessions/:id",
            patch(routes::sessions::update_entry).delete(routes::sessions::delete_entry),
        )
        .route("/api/timesheet", get(routes::timesheet::timesheet))
        .route("/api/timesheet/export", get(routes::timesheet::export))
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/:id",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/api/reports",
            get(routes::reports::list_reports).post(routes::reports::submit_report),
        )
        .route("/api/reports/:id", get(routes::reports::get_report))
        .route("/api/reports/:id/history", get(routes::reports::report_history))
        .merge(manager_api)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let limiter = RateLimiter::new(state.config.api_rps);
    let api = public_api
        .merge(member_api)
        .layer(from_fn_with_state(limiter, rps_middleware));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(api)
        .nest_service(
            "/media",
            tower_http::services::ServeDir::new(&state.config.media_dir),
        )
        .with_state(state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

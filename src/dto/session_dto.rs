use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::work_session::WorkSession;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StartTimerPayload {
    pub project_id: Option<Uuid>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEntryPayload {
    pub project_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub break_minutes: i32,
    pub billable: Option<bool>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEntryPayload {
    pub project_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub break_minutes: Option<i32>,
    pub billable: Option<bool>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: WorkSession,
    pub hours: f64,
}

impl SessionResponse {
    pub fn at(session: WorkSession, now: DateTime<Utc>) -> Self {
        let hours = session.hours(now);
        Self { session, hours }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningTimerResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub start_ms: i64,
}

impl RunningTimerResponse {
    pub fn at(session: WorkSession, now: DateTime<Utc>) -> Self {
        let start_ms = session.started_at.timestamp_millis();
        Self {
            session: SessionResponse::at(session, now),
            start_ms,
        }
    }
}

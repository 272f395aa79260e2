use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::dto::session_dto::{RunningTimerResponse, SessionResponse};
use crate::models::report::{Report, ReportWithSubmitter};

/// Role-dispatched landing data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Employee(EmployeeDashboard),
    Manager(ManagerDashboard),
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDashboard {
    pub running: Option<RunningTimerResponse>,
    pub recent_sessions: Vec<SessionResponse>,
    pub sessions: Vec<SessionResponse>,
    pub reports: Vec<Report>,
    pub week_start: NaiveDate,
    pub this_week_hours: f64,
    pub approved_this_week: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerDashboard {
    pub pending: Vec<ReportWithSubmitter>,
    pub hours: Vec<UserPeriodHours>,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub approved_this_month: i64,
    pub running: Option<RunningTimerResponse>,
    pub this_week_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPeriodHours {
    pub user_id: Uuid,
    pub username: String,
    pub period_start: NaiveDate,
    pub period: String,
    pub hours: f64,
}

/// One finished session, reduced to what the aggregations need.
#[derive(Debug, Clone, FromRow)]
pub struct SessionMinutesRow {
    pub user_id: Uuid,
    pub username: String,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectMinutesRow {
    pub project_name: Option<String>,
    pub billable: bool,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectHours {
    pub project: String,
    pub hours: f64,
    pub billable_hours: f64,
    pub percent_billable: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct EmployeeProjectMinutesRow {
    pub user_id: Uuid,
    pub username: String,
    pub project_name: Option<String>,
    pub billable: bool,
    pub duration_minutes: i32,
}

/// One employee × project cell of the manager's employee report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProjectHours {
    pub user_id: Uuid,
    pub employee: String,
    pub project: String,
    pub hours: f64,
    pub billable_hours: f64,
    pub percent_billable: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeHoursQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTotal {
    pub name: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyHours {
    pub date: NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A timesheet line with its project name resolved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimesheetEntry {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub work_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub break_minutes: i32,
    pub duration_minutes: i32,
    pub billable: bool,
    pub notes: String,
}

impl TimesheetEntry {
    pub fn project_label(&self) -> &str {
        self.project_name.as_deref().unwrap_or(UNASSIGNED)
    }
}

pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Serialize)]
pub struct TimesheetView {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub entries: Vec<TimesheetEntry>,
    pub by_project: Vec<ProjectTotal>,
    pub by_day: Vec<DailyHours>,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Summary,
    #[default]
    Details,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub kind: ExportKind,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub project_id: Option<Uuid>,
}

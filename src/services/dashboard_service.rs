use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::auth_dto::{UserDetailResponse, UserResponse};
use crate::dto::dashboard_dto::{
    DailyHours, Dashboard, EmployeeDashboard, EmployeeProjectHours, EmployeeProjectMinutesRow,
    ManagerDashboard, ProjectHours, ProjectMinutesRow, ProjectTotal, SessionMinutesRow,
    TimesheetEntry, TimesheetView, UserPeriodHours, UNASSIGNED,
};
use crate::dto::session_dto::{RunningTimerResponse, SessionResponse};
use crate::error::Result;
use crate::models::user::{Actor, Role};
use crate::services::approval_service::ApprovalService;
use crate::services::report_service::ReportService;
use crate::services::timer_service::TimerService;
use crate::services::user_service::UserService;
use crate::utils::time::{
    current_week, iso_week_label, minutes_to_hours, month_start, resolve_range, round2, week_bounds, SharedClock,
};

const RECENT_SESSIONS: usize = 5;
const USER_DETAIL_DAYS: i64 = 90;

#[derive(Clone)]
pub struct DashboardService {
    pool: PgPool,
    clock: SharedClock,
    timer: TimerService,
    reports: ReportService,
    approvals: ApprovalService,
    users: UserService,
}

impl DashboardService {
    pub fn new(pool: PgPool, clock: SharedClock) -> Self {
        Self {
            timer: TimerService::new(pool.clone(), clock.clone()),
            reports: ReportService::new(pool.clone(), clock.clone()),
            approvals: ApprovalService::new(pool.clone(), clock.clone()),
            users: UserService::new(pool.clone(), clock.clone()),
            pool,
            clock,
        }
    }

    /// Query-string window resolved against the service clock.
    pub fn range(&self, start: Option<&str>, end: Option<&str>) -> (NaiveDate, NaiveDate) {
        resolve_range(start, end, self.clock.now().date_naive())
    }

    pub async fn for_actor(&self, actor: &Actor) -> Result<Dashboard> {
        if actor.role.is_manager() {
            Ok(Dashboard::Manager(self.manager_view(actor).await?))
        } else {
            Ok(Dashboard::Employee(self.employee_view(actor).await?))
        }
    }

    pub async fn employee_view(&self, actor: &Actor) -> Result<EmployeeDashboard> {
        let now = self.clock.now();
        let (week_start, week_end) = current_week(self.clock.as_ref());

        let running = self
            .timer
            .running(actor.id)
            .await?
            .map(|s| RunningTimerResponse::at(s, now));
        let sessions: Vec<SessionResponse> = self
            .timer
            .list_for_user(actor.id)
            .await?
            .into_iter()
            .map(|s| SessionResponse::at(s, now))
            .collect();
        let recent_sessions = sessions.iter().take(RECENT_SESSIONS).cloned().collect();

        Ok(EmployeeDashboard {
            running,
            recent_sessions,
            sessions,
            reports: self.reports.list_for_user(actor.id).await?,
            week_start,
            this_week_hours: self.timer.total_hours(actor.id, week_start, week_end).await?,
            approved_this_week: self.reports.is_week_approved(actor.id, week_start).await?,
        })
    }

    pub async fn manager_view(&self, actor: &Actor) -> Result<ManagerDashboard> {
        actor.require_manager()?;
        let now = self.clock.now();
        let (range_start, range_end) = self.range(None, None);
        let (week_start, week_end) = week_bounds(now.date_naive());

        let rows = self.session_minutes(range_start, range_end).await?;
        let month_began = month_start(now.date_naive())
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);

        Ok(ManagerDashboard {
            pending: self.approvals.list_pending().await?,
            hours: aggregate_user_weeks(&rows),
            range_start,
            range_end,
            approved_this_month: self.approvals.count_approved_since(month_began).await?,
            running: self
                .timer
                .running(actor.id)
                .await?
                .map(|s| RunningTimerResponse::at(s, now)),
            this_week_hours: self.timer.total_hours(actor.id, week_start, week_end).await?,
        })
    }

    pub async fn timesheet(
        &self,
        actor: &Actor,
        from: NaiveDate,
        to: NaiveDate,
        project_id: Option<Uuid>,
    ) -> Result<TimesheetView> {
        let entries = sqlx::query_as::<_, TimesheetEntry>(
            r#"
            SELECT s.id, s.project_id, p.name AS project_name, s.work_date, s.started_at,
                   s.stopped_at, s.break_minutes, s.duration_minutes, s.billable, s.notes
            FROM work_sessions s
            LEFT JOIN projects p ON p.id = s.project_id
            WHERE s.user_id = $1
              AND s.work_date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR s.project_id = $4)
            ORDER BY s.work_date ASC, s.started_at ASC
            "#,
        )
        .bind(actor.id)
        .bind(from)
        .bind(to)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        let by_project = project_totals(
            entries
                .iter()
                .map(|e| (e.project_label(), e.duration_minutes)),
        );
        let by_day = totals_by_day(&entries);
        let total_minutes: i64 = entries.iter().map(|e| e.duration_minutes as i64).sum();

        Ok(TimesheetView {
            start_date: from,
            end_date: to,
            entries,
            by_project,
            by_day,
            total_hours: minutes_to_hours(total_minutes),
        })
    }

    /// Hours per project across every user, with the billable share.
    pub async fn project_hours(
        &self,
        actor: &Actor,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ProjectHours>> {
        actor.require_manager()?;
        let rows = self.project_minutes(None, from, to).await?;
        Ok(aggregate_projects(&rows))
    }

    /// Hours per employee and project, managers excluded.
    pub async fn employee_project_hours(
        &self,
        actor: &Actor,
        from: NaiveDate,
        to: NaiveDate,
        project_id: Option<Uuid>,
    ) -> Result<Vec<EmployeeProjectHours>> {
        actor.require_manager()?;
        let rows = sqlx::query_as::<_, EmployeeProjectMinutesRow>(
            r#"
            SELECT s.user_id, u.username, p.name AS project_name, s.billable, s.duration_minutes
            FROM work_sessions s
            JOIN users u ON u.id = s.user_id
            LEFT JOIN projects p ON p.id = s.project_id
            WHERE s.stopped_at IS NOT NULL
              AND u.role = $1
              AND s.work_date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR s.project_id = $4)
            "#,
        )
        .bind(Role::Employee.as_str())
        .bind(from)
        .bind(to)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(aggregate_employee_projects(&rows))
    }

    pub async fn user_detail(&self, actor: &Actor, user_id: Uuid) -> Result<UserDetailResponse> {
        actor.require_manager()?;
        let user = self.users.get(user_id).await?;
        let today = self.clock.now().date_naive();
        let since = today - Duration::days(USER_DETAIL_DAYS);
        let rows = self.project_minutes(Some(user_id), since, today).await?;
        let mut sessions = self.timer.list_in_range(user_id, since, today, None).await?;
        sessions.reverse();

        Ok(UserDetailResponse {
            projects: project_totals(rows.iter().map(|r| {
                (
                    r.project_name.as_deref().unwrap_or(UNASSIGNED),
                    r.duration_minutes,
                )
            })),
            sessions,
            reports: self.reports.list_for_user(user_id).await?,
            user: UserResponse::from(user),
        })
    }

    async fn session_minutes(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SessionMinutesRow>> {
        let rows = sqlx::query_as::<_, SessionMinutesRow>(
            r#"
            SELECT s.user_id, u.username, s.started_at, s.duration_minutes
            FROM work_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.stopped_at IS NOT NULL
              AND s.work_date BETWEEN $1 AND $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn project_minutes(
        &self,
        user_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ProjectMinutesRow>> {
        let rows = sqlx::query_as::<_, ProjectMinutesRow>(
            r#"
            SELECT p.name AS project_name, s.billable, s.duration_minutes
            FROM work_sessions s
            LEFT JOIN projects p ON p.id = s.project_id
            WHERE s.stopped_at IS NOT NULL
              AND s.work_date BETWEEN $1 AND $2
              AND ($3::uuid IS NULL OR s.user_id = $3)
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Sums session minutes per user per ISO week, ordered by username then week.
pub fn aggregate_user_weeks(rows: &[SessionMinutesRow]) -> Vec<UserPeriodHours> {
    let mut buckets: BTreeMap<(&str, Uuid, NaiveDate), i64> = BTreeMap::new();
    for row in rows {
        let (monday, _) = week_bounds(row.started_at.date_naive());
        *buckets
            .entry((row.username.as_str(), row.user_id, monday))
            .or_default() += row.duration_minutes as i64;
    }

    buckets
        .into_iter()
        .map(|((username, user_id, monday), minutes)| UserPeriodHours {
            user_id,
            username: username.to_string(),
            period_start: monday,
            period: iso_week_label(monday),
            hours: minutes_to_hours(minutes),
        })
        .collect()
}

/// Hours per project label, alphabetical.
pub fn project_totals<'a, I>(items: I) -> Vec<ProjectTotal>
where
    I: IntoIterator<Item = (&'a str, i32)>,
{
    let mut buckets: BTreeMap<&str, i64> = BTreeMap::new();
    for (name, minutes) in items {
        *buckets.entry(name).or_default() += minutes as i64;
    }
    buckets
        .into_iter()
        .map(|(name, minutes)| ProjectTotal {
            name: name.to_string(),
            hours: minutes_to_hours(minutes),
        })
        .collect()
}

pub fn totals_by_day(entries: &[TimesheetEntry]) -> Vec<DailyHours> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for entry in entries {
        *buckets.entry(entry.work_date).or_default() += entry.duration_minutes as i64;
    }
    buckets
        .into_iter()
        .map(|(date, minutes)| DailyHours {
            date,
            hours: minutes_to_hours(minutes),
        })
        .collect()
}

fn percent_billable(total_minutes: i64, billable_minutes: i64) -> f64 {
    if total_minutes > 0 {
        round2(billable_minutes as f64 / total_minutes as f64 * 100.0)
    } else {
        0.0
    }
}

/// Ordered by employee, then project.
pub fn aggregate_employee_projects(rows: &[EmployeeProjectMinutesRow]) -> Vec<EmployeeProjectHours> {
    let mut buckets: BTreeMap<(&str, Uuid, &str), (i64, i64)> = BTreeMap::new();
    for row in rows {
        let project = row.project_name.as_deref().unwrap_or(UNASSIGNED);
        let (total, billable) = buckets
            .entry((row.username.as_str(), row.user_id, project))
            .or_default();
        *total += row.duration_minutes as i64;
        if row.billable {
            *billable += row.duration_minutes as i64;
        }
    }

    buckets
        .into_iter()
        .map(|((employee, user_id, project), (total, billable))| EmployeeProjectHours {
            user_id,
            employee: employee.to_string(),
            project: project.to_string(),
            hours: minutes_to_hours(total),
            billable_hours: minutes_to_hours(billable),
            percent_billable: percent_billable(total, billable),
        })
        .collect()
}

/// Largest projects first; ties by name.
pub fn aggregate_projects(rows: &[ProjectMinutesRow]) -> Vec<ProjectHours> {
    let mut buckets: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for row in rows {
        let name = row.project_name.as_deref().unwrap_or(UNASSIGNED);
        let (total, billable) = buckets.entry(name).or_default();
        *total += row.duration_minutes as i64;
        if row.billable {
            *billable += row.duration_minutes as i64;
        }
    }

    let mut out: Vec<(i64, ProjectHours)> = buckets
        .into_iter()
        .map(|(name, (total, billable))| {
            (
                total,
                ProjectHours {
                    project: name.to_string(),
                    hours: minutes_to_hours(total),
                    billable_hours: minutes_to_hours(billable),
                    percent_billable: percent_billable(total, billable),
                },
            )
        })
        .collect();
    out.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.project.cmp(&b.1.project)));
    out.into_iter().map(|(_, hours)| hours).collect()
}

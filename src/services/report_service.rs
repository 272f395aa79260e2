use crate::dto::report_dto::SubmitReportPayload;
use crate::error::{Error, Result};
use crate::models::audit_log::AuditLog;
use crate::models::report::{Report, ReportStatus};
use crate::models::user::Actor;
use crate::services::audit_service::{AuditEntry, AuditService};
use crate::utils::time::{iso_week_label, minutes_to_hours, week_bounds, SharedClock};
use crate::utils::validation::{non_negative_hours, require_text};
use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

pub const REPORT_ENTITY: &str = "report";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Hours {
    Given(f64),
    /// Summed from the finished sessions of the week starting on this Monday.
    FromWeek(NaiveDate),
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedSubmission {
    period: String,
    week_start: Option<NaiveDate>,
    content: String,
    hours: Hours,
}

fn resolve_submission(payload: &SubmitReportPayload) -> Result<ResolvedSubmission> {
    let content = require_text("content", &payload.content)?;
    let week_start = payload.week_start.map(|day| week_bounds(day).0);

    let period = match (payload.period.trim(), week_start) {
        ("", Some(monday)) => iso_week_label(monday),
        (period, _) => require_text("period", period)?,
    };

    let hours = match (payload.duration_hours, week_start) {
        (Some(hours), _) => Hours::Given(non_negative_hours(hours)?),
        (None, Some(monday)) => Hours::FromWeek(monday),
        (None, None) => {
            return Err(Error::BadRequest(
                "Either duration_hours or week_start is required".to_string(),
            ))
        }
    };

    Ok(ResolvedSubmission {
        period,
        week_start,
        content,
        hours,
    })
}

#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
    clock: SharedClock,
    audit: AuditService,
}

impl ReportService {
    pub fn new(pool: PgPool, clock: SharedClock) -> Self {
        let audit = AuditService::new(pool.clone());
        Self { pool, clock, audit }
    }

    pub async fn submit(&self, actor: &Actor, payload: SubmitReportPayload) -> Result<Report> {
        let resolved = resolve_submission(&payload)?;
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let duration_hours = match resolved.hours {
            Hours::Given(hours) => hours,
            Hours::FromWeek(monday) => {
                let (_, sunday) = week_bounds(monday);
                let minutes: i64 = sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(SUM(duration_minutes), 0)::BIGINT FROM work_sessions
                    WHERE user_id = $1
                      AND stopped_at IS NOT NULL
                      AND work_date BETWEEN $2 AND $3
                    "#,
                )
                .bind(actor.id)
                .bind(monday)
                .bind(sunday)
                .fetch_one(&mut *tx)
                .await?;
                minutes_to_hours(minutes)
            }
        };

        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (
                user_id, period, week_start, content, duration_hours, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(actor.id)
        .bind(&resolved.period)
        .bind(resolved.week_start)
        .bind(&resolved.content)
        .bind(duration_hours)
        .bind(ReportStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        AuditService::record(
            &mut *tx,
            AuditEntry {
                user_id: Some(actor.id),
                action: "report.submitted",
                entity_type: REPORT_ENTITY,
                entity_id: report.id,
                changes: Some(json!({
                    "period": report.period,
                    "duration_hours": report.duration_hours,
                })),
                at: now,
            },
        )
        .await?;

        tx.commit().await?;
        tracing::info!(
            user_id = %actor.id,
            report_id = %report.id,
            period = %report.period,
            hours = report.duration_hours,
            "report submitted"
        );
        Ok(report)
    }

    /// Most recent first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Report> {
        let report = sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Report not found".to_string()))?;

        if !actor.can_view(report.user_id) {
            return Err(Error::Forbidden(
                "You may only view your own reports".to_string(),
            ));
        }
        Ok(report)
    }

    /// Whether the caller has an approved report for the week starting `monday`.
    pub async fn is_week_approved(&self, user_id: Uuid, monday: NaiveDate) -> Result<bool> {
        let approved: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reports
                WHERE user_id = $1 AND week_start = $2 AND status = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(monday)
        .bind(ReportStatus::Approved.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(approved)
    }

    /// Audit trail of a report, visible to whoever may view the report itself.
    pub async fn history(&self, actor: &Actor, id: Uuid) -> Result<Vec<AuditLog>> {
        self.get(actor, id).await?;
        self.audit.history(REPORT_ENTITY, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payload(period: &str, content: &str) -> SubmitReportPayload {
        SubmitReportPayload {
            period: period.to_string(),
            content: content.to_string(),
            duration_hours: Some(8.0),
            week_start: None,
        }
    }

    #[test]
    fn explicit_period_and_hours_are_kept() {
        let resolved = resolve_submission(&payload(" 2024-W1 ", "Closed sprint tickets")).unwrap();
        assert_eq!(resolved.period, "2024-W1");
        assert_eq!(resolved.content, "Closed sprint tickets");
        assert_eq!(resolved.hours, Hours::Given(8.0));
        assert_eq!(resolved.week_start, None);
    }

    #[test]
    fn week_start_snaps_to_monday_and_labels_the_period() {
        let mut p = payload("", "weekly summary");
        p.duration_hours = None;
        p.week_start = Some(date(2024, 3, 14));

        let resolved = resolve_submission(&p).unwrap();
        assert_eq!(resolved.week_start, Some(date(2024, 3, 11)));
        assert_eq!(resolved.period, "2024-W11");
        assert_eq!(resolved.hours, Hours::FromWeek(date(2024, 3, 11)));
    }

    #[test]
    fn blank_content_or_period_is_a_validation_error() {
        assert!(matches!(
            resolve_submission(&payload("2024-W1", "   ")),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            resolve_submission(&payload("", "content")),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn negative_hours_are_refused() {
        let mut p = payload("2024-W1", "content");
        p.duration_hours = Some(-1.0);
        assert!(resolve_submission(&p).is_err());
    }

    #[test]
    fn hours_or_week_must_be_given() {
        let mut p = payload("2024-W1", "content");
        p.duration_hours = None;
        assert!(matches!(resolve_submission(&p), Err(Error::BadRequest(_))));
    }
}

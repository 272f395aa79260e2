use crate::dto::report_dto::DecisionPayload;
use crate::error::{Error, Result};
use crate::models::report::{Report, ReportStatus, ReportWithSubmitter};
use crate::models::user::Actor;
use crate::services::audit_service::{AuditEntry, AuditService};
use crate::services::report_service::REPORT_ENTITY;
use crate::utils::time::SharedClock;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

pub const REVIEWED_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct ApprovalService {
    pool: PgPool,
    clock: SharedClock,
}

impl ApprovalService {
    pub fn new(pool: PgPool, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Moves a pending report to approved or rejected. The row is locked for
    /// the duration so two managers deciding at once see a single winner.
    pub async fn decide(
        &self,
        actor: &Actor,
        report_id: Uuid,
        payload: DecisionPayload,
    ) -> Result<Report> {
        actor.require_manager()?;
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1 FOR UPDATE")
            .bind(report_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound("Report not found".to_string()))?;

        let next = current.status.transition(payload.decision)?;
        let comment = payload
            .manager_comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let report = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET status = $2, reviewer_id = $3, reviewed_at = $4, manager_comment = $5, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(report_id)
        .bind(next.as_str())
        .bind(actor.id)
        .bind(now)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        AuditService::record(
            &mut *tx,
            AuditEntry {
                user_id: Some(actor.id),
                action: "report.decided",
                entity_type: REPORT_ENTITY,
                entity_id: report.id,
                changes: Some(json!({
                    "from": current.status,
                    "to": report.status,
                    "manager_comment": report.manager_comment,
                })),
                at: now,
            },
        )
        .await?;

        tx.commit().await?;
        tracing::info!(
            report_id = %report.id,
            reviewer_id = %actor.id,
            status = %report.status,
            "report decided"
        );
        Ok(report)
    }

    /// Review queue, oldest submission first.
    pub async fn list_pending(&self) -> Result<Vec<ReportWithSubmitter>> {
        let reports = sqlx::query_as::<_, ReportWithSubmitter>(
            r#"
            SELECT r.*, u.username AS submitter
            FROM reports r
            JOIN users u ON u.id = r.user_id
            WHERE r.status = $1
            ORDER BY r.created_at ASC, r.id ASC
            "#,
        )
        .bind(ReportStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    pub async fn list_reviewed(
        &self,
        actor: &Actor,
        status: ReportStatus,
        limit: Option<i64>,
    ) -> Result<Vec<ReportWithSubmitter>> {
        actor.require_manager()?;
        if !status.is_terminal() {
            return Err(Error::BadRequest(
                "status must be approved or rejected".to_string(),
            ));
        }
        let limit = limit.unwrap_or(REVIEWED_LIMIT).clamp(1, REVIEWED_LIMIT);

        let reports = sqlx::query_as::<_, ReportWithSubmitter>(
            r#"
            SELECT r.*, u.username AS submitter
            FROM reports r
            JOIN users u ON u.id = r.user_id
            WHERE r.status = $1
            ORDER BY r.reviewed_at DESC NULLS LAST, r.id DESC
            LIMIT $2
            "#,
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    pub async fn count_approved_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE status = $1 AND reviewed_at >= $2",
        )
        .bind(ReportStatus::Approved.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

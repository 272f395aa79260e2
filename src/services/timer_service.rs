use crate::dto::session_dto::{CreateEntryPayload, StartTimerPayload, UpdateEntryPayload};
use crate::error::{Error, Result};
use crate::models::user::Actor;
use crate::models::work_session::{clamp_stop, net_minutes, timer_minutes, WorkSession};
use crate::services::project_service::active_project_billable;
use crate::utils::time::{minutes_to_hours, SharedClock};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

#[derive(Clone)]
pub struct TimerService {
    pool: PgPool,
    clock: SharedClock,
}

impl TimerService {
    pub fn new(pool: PgPool, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Opens a session at the current time. The partial unique index on
    /// running sessions turns a concurrent second start into a Conflict.
    ///
    /// The new session runs from `now` until an unknown stop, so any finished
    /// entry ending after `now` would end up overlapping it.
    pub async fn start(&self, actor: &Actor, payload: StartTimerPayload) -> Result<WorkSession> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;
        lock_user_timeline(&mut tx, actor.id).await?;

        let blocked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM work_sessions
                WHERE user_id = $1
                  AND stopped_at IS NOT NULL
                  AND stopped_at > $2
            )
            "#,
        )
        .bind(actor.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        if blocked {
            return Err(Error::Conflict(
                "Cannot start timer: an existing entry already covers this time".to_string(),
            ));
        }

        let billable = match payload.project_id {
            Some(project_id) => active_project_billable(&mut *tx, project_id).await?,
            None => true,
        };

        let session = sqlx::query_as::<_, WorkSession>(
            r#"
            INSERT INTO work_sessions (
                user_id, project_id, work_date, started_at, billable, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $4, $4)
            RETURNING *
            "#,
        )
        .bind(actor.id)
        .bind(payload.project_id)
        .bind(now.date_naive())
        .bind(now)
        .bind(billable)
        .bind(payload.notes.as_deref().map(str::trim).unwrap_or_default())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(user_id = %actor.id, session_id = %session.id, "timer started");
        Ok(session)
    }

    pub async fn stop(&self, actor: &Actor) -> Result<WorkSession> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let running = sqlx::query_as::<_, WorkSession>(
            r#"
            SELECT * FROM work_sessions
            WHERE user_id = $1 AND stopped_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(actor.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("No running timer".to_string()))?;

        let stopped_at = clamp_stop(running.started_at, now);
        if stopped_at != now {
            tracing::warn!(
                session_id = %running.id,
                started_at = %running.started_at,
                now = %now,
                "clock is behind session start; recording zero-length session"
            );
        }

        let session = sqlx::query_as::<_, WorkSession>(
            r#"
            UPDATE work_sessions
            SET stopped_at = $2, duration_minutes = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(running.id)
        .bind(stopped_at)
        .bind(timer_minutes(running.started_at, stopped_at))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            user_id = %actor.id,
            session_id = %session.id,
            hours = minutes_to_hours(session.duration_minutes as i64),
            "timer stopped"
        );
        Ok(session)
    }

    pub async fn running(&self, user_id: Uuid) -> Result<Option<WorkSession>> {
        let session = sqlx::query_as::<_, WorkSession>(
            "SELECT * FROM work_sessions WHERE user_id = $1 AND stopped_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Result<WorkSession> {
        sqlx::query_as::<_, WorkSession>("SELECT * FROM work_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Work session not found".to_string()))
    }

    /// Full history, most recent first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<WorkSession>> {
        let sessions = sqlx::query_as::<_, WorkSession>(
            r#"
            SELECT * FROM work_sessions
            WHERE user_id = $1
            ORDER BY work_date DESC, started_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Sessions started within `[from, to]` (inclusive dates), oldest first.
    pub async fn list_in_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        project_id: Option<Uuid>,
    ) -> Result<Vec<WorkSession>> {
        let sessions = sqlx::query_as::<_, WorkSession>(
            r#"
            SELECT * FROM work_sessions
            WHERE user_id = $1
              AND work_date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR project_id = $4)
            ORDER BY work_date ASC, started_at ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Whole minutes of finished sessions that started within `[from, to]`.
    pub async fn total_minutes(&self, user_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<i64> {
        let minutes: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(duration_minutes), 0)::BIGINT FROM work_sessions
            WHERE user_id = $1
              AND stopped_at IS NOT NULL
              AND work_date BETWEEN $2 AND $3
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(minutes)
    }

    pub async fn total_hours(&self, user_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<f64> {
        Ok(minutes_to_hours(self.total_minutes(user_id, from, to).await?))
    }

    pub async fn create_entry(&self, actor: &Actor, payload: CreateEntryPayload) -> Result<WorkSession> {
        let minutes = net_minutes(payload.started_at, payload.stopped_at, payload.break_minutes)?;
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;
        lock_user_timeline(&mut tx, actor.id).await?;

        ensure_no_overlap(&mut tx, actor.id, None, payload.started_at, payload.stopped_at).await?;
        let billable = resolve_billable(&mut tx, payload.project_id, payload.billable).await?;

        let session = sqlx::query_as::<_, WorkSession>(
            r#"
            INSERT INTO work_sessions (
                user_id, project_id, work_date, started_at, stopped_at,
                break_minutes, duration_minutes, billable, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(actor.id)
        .bind(payload.project_id)
        .bind(payload.started_at.date_naive())
        .bind(payload.started_at)
        .bind(payload.stopped_at)
        .bind(payload.break_minutes)
        .bind(minutes)
        .bind(billable)
        .bind(payload.notes.as_deref().map(str::trim).unwrap_or_default())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(user_id = %actor.id, session_id = %session.id, "manual entry created");
        Ok(session)
    }

    pub async fn update_entry(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateEntryPayload,
    ) -> Result<WorkSession> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;
        lock_user_timeline(&mut tx, actor.id).await?;

        let current = sqlx::query_as::<_, WorkSession>(
            "SELECT * FROM work_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Work session not found".to_string()))?;

        if current.user_id != actor.id {
            return Err(Error::Forbidden(
                "Only the owner may edit a time entry".to_string(),
            ));
        }
        let Some(current_stop) = current.stopped_at else {
            return Err(Error::InvalidState(
                "Running timers cannot be edited; stop the timer first".to_string(),
            ));
        };

        let started_at = payload.started_at.unwrap_or(current.started_at);
        let stopped_at = payload.stopped_at.unwrap_or(current_stop);
        let break_minutes = payload.break_minutes.unwrap_or(current.break_minutes);
        let minutes = net_minutes(started_at, stopped_at, break_minutes)?;

        ensure_no_overlap(&mut tx, actor.id, Some(id), started_at, stopped_at).await?;

        let project_id = payload.project_id.or(current.project_id);
        let billable = match (payload.billable, payload.project_id) {
            (Some(billable), _) => billable,
            (None, Some(_)) => resolve_billable(&mut tx, project_id, None).await?,
            (None, None) => current.billable,
        };

        let session = sqlx::query_as::<_, WorkSession>(
            r#"
            UPDATE work_sessions
            SET project_id = $2, work_date = $3, started_at = $4, stopped_at = $5,
                break_minutes = $6, duration_minutes = $7, billable = $8,
                notes = COALESCE($9, notes), updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(project_id)
        .bind(started_at.date_naive())
        .bind(started_at)
        .bind(stopped_at)
        .bind(break_minutes)
        .bind(minutes)
        .bind(billable)
        .bind(payload.notes.as_deref().map(str::trim))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(session)
    }

    pub async fn delete_entry(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let session = self.get(id).await?;
        if !actor.can_view(session.user_id) {
            return Err(Error::Forbidden(
                "Only the owner or a manager may delete a time entry".to_string(),
            ));
        }
        sqlx::query("DELETE FROM work_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::info!(actor_id = %actor.id, session_id = %id, "time entry deleted");
        Ok(())
    }
}

/// Serializes timeline changes for one user until the transaction ends, so two
/// concurrent writers cannot both pass the overlap checks.
async fn lock_user_timeline(conn: &mut PgConnection, user_id: Uuid) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Finished sessions on the same day plus the running timer, whatever day it began.
async fn ensure_no_overlap(
    conn: &mut PgConnection,
    user_id: Uuid,
    exclude: Option<Uuid>,
    started_at: DateTime<Utc>,
    stopped_at: DateTime<Utc>,
) -> Result<()> {
    let candidates = sqlx::query_as::<_, WorkSession>(
        r#"
        SELECT * FROM work_sessions
        WHERE user_id = $1
          AND (stopped_at IS NULL OR work_date = $2)
          AND ($3::uuid IS NULL OR id <> $3)
        "#,
    )
    .bind(user_id)
    .bind(started_at.date_naive())
    .bind(exclude)
    .fetch_all(&mut *conn)
    .await?;

    if candidates.iter().any(|s| s.overlaps(started_at, stopped_at)) {
        return Err(Error::BadRequest(
            "Overlapping entry for this day exists.".to_string(),
        ));
    }
    Ok(())
}

async fn resolve_billable(
    conn: &mut PgConnection,
    project_id: Option<Uuid>,
    explicit: Option<bool>,
) -> Result<bool> {
    let default = match project_id {
        Some(id) => active_project_billable(&mut *conn, id).await?,
        None => true,
    };
    Ok(explicit.unwrap_or(default))
}

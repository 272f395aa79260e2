use crate::dto::project_dto::{CreateProjectPayload, UpdateProjectPayload};
use crate::error::{Error, Result};
use crate::models::project::Project;
use crate::models::user::Actor;
use crate::utils::time::SharedClock;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProjectService {
    pool: PgPool,
    clock: SharedClock,
}

impl ProjectService {
    pub fn new(pool: PgPool, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Inactive projects are only listed for managers that ask for them.
    pub async fn list(&self, actor: &Actor, include_inactive: bool) -> Result<Vec<Project>> {
        let include_inactive = include_inactive && actor.role.is_manager();
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE active OR $1
            ORDER BY name ASC
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    pub async fn get(&self, id: Uuid) -> Result<Project> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Project not found".to_string()))
    }

    pub async fn create(&self, actor: &Actor, payload: CreateProjectPayload) -> Result<Project> {
        actor.require_manager()?;
        let now = self.clock.now();
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, client, billable_default, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(payload.client.trim())
        .bind(payload.billable_default.unwrap_or(true))
        .bind(payload.active.unwrap_or(true))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(project_id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateProjectPayload,
    ) -> Result<Project> {
        actor.require_manager()?;
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET
                name = COALESCE($2, name),
                client = COALESCE($3, client),
                billable_default = COALESCE($4, billable_default),
                active = COALESCE($5, active),
                updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(payload.client.as_deref().map(str::trim))
        .bind(payload.billable_default)
        .bind(payload.active)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Project not found".to_string()))
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        actor.require_manager()?;
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM work_sessions WHERE project_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if in_use {
            return Err(Error::Conflict(
                "Cannot delete project linked to timesheet entries".to_string(),
            ));
        }

        // The FK still restricts a delete racing a new entry; that surfaces as Conflict too.
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Project not found".to_string()));
        }
        tracing::info!(project_id = %id, "project deleted");
        Ok(())
    }
}

/// Billable default of an active project, used when an entry names one.
pub async fn active_project_billable<'e, E>(executor: E, id: Uuid) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>(
        "SELECT billable_default FROM projects WHERE id = $1 AND active",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| Error::NotFound("Project not found or inactive".to_string()))
}

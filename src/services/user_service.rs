use crate::dto::auth_dto::RegisterPayload;
use crate::error::{Error, Result};
use crate::models::user::{Actor, Role, User};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::time::SharedClock;
use sqlx::PgPool;
use std::path::Path;
use uuid::Uuid;

pub const AVATAR_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    clock: SharedClock,
}

impl UserService {
    pub fn new(pool: PgPool, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        let username = payload.username.trim().to_string();
        if username.len() < 3 {
            return Err(Error::BadRequest(
                "Username must be at least 3 characters".to_string(),
            ));
        }
        let password_hash = hash_password(&payload.password)?;
        let now = self.clock.now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(&username)
        .bind(payload.email.trim())
        .bind(&password_hash)
        .bind(payload.role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        match user {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            _ => {
                tracing::warn!(username = %username, "failed login");
                Err(Error::Unauthorized(
                    "Invalid username or password".to_string(),
                ))
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn list(&self, actor: &Actor, role: Option<Role>) -> Result<Vec<User>> {
        actor.require_manager()?;
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR role = $1)
            ORDER BY username ASC
            "#,
        )
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn set_avatar(&self, actor: &Actor, relative_path: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET avatar_path = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(actor.id)
        .bind(relative_path)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    /// Sessions and submitted reports go with the account; reviews keep their status.
    pub async fn delete(&self, actor: &Actor) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(actor.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }
        tracing::info!(user_id = %actor.id, "account deleted");
        Ok(())
    }
}

/// `avatars/<username>/<stem>.<ext>` with anything outside `[A-Za-z0-9_-]` replaced.
pub fn avatar_relative_path(username: &str, original_filename: &str) -> Result<String> {
    let path = Path::new(original_filename);
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    if !AVATAR_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::BadRequest(format!(
            "File type not allowed. Allowed: {}",
            AVATAR_EXTENSIONS.join(", ")
        )));
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_segment)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "avatar".to_string());

    Ok(format!(
        "avatars/{}/{}.{}",
        sanitize_segment(username),
        stem,
        extension
    ))
}

fn sanitize_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_path_is_scoped_by_username() {
        assert_eq!(
            avatar_relative_path("alice", "Me at work.PNG").unwrap(),
            "avatars/alice/Me_at_work.png"
        );
    }

    #[test]
    fn avatar_path_cannot_escape_the_media_dir() {
        let path = avatar_relative_path("../bob", "../../etc/passwd.jpg").unwrap();
        assert_eq!(path, "avatars/___bob/passwd.jpg");
    }

    #[test]
    fn non_image_uploads_are_refused() {
        assert!(matches!(
            avatar_relative_path("alice", "resume.pdf"),
            Err(Error::BadRequest(_))
        ));
        assert!(avatar_relative_path("alice", "noext").is_err());
    }
}

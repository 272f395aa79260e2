use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{Actor, Role, User};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Role,
}

impl Claims {
    pub fn actor(&self) -> Option<Actor> {
        let id = Uuid::parse_str(&self.sub).ok()?;
        Some(Actor::new(id, self.role))
    }
}

pub fn issue_token(secret: &str, user: &User, ttl_hours: i64, now: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
        sub: user.id.to_string(),
        exp: (now + Duration::hours(ttl_hours)).timestamp().max(0) as usize,
        role: user.role,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

/// Checks the signature, then `exp` against `now`: tokens are stamped with the
/// service clock, so they must be verified with it too.
pub fn decode_token(secret: &str, token: &str, now: DateTime<Utc>) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;

    if (claims.exp as i64) <= now.timestamp() {
        return Err(Error::Unauthorized("token_expired".to_string()));
    }
    Ok(claims)
}

fn bearer_token(headers: &HeaderMap) -> std::result::Result<&str, &'static str> {
    let auth_header = headers.get(AUTHORIZATION).ok_or("missing_authorization")?;
    let auth_str = auth_header.to_str().map_err(|_| "bad_authorization")?;
    auth_str.strip_prefix("Bearer ").ok_or("unsupported_scheme")
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
}

/// Verifies the bearer JWT and stores the caller as an `Actor` extension.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(req.headers()) {
        Ok(token) => token,
        Err(reason) => return unauthorized(reason),
    };

    let claims = match decode_token(&state.config.jwt_secret, token, state.clock.now()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), error = %e, "rejected bearer token");
            let reason = match e {
                Error::Unauthorized(reason) => reason,
                _ => "invalid_token".to_string(),
            };
            return unauthorized(&reason);
        }
    };
    let Some(actor) = claims.actor() else {
        tracing::warn!(path = %req.uri().path(), "bearer token has a malformed subject");
        return unauthorized("invalid_token");
    };

    req.extensions_mut().insert(actor);
    next.run(req).await
}

/// Must run inside `require_auth`.
pub async fn require_manager(req: Request, next: Next) -> Response {
    match req.extensions().get::<Actor>() {
        Some(actor) if actor.role.is_manager() => next.run(req).await,
        Some(_) => (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" }))).into_response(),
        None => unauthorized("missing_authorization"),
    }
}

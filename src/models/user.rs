use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    postgres::{PgTypeInfo, PgValueRef},
    FromRow, Postgres,
};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "manager" => Ok(Role::Manager),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for Role {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for Role {
    fn decode(value: PgValueRef<'r>) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<Postgres>>::decode(value)?;
        s.parse::<Role>().map_err(|e| e.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub avatar_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authenticated caller, passed explicitly into every service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn require_manager(&self) -> Result<()> {
        if self.role.is_manager() {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "Only managers may perform this action".to_string(),
            ))
        }
    }

    /// Owners always pass; managers pass for anyone's records.
    pub fn can_view(&self, owner_id: Uuid) -> bool {
        self.id == owner_id || self.role.is_manager()
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor::new(user.id, user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("Employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Manager.to_string(), "manager");
    }

    #[test]
    fn only_managers_pass_the_manager_gate() {
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);
        let employee = Actor::new(Uuid::new_v4(), Role::Employee);
        assert!(manager.require_manager().is_ok());
        assert!(matches!(
            employee.require_manager(),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn visibility_is_owner_or_manager() {
        let owner = Actor::new(Uuid::new_v4(), Role::Employee);
        let other = Actor::new(Uuid::new_v4(), Role::Employee);
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);
        assert!(owner.can_view(owner.id));
        assert!(!other.can_view(owner.id));
        assert!(manager.can_view(owner.id));
    }
}

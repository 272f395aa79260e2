use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    postgres::{PgTypeInfo, PgValueRef},
    FromRow, Postgres,
};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Review lifecycle: `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
}

/// What a manager may set a pending report to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }

    pub fn transition(self, decision: Decision) -> Result<ReportStatus> {
        match self {
            ReportStatus::Pending => Ok(decision.into()),
            terminal => Err(Error::InvalidState(format!(
                "Report has already been {} and cannot be changed",
                terminal
            ))),
        }
    }
}

impl From<Decision> for ReportStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => ReportStatus::Approved,
            Decision::Rejected => ReportStatus::Rejected,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "approved" => Ok(ReportStatus::Approved),
            "rejected" => Ok(ReportStatus::Rejected),
            _ => Err(format!("Invalid report status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for ReportStatus {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for ReportStatus {
    fn decode(value: PgValueRef<'r>) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<Postgres>>::decode(value)?;
        s.parse::<ReportStatus>().map_err(|e| e.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub period: String,
    pub week_start: Option<NaiveDate>,
    pub content: String,
    pub duration_hours: f64,
    pub status: ReportStatus,
    pub reviewer_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub manager_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A report joined with its submitter's username, for review queues.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReportWithSubmitter {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: Report,
    pub submitter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_either_decision() {
        assert_eq!(
            ReportStatus::Pending.transition(Decision::Approved).unwrap(),
            ReportStatus::Approved
        );
        assert_eq!(
            ReportStatus::Pending.transition(Decision::Rejected).unwrap(),
            ReportStatus::Rejected
        );
    }

    #[test]
    fn terminal_states_refuse_every_decision() {
        for terminal in [ReportStatus::Approved, ReportStatus::Rejected] {
            assert!(terminal.is_terminal());
            for decision in [Decision::Approved, Decision::Rejected] {
                let err = terminal.transition(decision).unwrap_err();
                assert!(matches!(err, Error::InvalidState(_)));
            }
        }
        assert!(!ReportStatus::Pending.is_terminal());
    }

    #[test]
    fn decisions_deserialize_from_lowercase_and_refuse_pending() {
        let d: Decision = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(d, Decision::Approved);
        assert!(serde_json::from_str::<Decision>("\"pending\"").is_err());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Rejected".parse::<ReportStatus>().unwrap(), ReportStatus::Rejected);
        assert!("draft".parse::<ReportStatus>().is_err());
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::report::{Decision, ReportStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SubmitReportPayload {
    #[serde(default)]
    #[validate(length(max = 64))]
    pub period: String,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
    #[validate(range(min = 0.0))]
    pub duration_hours: Option<f64>,
    pub week_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DecisionPayload {
    pub decision: Decision,
    #[validate(length(max = 2000))]
    pub manager_comment: Option<String>,
}

impl DecisionPayload {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            manager_comment: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewedQuery {
    pub status: ReportStatus,
    pub limit: Option<i64>,
}

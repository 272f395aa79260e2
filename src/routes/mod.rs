pub mod analytics;
pub mod approvals;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod projects;
pub mod reports;
pub mod sessions;
pub mod timer;
pub mod timesheet;
pub mod users;

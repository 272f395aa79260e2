pub mod audit_log;
pub mod project;
pub mod report;
pub mod user;
pub mod work_session;

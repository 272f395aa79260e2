pub mod approval_service;
pub mod audit_service;
pub mod dashboard_service;
pub mod export_service;
pub mod project_service;
pub mod report_service;
pub mod timer_service;
pub mod user_service;

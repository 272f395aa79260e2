pub mod auth_dto;
pub mod dashboard_dto;
pub mod project_dto;
pub mod report_dto;
pub mod session_dto;

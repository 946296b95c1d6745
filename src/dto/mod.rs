pub mod application_dto;
pub mod auth_dto;
pub mod job_dto;
pub mod pagination;
pub mod payment_dto;
pub mod user_dto;

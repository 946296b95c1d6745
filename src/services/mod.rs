pub mod application_service;
pub mod auth_service;
pub mod job_service;
pub mod notification_service;
pub mod payment_service;
pub mod policy;
pub mod user_service;
pub mod wallet_service;

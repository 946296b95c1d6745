pub mod application;
pub mod entity_ref;
pub mod job;
pub mod notification;
pub mod payment;
pub mod user;
pub mod wallet;

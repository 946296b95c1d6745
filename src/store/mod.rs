//! Persistence ports.
//!
//! Every method returns owned snapshots. Methods that touch more than one
//! entity are a single unit of work in every implementation: either all of
//! their writes become visible or none do.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    application::{Application, ApplicationStatus, NewApplication},
    job::{Job, JobChanges, JobLevel, JobStatus, JobType, NewJob},
    notification::{NewNotification, Notification},
    payment::{JobPaymentSettlement, Payment},
    user::{Certification, NewUser, Profile, User},
    wallet::{Wallet, WalletTransaction},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;
    /// Highest page whose offset still fits in an `i64` at any limit.
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_LIMIT;

    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, Self::MAX_PAGE),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: Page,
}

impl<T> Paged<T> {
    pub fn pages(&self) -> i64 {
        (self.total + self.page.limit - 1) / self.page.limit
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobSort {
    #[default]
    Latest,
    Oldest,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub creator_id: Option<Uuid>,
    /// Case-insensitive substring match.
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub level: Option<JobLevel>,
    pub urgent_only: bool,
    pub sort: JobSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationFilter {
    ByJob(Uuid),
    ByApplicant(Uuid),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates the user and an empty wallet bound to the same address.
    async fn create_user_with_wallet(&self, user: NewUser) -> Result<(User, Wallet)>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_profile(&self, id: Uuid, profile: Profile) -> Result<User>;
    async fn add_certification(&self, id: Uuid, cert: Certification) -> Result<Vec<Certification>>;
    async fn remove_certification(&self, id: Uuid, cert_id: Uuid) -> Result<Vec<Certification>>;
    /// Returns `false` when the job was already saved.
    async fn save_job(&self, user_id: Uuid, job_id: Uuid) -> Result<bool>;
    async fn unsave_job(&self, user_id: Uuid, job_id: Uuid) -> Result<()>;
    async fn saved_jobs(&self, user_id: Uuid, page: Page) -> Result<Paged<Job>>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: NewJob) -> Result<Job>;
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>>;
    /// Applies the edit only while the job is still a draft; `None` otherwise.
    async fn update_draft_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<Job>>;
    async fn delete_job(&self, id: Uuid) -> Result<bool>;
    /// Moves a paid draft to published; `None` when the job is unpaid or closed.
    async fn publish_job(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Job>>;
    async fn list_jobs(&self, filter: JobFilter, page: Page) -> Result<Paged<Job>>;
    /// Full-text search over published jobs, best match first.
    async fn search_jobs(&self, query: &str, page: Page) -> Result<Paged<Job>>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn has_applied(&self, job_id: Uuid, applicant_id: Uuid) -> Result<bool>;
    /// Inserts the application and bumps the job's applicant count together.
    /// A second application for the same (job, applicant) pair is a
    /// `DuplicateApplication` denial.
    async fn submit_application(&self, application: NewApplication) -> Result<(Application, Job)>;
    async fn find_application(&self, id: Uuid) -> Result<Option<Application>>;
    async fn list_applications(
        &self,
        filter: ApplicationFilter,
        page: Page,
    ) -> Result<Paged<Application>>;
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Records a completed payment, marks the job paid and debits the payer's
    /// wallet in one unit of work. The job must still be unpaid at commit time,
    /// otherwise nothing is written and `AlreadyPaid` is returned.
    async fn settle_job_payment(&self, settlement: JobPaymentSettlement) -> Result<(Payment, Job)>;
    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn list_payments(&self, payer_id: Uuid, page: Page) -> Result<Paged<Payment>>;
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn find_wallet_by_owner(&self, owner_id: Uuid) -> Result<Option<Wallet>>;
    /// Binds `address` to the owner's user record and wallet, creating the
    /// wallet if needed.
    async fn connect_wallet(&self, owner_id: Uuid, address: &str) -> Result<Wallet>;
    async fn list_wallet_transactions(
        &self,
        owner_id: Uuid,
        page: Page,
    ) -> Result<Option<Paged<WalletTransaction>>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification>;
    async fn find_notification(&self, id: Uuid) -> Result<Option<Notification>>;
    async fn list_notifications(&self, recipient_id: Uuid, page: Page)
        -> Result<Paged<Notification>>;
    async fn mark_notification_read(&self, id: Uuid) -> Result<Notification>;
    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64>;
}

pub trait Store:
    UserStore + JobStore + ApplicationStore + LedgerStore + WalletStore + NotificationStore
{
}

impl<T> Store for T where
    T: UserStore + JobStore + ApplicationStore + LedgerStore + WalletStore + NotificationStore
{
}

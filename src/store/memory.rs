//! In-process store used by tests and by the server when no database is
//! configured. Data is lost on restart.
//!
//! All tables sit behind one mutex and every command holds it for its whole
//! duration, so multi-entity commands are atomic and check-then-write
//! sequences cannot interleave.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    ApplicationFilter, ApplicationStore, JobFilter, JobSort, JobStore, LedgerStore,
    NotificationStore, Page, Paged, UserStore, WalletStore,
};
use crate::error::{Error, Result};
use crate::models::{
    application::{Application, ApplicationStatus, NewApplication},
    entity_ref::EntityRef,
    job::{Job, JobChanges, JobStatus, NewJob, PaymentStatus},
    notification::{NewNotification, Notification},
    payment::{JobPaymentSettlement, Payment, PaymentType, SettlementStatus},
    user::{Certification, NewUser, Profile, User},
    wallet::{TransactionType, Wallet, WalletTransaction},
};
use crate::services::policy::Denial;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
    payments: Vec<Payment>,
    wallets: Vec<Wallet>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> Result<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    fn job_mut(&mut self, id: Uuid) -> Result<&mut Job> {
        self.jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: Page) -> Paged<T> {
    Paged {
        total: items.len() as i64,
        items: page.slice(&items),
        page,
    }
}

fn matches_filter(job: &Job, filter: &JobFilter) -> bool {
    if filter.status.is_some_and(|s| job.status != s) {
        return false;
    }
    if filter.creator_id.is_some_and(|c| job.creator_id != c) {
        return false;
    }
    if let Some(location) = &filter.location {
        if !job
            .location
            .to_lowercase()
            .contains(&location.to_lowercase())
        {
            return false;
        }
    }
    if filter.job_type.is_some_and(|t| job.job_type != t) {
        return false;
    }
    if filter.level.is_some_and(|l| job.level != l) {
        return false;
    }
    !(filter.urgent_only && !job.is_urgent)
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn search_score(job: &Job, terms: &HashSet<String>) -> usize {
    let mut words: HashSet<String> = tokens(&job.title).chain(tokens(&job.description)).collect();
    for skill in &job.skills {
        words.extend(tokens(skill));
    }
    terms.iter().filter(|t| words.contains(*t)).count()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user_with_wallet(&self, new: NewUser) -> Result<(User, Wallet)> {
        let mut tables = self.tables.lock().await;
        let taken = tables.users.iter().any(|u| {
            u.username == new.username
                || u.email == new.email
                || u.wallet_address == new.wallet_address
        }) || tables.wallets.iter().any(|w| w.address == new.wallet_address);
        if taken {
            return Err(Error::Conflict(
                "User already exists with this email, username, or wallet address".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            wallet_address: new.wallet_address.clone(),
            role: new.role,
            profile: Profile::default(),
            saved_jobs: Vec::new(),
            certifications: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let wallet = Wallet {
            id: Uuid::new_v4(),
            owner_id: user.id,
            address: new.wallet_address,
            balance: Default::default(),
            transactions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        tables.wallets.push(wallet.clone());
        Ok((user, wallet))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: Uuid, profile: Profile) -> Result<User> {
        let mut tables = self.tables.lock().await;
        let user = tables.user_mut(id)?;
        user.profile = profile;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn add_certification(&self, id: Uuid, cert: Certification) -> Result<Vec<Certification>> {
        let mut tables = self.tables.lock().await;
        let user = tables.user_mut(id)?;
        user.certifications.push(cert);
        user.updated_at = Utc::now();
        Ok(user.certifications.clone())
    }

    async fn remove_certification(&self, id: Uuid, cert_id: Uuid) -> Result<Vec<Certification>> {
        let mut tables = self.tables.lock().await;
        let user = tables.user_mut(id)?;
        user.certifications.retain(|c| c.id != cert_id);
        user.updated_at = Utc::now();
        Ok(user.certifications.clone())
    }

    async fn save_job(&self, user_id: Uuid, job_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.jobs.iter().any(|j| j.id == job_id) {
            return Err(Error::NotFound("Job not found".to_string()));
        }
        let user = tables.user_mut(user_id)?;
        if user.saved_jobs.contains(&job_id) {
            return Ok(false);
        }
        user.saved_jobs.push(job_id);
        Ok(true)
    }

    async fn unsave_job(&self, user_id: Uuid, job_id: Uuid) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.user_mut(user_id)?.saved_jobs.retain(|id| *id != job_id);
        Ok(())
    }

    async fn saved_jobs(&self, user_id: Uuid, page: Page) -> Result<Paged<Job>> {
        let tables = self.tables.lock().await;
        let user = tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        let jobs: Vec<Job> = user
            .saved_jobs
            .iter()
            .filter_map(|id| tables.jobs.iter().find(|j| j.id == *id).cloned())
            .collect();
        Ok(paginate(jobs, page))
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, new: NewJob) -> Result<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            creator_id: new.creator_id,
            title: new.title,
            company: new.company,
            description: new.description,
            responsibilities: new.responsibilities,
            requirements: new.requirements,
            location: new.location,
            job_type: new.job_type,
            salary: new.salary,
            is_urgent: new.is_urgent,
            deadline: new.deadline,
            level: new.level,
            category: new.category,
            skills: new.skills,
            status: JobStatus::Draft,
            payment_status: PaymentStatus::Unpaid,
            payment_id: None,
            applicants_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let tables = self.tables.lock().await;
        Ok(tables.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn update_draft_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<Job>> {
        let mut tables = self.tables.lock().await;
        let job = tables.job_mut(id)?;
        if job.status != JobStatus::Draft {
            return Ok(None);
        }
        changes.apply_to(job);
        job.updated_at = Utc::now();
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.jobs.len();
        tables.jobs.retain(|j| j.id != id);
        let removed = tables.jobs.len() != before;
        if removed {
            tables.applications.retain(|a| a.job_id != id);
            for user in tables.users.iter_mut() {
                user.saved_jobs.retain(|j| *j != id);
            }
        }
        Ok(removed)
    }

    async fn publish_job(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Job>> {
        let mut tables = self.tables.lock().await;
        let job = tables.job_mut(id)?;
        if !job.is_paid() || !job.status.can_transition_to(JobStatus::Published) {
            return Ok(None);
        }
        job.status = JobStatus::Published;
        job.updated_at = at;
        Ok(Some(job.clone()))
    }

    async fn list_jobs(&self, filter: JobFilter, page: Page) -> Result<Paged<Job>> {
        let tables = self.tables.lock().await;
        let mut jobs: Vec<Job> = tables
            .jobs
            .iter()
            .filter(|j| matches_filter(j, &filter))
            .cloned()
            .collect();
        if filter.sort == JobSort::Latest {
            jobs.reverse();
        }
        Ok(paginate(jobs, page))
    }

    async fn search_jobs(&self, query: &str, page: Page) -> Result<Paged<Job>> {
        let terms: HashSet<String> = tokens(query).collect();
        let tables = self.tables.lock().await;
        let mut scored: Vec<(usize, Job)> = tables
            .jobs
            .iter()
            .rev()
            .filter(|j| j.status == JobStatus::Published)
            .map(|j| (search_score(j, &terms), j.clone()))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(paginate(scored.into_iter().map(|(_, j)| j).collect(), page))
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn has_applied(&self, job_id: Uuid, applicant_id: Uuid) -> Result<bool> {
        let tables = self.tables.lock().await;
        Ok(tables
            .applications
            .iter()
            .any(|a| a.job_id == job_id && a.applicant_id == applicant_id))
    }

    async fn submit_application(&self, new: NewApplication) -> Result<(Application, Job)> {
        let mut tables = self.tables.lock().await;
        if tables
            .applications
            .iter()
            .any(|a| a.job_id == new.job_id && a.applicant_id == new.applicant_id)
        {
            return Err(Error::Denied(Denial::DuplicateApplication));
        }

        let now = Utc::now();
        let job = tables.job_mut(new.job_id)?;
        job.applicants_count += 1;
        let job = job.clone();

        let application = Application {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            applicant_id: new.applicant_id,
            resume: new.resume,
            cover_letter: new.cover_letter,
            status: ApplicationStatus::Pending,
            submission_date: now,
            updated_at: now,
        };
        tables.applications.push(application.clone());
        Ok((application, job))
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>> {
        let tables = self.tables.lock().await;
        Ok(tables.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn list_applications(
        &self,
        filter: ApplicationFilter,
        page: Page,
    ) -> Result<Paged<Application>> {
        let tables = self.tables.lock().await;
        let items: Vec<Application> = tables
            .applications
            .iter()
            .rev()
            .filter(|a| match filter {
                ApplicationFilter::ByJob(job_id) => a.job_id == job_id,
                ApplicationFilter::ByApplicant(applicant_id) => a.applicant_id == applicant_id,
            })
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let mut tables = self.tables.lock().await;
        let application = tables
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        application.status = status;
        application.updated_at = Utc::now();
        Ok(application.clone())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn settle_job_payment(&self, s: JobPaymentSettlement) -> Result<(Payment, Job)> {
        let mut tables = self.tables.lock().await;

        // Every check happens before the first write.
        let job_idx = tables
            .jobs
            .iter()
            .position(|j| j.id == s.job_id)
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        if tables.jobs[job_idx].is_paid() {
            return Err(Error::Denied(Denial::AlreadyPaid));
        }
        if tables
            .payments
            .iter()
            .any(|p| p.transaction_id == s.transaction_id)
        {
            return Err(Error::Conflict(format!(
                "Transaction {} has already been recorded",
                s.transaction_id
            )));
        }
        let wallet_idx = tables
            .wallets
            .iter()
            .position(|w| w.owner_id == s.payer_id)
            .ok_or_else(|| Error::NotFound("Wallet not found".to_string()))?;

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            amount: s.amount,
            currency: s.currency,
            payer_id: s.payer_id,
            payment_type: PaymentType::JobPosting,
            target: EntityRef::Job(s.job_id),
            transaction_id: s.transaction_id.clone(),
            status: SettlementStatus::Completed,
            created_at: now,
        };
        tables.payments.push(payment.clone());

        let job = &mut tables.jobs[job_idx];
        job.payment_status = PaymentStatus::Paid;
        job.payment_id = Some(payment.id);
        job.updated_at = now;
        let job = job.clone();

        let wallet = &mut tables.wallets[wallet_idx];
        wallet.transactions.push(WalletTransaction {
            id: Uuid::new_v4(),
            transaction_type: TransactionType::Payment,
            amount: -s.amount,
            transaction_id: Some(s.transaction_id),
            timestamp: now,
            status: SettlementStatus::Completed,
        });
        wallet.balance -= s.amount;
        wallet.updated_at = now;

        Ok((payment, job))
    }

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>> {
        let tables = self.tables.lock().await;
        Ok(tables.payments.iter().find(|p| p.id == id).cloned())
    }

    async fn list_payments(&self, payer_id: Uuid, page: Page) -> Result<Paged<Payment>> {
        let tables = self.tables.lock().await;
        let items: Vec<Payment> = tables
            .payments
            .iter()
            .rev()
            .filter(|p| p.payer_id == payer_id)
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn find_wallet_by_owner(&self, owner_id: Uuid) -> Result<Option<Wallet>> {
        let tables = self.tables.lock().await;
        Ok(tables.wallets.iter().find(|w| w.owner_id == owner_id).cloned())
    }

    async fn connect_wallet(&self, owner_id: Uuid, address: &str) -> Result<Wallet> {
        let mut tables = self.tables.lock().await;
        let taken = tables
            .wallets
            .iter()
            .any(|w| w.address == address && w.owner_id != owner_id)
            || tables
                .users
                .iter()
                .any(|u| u.wallet_address == address && u.id != owner_id);
        if taken {
            return Err(Error::Conflict(
                "Wallet address is already connected to another account".to_string(),
            ));
        }

        let now = Utc::now();
        let user = tables.user_mut(owner_id)?;
        user.wallet_address = address.to_string();
        user.updated_at = now;

        if let Some(wallet) = tables.wallets.iter_mut().find(|w| w.owner_id == owner_id) {
            wallet.address = address.to_string();
            wallet.updated_at = now;
            return Ok(wallet.clone());
        }
        let wallet = Wallet {
            id: Uuid::new_v4(),
            owner_id,
            address: address.to_string(),
            balance: Default::default(),
            transactions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.wallets.push(wallet.clone());
        Ok(wallet)
    }

    async fn list_wallet_transactions(
        &self,
        owner_id: Uuid,
        page: Page,
    ) -> Result<Option<Paged<WalletTransaction>>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .wallets
            .iter()
            .find(|w| w.owner_id == owner_id)
            .map(|w| paginate(w.transactions.clone(), page)))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: new.recipient_id,
            notification_type: new.notification_type,
            title: new.title,
            message: new.message,
            related: new.related,
            is_read: false,
            created_at: Utc::now(),
        };
        self.tables
            .lock()
            .await
            .notifications
            .push(notification.clone());
        Ok(notification)
    }

    async fn find_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        let tables = self.tables.lock().await;
        Ok(tables.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        page: Page,
    ) -> Result<Paged<Notification>> {
        let tables = self.tables.lock().await;
        let items: Vec<Notification> = tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<Notification> {
        let mut tables = self.tables.lock().await;
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound("Notification not found".to_string()))?;
        notification.is_read = true;
        Ok(notification.clone())
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for n in tables
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

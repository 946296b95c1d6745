use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    ApplicationFilter, ApplicationStore, JobFilter, JobSort, JobStore, LedgerStore,
    NotificationStore, Page, Paged, UserStore, WalletStore,
};
use crate::error::{Error, Result};
use crate::models::{
    application::{Application, ApplicationStatus, NewApplication},
    entity_ref::EntityRef,
    job::{Job, JobChanges, NewJob, PaymentStatus},
    notification::{NewNotification, Notification},
    payment::{JobPaymentSettlement, Payment, PaymentType, SettlementStatus},
    user::{Certification, NewUser, Profile, User},
    wallet::{TransactionType, Wallet, WalletTransaction},
};
use crate::services::policy::Denial;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, wallet_address, role, profile, created_at, updated_at";

const JOB_COLUMNS: &str = "id, creator_id, title, company, description, responsibilities, \
     requirements, location, job_type, salary, is_urgent, deadline, level, category, skills, \
     status, payment_status, payment_id, applicants_count, created_at, updated_at";

const APPLICATION_COLUMNS: &str =
    "id, job_id, applicant_id, resume, cover_letter, status, submission_date, updated_at";

const PAYMENT_COLUMNS: &str = "id, amount, currency, payer_id, payment_type, related_kind, \
     related_id, transaction_id, status, created_at";

const WALLET_COLUMNS: &str = "id, owner_id, address, balance, created_at, updated_at";

const WALLET_TX_COLUMNS: &str =
    "id, transaction_type, amount, transaction_id, created_at, status";

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, notification_type, title, message, \
     related_kind, related_id, is_read, created_at";

const SEARCH_DOCUMENT: &str =
    "to_tsvector('english', title || ' ' || description || ' ' || array_to_string(skills, ' '))";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    wallet_address: String,
    role: String,
    profile: Json<Profile>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CertificationRow {
    id: Uuid,
    title: String,
    provider: Option<String>,
    issue_date: Option<DateTime<Utc>>,
    cert_id: Option<String>,
    verification_link: Option<String>,
}

impl From<CertificationRow> for Certification {
    fn from(row: CertificationRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            provider: row.provider,
            issue_date: row.issue_date,
            cert_id: row.cert_id,
            verification_link: row.verification_link,
        }
    }
}

#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    creator_id: Uuid,
    title: String,
    company: String,
    description: String,
    responsibilities: String,
    requirements: Vec<String>,
    location: String,
    job_type: String,
    salary: Option<Decimal>,
    is_urgent: bool,
    deadline: DateTime<Utc>,
    level: String,
    category: String,
    skills: Vec<String>,
    status: String,
    payment_status: String,
    payment_id: Option<Uuid>,
    applicants_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = Error;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            creator_id: row.creator_id,
            title: row.title,
            company: row.company,
            description: row.description,
            responsibilities: row.responsibilities,
            requirements: row.requirements,
            location: row.location,
            job_type: row.job_type.parse()?,
            salary: row.salary,
            is_urgent: row.is_urgent,
            deadline: row.deadline,
            level: row.level.parse()?,
            category: row.category,
            skills: row.skills,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            payment_id: row.payment_id,
            applicants_count: row.applicants_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    applicant_id: Uuid,
    resume: String,
    cover_letter: Option<String>,
    status: String,
    submission_date: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = Error;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            job_id: row.job_id,
            applicant_id: row.applicant_id,
            resume: row.resume,
            cover_letter: row.cover_letter,
            status: row.status.parse()?,
            submission_date: row.submission_date,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: Uuid,
    amount: Decimal,
    currency: String,
    payer_id: Uuid,
    payment_type: String,
    related_kind: String,
    related_id: Uuid,
    transaction_id: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = Error;

    fn try_from(row: PaymentRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            amount: row.amount,
            currency: row.currency,
            payer_id: row.payer_id,
            payment_type: row.payment_type.parse()?,
            target: EntityRef::from_parts(&row.related_kind, row.related_id)?,
            transaction_id: row.transaction_id,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct WalletRow {
    id: Uuid,
    owner_id: Uuid,
    address: String,
    balance: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct WalletTransactionRow {
    id: Uuid,
    transaction_type: String,
    amount: Decimal,
    transaction_id: Option<String>,
    created_at: DateTime<Utc>,
    status: String,
}

impl TryFrom<WalletTransactionRow> for WalletTransaction {
    type Error = Error;

    fn try_from(row: WalletTransactionRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            transaction_type: row.transaction_type.parse()?,
            amount: row.amount,
            transaction_id: row.transaction_id,
            timestamp: row.created_at,
            status: row.status.parse()?,
        })
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    notification_type: String,
    title: String,
    message: String,
    related_kind: String,
    related_id: Uuid,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = Error;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            recipient_id: row.recipient_id,
            notification_type: row.notification_type.parse()?,
            title: row.title,
            message: row.message,
            related: EntityRef::from_parts(&row.related_kind, row.related_id)?,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Turns free text into an OR query of its alphanumeric terms.
fn to_or_tsquery(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" | "))
    }
}

fn push_job_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(creator_id) = filter.creator_id {
        qb.push(" AND creator_id = ").push_bind(creator_id);
    }
    if let Some(location) = &filter.location {
        qb.push(" AND location ILIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(job_type) = filter.job_type {
        qb.push(" AND job_type = ").push_bind(job_type.as_str());
    }
    if let Some(level) = filter.level {
        qb.push(" AND level = ").push_bind(level.as_str());
    }
    if filter.urgent_only {
        qb.push(" AND is_urgent");
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn hydrate_user(conn: &mut PgConnection, row: UserRow) -> Result<User> {
        let certifications = Self::certifications_of(conn, row.id).await?;
        let saved_jobs: Vec<Uuid> = sqlx::query_scalar(
            "SELECT job_id FROM saved_jobs WHERE user_id = $1 ORDER BY saved_at",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            wallet_address: row.wallet_address,
            role: row.role.parse()?,
            profile: row.profile.0,
            saved_jobs,
            certifications,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn certifications_of(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<Certification>> {
        let rows = sqlx::query_as::<_, CertificationRow>(
            "SELECT id, title, provider, issue_date, cert_id, verification_link
             FROM certifications WHERE user_id = $1 ORDER BY seq",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn hydrate_wallet(conn: &mut PgConnection, row: WalletRow) -> Result<Wallet> {
        let rows = sqlx::query_as::<_, WalletTransactionRow>(&format!(
            "SELECT {WALLET_TX_COLUMNS} FROM wallet_transactions WHERE wallet_id = $1 ORDER BY seq"
        ))
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Wallet {
            id: row.id,
            owner_id: row.owner_id,
            address: row.address,
            balance: row.balance,
            transactions: convert_all(rows)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn user_exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn job_exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user_with_wallet(&self, new: NewUser) -> Result<(User, Wallet)> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, username, email, password_hash, wallet_address, role)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.wallet_address)
        .bind(new.role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let wallet_row = sqlx::query_as::<_, WalletRow>(&format!(
            "INSERT INTO wallets (id, owner_id, address, balance)
             VALUES ($1, $2, $3, 0)
             RETURNING {WALLET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(row.id)
        .bind(&new.wallet_address)
        .fetch_one(&mut *tx)
        .await?;

        let user = Self::hydrate_user(&mut tx, row).await?;
        let wallet = Self::hydrate_wallet(&mut tx, wallet_row).await?;
        tx.commit().await?;
        Ok((user, wallet))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => Ok(Some(Self::hydrate_user(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => Ok(Some(Self::hydrate_user(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn update_profile(&self, id: Uuid, profile: Profile) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET profile = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(&profile))
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Self::hydrate_user(&mut conn, row).await
    }

    async fn add_certification(&self, id: Uuid, cert: Certification) -> Result<Vec<Certification>> {
        if !self.user_exists(id).await? {
            return Err(Error::NotFound("User not found".to_string()));
        }
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            "INSERT INTO certifications (id, user_id, title, provider, issue_date, cert_id, verification_link)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(cert.id)
        .bind(id)
        .bind(&cert.title)
        .bind(&cert.provider)
        .bind(cert.issue_date)
        .bind(&cert.cert_id)
        .bind(&cert.verification_link)
        .execute(&mut *conn)
        .await?;
        Self::certifications_of(&mut conn, id).await
    }

    async fn remove_certification(&self, id: Uuid, cert_id: Uuid) -> Result<Vec<Certification>> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("DELETE FROM certifications WHERE id = $1 AND user_id = $2")
            .bind(cert_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Self::certifications_of(&mut conn, id).await
    }

    async fn save_job(&self, user_id: Uuid, job_id: Uuid) -> Result<bool> {
        if !self.job_exists(job_id).await? {
            return Err(Error::NotFound("Job not found".to_string()));
        }
        let res = sqlx::query(
            "INSERT INTO saved_jobs (user_id, job_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn unsave_job(&self, user_id: Uuid, job_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM saved_jobs WHERE user_id = $1 AND job_id = $2")
            .bind(user_id)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn saved_jobs(&self, user_id: Uuid, page: Page) -> Result<Paged<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             JOIN saved_jobs ON saved_jobs.job_id = jobs.id
             WHERE saved_jobs.user_id = $1
             ORDER BY saved_jobs.saved_at
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_jobs WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(Paged {
            items: convert_all(rows)?,
            total,
            page,
        })
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, new: NewJob) -> Result<Job> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "INSERT INTO jobs (
                id, creator_id, title, company, description, responsibilities, requirements,
                location, job_type, salary, is_urgent, deadline, level, category, skills
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {JOB_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.creator_id)
        .bind(&new.title)
        .bind(&new.company)
        .bind(&new.description)
        .bind(&new.responsibilities)
        .bind(&new.requirements)
        .bind(&new.location)
        .bind(new.job_type.as_str())
        .bind(new.salary)
        .bind(new.is_urgent)
        .bind(new.deadline)
        .bind(new.level.as_str())
        .bind(&new.category)
        .bind(&new.skills)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Job::try_from).transpose()
    }

    async fn update_draft_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "UPDATE jobs SET
                title = COALESCE($2, title),
                company = COALESCE($3, company),
                description = COALESCE($4, description),
                responsibilities = COALESCE($5, responsibilities),
                requirements = COALESCE($6, requirements),
                location = COALESCE($7, location),
                job_type = COALESCE($8, job_type),
                salary = COALESCE($9, salary),
                is_urgent = COALESCE($10, is_urgent),
                deadline = COALESCE($11, deadline),
                level = COALESCE($12, level),
                category = COALESCE($13, category),
                skills = COALESCE($14, skills),
                updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.company)
        .bind(changes.description)
        .bind(changes.responsibilities)
        .bind(changes.requirements)
        .bind(changes.location)
        .bind(changes.job_type.map(|t| t.as_str()))
        .bind(changes.salary)
        .bind(changes.is_urgent)
        .bind(changes.deadline)
        .bind(changes.level.map(|l| l.as_str()))
        .bind(changes.category)
        .bind(changes.skills)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None if self.job_exists(id).await? => Ok(None),
            None => Err(Error::NotFound("Job not found".to_string())),
        }
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn publish_job(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "UPDATE jobs SET status = 'published', updated_at = $2
             WHERE id = $1 AND status = 'draft' AND payment_status = 'paid'
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None if self.job_exists(id).await? => Ok(None),
            None => Err(Error::NotFound("Job not found".to_string())),
        }
    }

    async fn list_jobs(&self, filter: JobFilter, page: Page) -> Result<Paged<Job>> {
        let mut items_query = QueryBuilder::<Postgres>::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
        push_job_filter(&mut items_query, &filter);
        items_query.push(match filter.sort {
            JobSort::Latest => " ORDER BY created_at DESC",
            JobSort::Oldest => " ORDER BY created_at ASC",
        });
        items_query
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = items_query
            .build_query_as::<JobRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut total_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
        push_job_filter(&mut total_query, &filter);
        let total: i64 = total_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(Paged {
            items: convert_all(rows)?,
            total,
            page,
        })
    }

    async fn search_jobs(&self, query: &str, page: Page) -> Result<Paged<Job>> {
        let Some(tsquery) = to_or_tsquery(query) else {
            return Ok(Paged {
                items: Vec::new(),
                total: 0,
                page,
            });
        };

        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE status = 'published' AND {SEARCH_DOCUMENT} @@ to_tsquery('english', $1)
             ORDER BY ts_rank({SEARCH_DOCUMENT}, to_tsquery('english', $1)) DESC, created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(&tsquery)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM jobs
             WHERE status = 'published' AND {SEARCH_DOCUMENT} @@ to_tsquery('english', $1)"
        ))
        .bind(&tsquery)
        .fetch_one(&self.pool)
        .await?;

        Ok(Paged {
            items: convert_all(rows)?,
            total,
            page,
        })
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn has_applied(&self, job_id: Uuid, applicant_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE job_id = $1 AND applicant_id = $2)",
        )
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn submit_application(&self, new: NewApplication) -> Result<(Application, Job)> {
        let mut tx = self.pool.begin().await?;

        // The counter update takes the job's row lock first; a failed insert
        // below rolls it back with the rest of the transaction.
        let job_row = sqlx::query_as::<_, JobRow>(&format!(
            "UPDATE jobs SET applicants_count = applicants_count + 1
             WHERE id = $1
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(new.job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;

        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "INSERT INTO applications (id, job_id, applicant_id, resume, cover_letter)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (job_id, applicant_id) DO NOTHING
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.job_id)
        .bind(new.applicant_id)
        .bind(&new.resume)
        .bind(&new.cover_letter)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::Denied(Denial::DuplicateApplication))?;

        tx.commit().await?;
        Ok((row.try_into()?, job_row.try_into()?))
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Application::try_from).transpose()
    }

    async fn list_applications(
        &self,
        filter: ApplicationFilter,
        page: Page,
    ) -> Result<Paged<Application>> {
        let (column, id) = match filter {
            ApplicationFilter::ByJob(id) => ("job_id", id),
            ApplicationFilter::ByApplicant(id) => ("applicant_id", id),
        };
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE {column} = $1
             ORDER BY submission_date DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM applications WHERE {column} = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Paged {
            items: convert_all(rows)?,
            total,
            page,
        })
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "UPDATE applications SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        row.try_into()
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn settle_job_payment(&self, s: JobPaymentSettlement) -> Result<(Payment, Job)> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 FOR UPDATE"
        ))
        .bind(s.job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        if job.payment_status == PaymentStatus::Paid.as_str() {
            return Err(Error::Denied(Denial::AlreadyPaid));
        }

        let wallet_id: Uuid =
            sqlx::query_scalar("SELECT id FROM wallets WHERE owner_id = $1 FOR UPDATE")
                .bind(s.payer_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| Error::NotFound("Wallet not found".to_string()))?;

        let payment = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO payments (
                id, amount, currency, payer_id, payment_type, related_kind, related_id,
                transaction_id, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(s.amount)
        .bind(&s.currency)
        .bind(s.payer_id)
        .bind(PaymentType::JobPosting.as_str())
        .bind(EntityRef::Job(s.job_id).kind())
        .bind(s.job_id)
        .bind(&s.transaction_id)
        .bind(SettlementStatus::Completed.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let job = sqlx::query_as::<_, JobRow>(&format!(
            "UPDATE jobs SET payment_status = 'paid', payment_id = $2, updated_at = NOW()
             WHERE id = $1 AND payment_status = 'unpaid'
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(s.job_id)
        .bind(payment.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::Denied(Denial::AlreadyPaid))?;

        sqlx::query(
            "INSERT INTO wallet_transactions (id, wallet_id, transaction_type, amount, transaction_id, status)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(wallet_id)
        .bind(TransactionType::Payment.as_str())
        .bind(-s.amount)
        .bind(&s.transaction_id)
        .bind(SettlementStatus::Completed.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE wallets SET balance = balance - $2, updated_at = NOW() WHERE id = $1")
            .bind(wallet_id)
            .bind(s.amount)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((payment.try_into()?, job.try_into()?))
    }

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Payment::try_from).transpose()
    }

    async fn list_payments(&self, payer_id: Uuid, page: Page) -> Result<Paged<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE payer_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(payer_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE payer_id = $1")
            .bind(payer_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(Paged {
            items: convert_all(rows)?,
            total,
            page,
        })
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn find_wallet_by_owner(&self, owner_id: Uuid) -> Result<Option<Wallet>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => Ok(Some(Self::hydrate_wallet(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn connect_wallet(&self, owner_id: Uuid, address: &str) -> Result<Wallet> {
        let mut tx = self.pool.begin().await?;

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM wallets WHERE address = $1 AND owner_id <> $2)
                 OR EXISTS(SELECT 1 FROM users WHERE wallet_address = $1 AND id <> $2)",
        )
        .bind(address)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(Error::Conflict(
                "Wallet address is already connected to another account".to_string(),
            ));
        }

        let updated = sqlx::query(
            "UPDATE users SET wallet_address = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(owner_id)
        .bind(address)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }

        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "INSERT INTO wallets (id, owner_id, address, balance)
             VALUES ($1, $2, $3, 0)
             ON CONFLICT (owner_id) DO UPDATE SET address = EXCLUDED.address, updated_at = NOW()
             RETURNING {WALLET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(address)
        .fetch_one(&mut *tx)
        .await?;

        let wallet = Self::hydrate_wallet(&mut tx, row).await?;
        tx.commit().await?;
        Ok(wallet)
    }

    async fn list_wallet_transactions(
        &self,
        owner_id: Uuid,
        page: Page,
    ) -> Result<Option<Paged<WalletTransaction>>> {
        let wallet_id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM wallets WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(wallet_id) = wallet_id else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, WalletTransactionRow>(&format!(
            "SELECT {WALLET_TX_COLUMNS} FROM wallet_transactions
             WHERE wallet_id = $1
             ORDER BY seq
             LIMIT $2 OFFSET $3"
        ))
        .bind(wallet_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM wallet_transactions WHERE wallet_id = $1")
                .bind(wallet_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(Some(Paged {
            items: convert_all(rows)?,
            total,
            page,
        }))
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "INSERT INTO notifications (
                id, recipient_id, notification_type, title, message, related_kind, related_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.recipient_id)
        .bind(new.notification_type.as_str())
        .bind(&new.title)
        .bind(&new.message)
        .bind(new.related.kind())
        .bind(new.related.id())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn find_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Notification::try_from).transpose()
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        page: Page,
    ) -> Result<Paged<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE recipient_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(recipient_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1")
                .bind(recipient_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(Paged {
            items: convert_all(rows)?,
            total,
            page,
        })
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Notification not found".to_string()))?;
        row.try_into()
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_terms_become_an_or_query() {
        assert_eq!(
            to_or_tsquery("Rust, Tokio & axum!").as_deref(),
            Some("rust | tokio | axum")
        );
        assert_eq!(to_or_tsquery("  &&  "), None);
    }
}

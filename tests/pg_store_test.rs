//! Behaviour of `PgStore` against a live database.
//!
//! Every test returns early unless `DATABASE_URL` points at a Postgres
//! instance the migrations can run against. Rows are keyed by fresh uuids so
//! the tests can share a database and run in parallel.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use skillnet_backend::{
    database::pool::run_migrations,
    error::Error,
    models::{
        application::NewApplication,
        job::{JobLevel, JobStatus, JobType, NewJob, PaymentStatus},
        payment::JobPaymentSettlement,
        user::{NewUser, Role, User},
    },
    services::policy::Denial,
    store::{ApplicationStore, JobStore, LedgerStore, PgStore, UserStore, WalletStore},
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn connect() -> Option<PgStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("DATABASE_URL is set but unreachable");
    run_migrations(&pool).await.expect("migrations failed");
    Some(PgStore::new(pool))
}

fn unique_address() -> String {
    format!("0x{}", Uuid::new_v4().simple())
}

async fn new_user(store: &PgStore, role: Role) -> User {
    let tag = Uuid::new_v4().simple().to_string();
    let (user, _) = store
        .create_user_with_wallet(NewUser {
            username: format!("user_{}", &tag[..12]),
            email: format!("{}@example.com", tag),
            password_hash: "hashed:secret".to_string(),
            wallet_address: unique_address(),
            role,
        })
        .await
        .unwrap();
    user
}

fn new_job(creator_id: Uuid, title: &str) -> NewJob {
    NewJob {
        creator_id,
        title: title.to_string(),
        company: "Acme".to_string(),
        description: "Work on the ledger".to_string(),
        responsibilities: "Everything".to_string(),
        requirements: vec![],
        location: "Berlin, Germany".to_string(),
        job_type: JobType::Remote,
        salary: None,
        is_urgent: false,
        deadline: Utc::now() + Duration::days(7),
        level: JobLevel::Mid,
        category: "engineering".to_string(),
        skills: vec!["rust".to_string()],
    }
}

fn settlement(payer_id: Uuid, job_id: Uuid, tx: &str) -> JobPaymentSettlement {
    JobPaymentSettlement {
        payer_id,
        job_id,
        amount: Decimal::new(5, 1),
        currency: "ETH".to_string(),
        transaction_id: tx.to_string(),
    }
}

fn application(job_id: Uuid, applicant_id: Uuid) -> NewApplication {
    NewApplication {
        job_id,
        applicant_id,
        resume: "https://cv.example.com/me.pdf".to_string(),
        cover_letter: None,
    }
}

#[tokio::test]
async fn settlement_debits_the_wallet_and_marks_the_job_paid() {
    let Some(store) = connect().await else { return };
    let employer = new_user(&store, Role::Employer).await;
    let job = store.insert_job(new_job(employer.id, "Paid")).await.unwrap();
    let tx = format!("tx-{}", Uuid::new_v4());

    let (payment, paid) = store
        .settle_job_payment(settlement(employer.id, job.id, &tx))
        .await
        .unwrap();

    assert_eq!(payment.transaction_id, tx);
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    let wallet = store.find_wallet_by_owner(employer.id).await.unwrap().unwrap();
    assert_eq!(wallet.balance, Decimal::new(-5, 1));
    assert_eq!(wallet.transactions.len(), 1);
    assert!(wallet.is_reconciled());
}

#[tokio::test]
async fn concurrent_settlements_pay_a_job_once() {
    let Some(store) = connect().await else { return };
    let employer = new_user(&store, Role::Employer).await;
    let job = store.insert_job(new_job(employer.id, "Raced")).await.unwrap();
    let first_tx = format!("tx-{}", Uuid::new_v4());
    let second_tx = format!("tx-{}", Uuid::new_v4());

    let (first, second) = tokio::join!(
        store.settle_job_payment(settlement(employer.id, job.id, &first_tx)),
        store.settle_job_payment(settlement(employer.id, job.id, &second_tx)),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(Error::Denied(Denial::AlreadyPaid)))));

    let wallet = store.find_wallet_by_owner(employer.id).await.unwrap().unwrap();
    assert_eq!(wallet.transactions.len(), 1);
    assert_eq!(wallet.balance, Decimal::new(-5, 1));
}

#[tokio::test]
async fn reused_transaction_id_leaves_the_second_job_unpaid() {
    let Some(store) = connect().await else { return };
    let employer = new_user(&store, Role::Employer).await;
    let first = store.insert_job(new_job(employer.id, "One")).await.unwrap();
    let second = store.insert_job(new_job(employer.id, "Two")).await.unwrap();
    let tx = format!("tx-{}", Uuid::new_v4());

    store
        .settle_job_payment(settlement(employer.id, first.id, &tx))
        .await
        .unwrap();
    let err = store
        .settle_job_payment(settlement(employer.id, second.id, &tx))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let second = store.find_job(second.id).await.unwrap().unwrap();
    assert_eq!(second.payment_status, PaymentStatus::Unpaid);
    let wallet = store.find_wallet_by_owner(employer.id).await.unwrap().unwrap();
    assert_eq!(wallet.transactions.len(), 1);
    assert_eq!(wallet.balance, Decimal::new(-5, 1));
}

#[tokio::test]
async fn unpaid_jobs_stay_drafts() {
    let Some(store) = connect().await else { return };
    let employer = new_user(&store, Role::Employer).await;
    let job = store.insert_job(new_job(employer.id, "Draft")).await.unwrap();

    assert!(store.publish_job(job.id, Utc::now()).await.unwrap().is_none());
    let job = store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Draft);

    let missing = store.publish_job(Uuid::new_v4(), Utc::now()).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn applying_twice_is_rejected_and_not_counted() {
    let Some(store) = connect().await else { return };
    let employer = new_user(&store, Role::Employer).await;
    let seeker = new_user(&store, Role::JobSeeker).await;
    let job = store.insert_job(new_job(employer.id, "Open")).await.unwrap();

    let (_, counted) = store
        .submit_application(application(job.id, seeker.id))
        .await
        .unwrap();
    assert_eq!(counted.applicants_count, 1);

    let err = store
        .submit_application(application(job.id, seeker.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Denied(Denial::DuplicateApplication)));
    let job = store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.applicants_count, 1);
}

#[tokio::test]
async fn concurrent_applications_from_one_seeker_count_once() {
    let Some(store) = connect().await else { return };
    let employer = new_user(&store, Role::Employer).await;
    let seeker = new_user(&store, Role::JobSeeker).await;
    let job = store.insert_job(new_job(employer.id, "Busy")).await.unwrap();

    let (first, second) = tokio::join!(
        store.submit_application(application(job.id, seeker.id)),
        store.submit_application(application(job.id, seeker.id)),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(Error::Denied(Denial::DuplicateApplication)))));
    let job = store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.applicants_count, 1);
}

#[tokio::test]
async fn wallet_address_held_by_another_user_cannot_be_connected() {
    let Some(store) = connect().await else { return };
    let holder = new_user(&store, Role::JobSeeker).await;
    let other = new_user(&store, Role::JobSeeker).await;

    let err = store
        .connect_wallet(other.id, &holder.wallet_address)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let wallet = store.find_wallet_by_owner(other.id).await.unwrap().unwrap();
    assert_eq!(wallet.address, other.wallet_address);

    let fresh = unique_address();
    let moved = store.connect_wallet(other.id, &fresh).await.unwrap();
    assert_eq!(moved.address, fresh);
}

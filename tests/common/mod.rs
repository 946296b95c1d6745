#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use mockall::mock;
use rust_decimal::Decimal;
use skillnet_backend::{
    dto::{
        auth_dto::RegisterPayload, job_dto::CreateJobPayload, payment_dto::PayForJobPayload,
    },
    error::Result,
    models::{
        job::{Job, JobLevel, JobType},
        user::{Actor, Role},
    },
    store::MemoryStore,
    utils::{crypto::CredentialHasher, token::TokenIssuer},
    AppState,
};

pub const JWT_SECRET: &str = "integration-secret";

mock! {
    pub Hasher {}

    impl CredentialHasher for Hasher {
        fn hash(&self, plain: &str) -> Result<String>;
        fn verify(&self, plain: &str, hashed: &str) -> Result<bool>;
    }
}

/// A hasher that tags the plain text instead of running argon2.
pub fn fast_hasher() -> MockHasher {
    let mut hasher = MockHasher::new();
    hasher
        .expect_hash()
        .returning(|plain| Ok(format!("hashed:{}", plain)));
    hasher
        .expect_verify()
        .returning(|plain, hashed| Ok(hashed == format!("hashed:{}", plain)));
    hasher
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(JWT_SECRET, 7)
}

pub fn test_state() -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(fast_hasher()),
        token_issuer(),
    )
}

pub fn register_payload(name: &str, role: Role) -> RegisterPayload {
    RegisterPayload {
        username: name.to_string(),
        email: format!("{}@example.com", name),
        password: "password123".to_string(),
        wallet_address: format!("0x{}", name),
        role,
    }
}

pub async fn register(state: &AppState, name: &str, role: Role) -> Actor {
    let session = state
        .auth_service
        .register(register_payload(name, role))
        .await
        .expect("register");
    Actor::from(&session.user)
}

pub fn job_payload(title: &str) -> CreateJobPayload {
    CreateJobPayload {
        title: title.to_string(),
        company: "Chainworks".to_string(),
        description: "Build and maintain the settlement service".to_string(),
        responsibilities: "Own the ledger".to_string(),
        requirements: vec!["3+ years".to_string()],
        location: "Lisbon, Portugal".to_string(),
        job_type: JobType::Remote,
        salary: Some(Decimal::new(90_000, 0)),
        is_urgent: false,
        deadline: Utc::now() + Duration::days(14),
        level: JobLevel::Senior,
        category: "engineering".to_string(),
        skills: vec!["rust".to_string(), "postgres".to_string()],
    }
}

pub fn payment(amount: Decimal, tx: &str) -> PayForJobPayload {
    PayForJobPayload {
        amount,
        transaction_id: tx.to_string(),
    }
}

/// Creates, pays for and publishes a job owned by `employer`.
pub async fn published_job(state: &AppState, employer: &Actor, title: &str) -> Job {
    published_job_from(state, employer, job_payload(title)).await
}

pub async fn published_job_from(
    state: &AppState,
    employer: &Actor,
    payload: CreateJobPayload,
) -> Job {
    let job = state
        .job_service
        .create(employer, payload)
        .await
        .expect("create job");
    state
        .payment_service
        .pay_for_job(
            employer,
            job.id,
            payment(Decimal::new(5, 1), &format!("tx-{}", job.id)),
        )
        .await
        .expect("pay for job");
    state
        .job_service
        .publish(employer, job.id)
        .await
        .expect("publish job")
}

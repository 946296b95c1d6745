pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::services::{
    application_service::ApplicationService, auth_service::AuthService, job_service::JobService,
    notification_service::NotificationService, payment_service::PaymentService,
    user_service::UserService, wallet_service::WalletService,
};
use crate::store::Store;
use crate::utils::{crypto::CredentialHasher, token::TokenIssuer};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub payment_service: PaymentService,
    pub wallet_service: WalletService,
    pub user_service: UserService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenIssuer,
    ) -> Self {
        let notification_service = NotificationService::new(store.clone());
        let auth_service = AuthService::new(store.clone(), hasher, tokens);
        let job_service = JobService::new(store.clone());
        let application_service =
            ApplicationService::new(store.clone(), notification_service.clone());
        let payment_service = PaymentService::new(store.clone(), notification_service.clone());
        let wallet_service = WalletService::new(store.clone());
        let user_service = UserService::new(store);

        Self {
            auth_service,
            job_service,
            application_service,
            payment_service,
            wallet_service,
            user_service,
            notification_service,
        }
    }
}

pub mod applications;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod payments;
pub mod users;
pub mod wallet;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::middleware::auth::require_auth;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/jobs", get(jobs::list_jobs))
        .route("/api/jobs/search", get(jobs::search_jobs))
        .route("/api/jobs/:id", get(jobs::get_job));

    let protected_api = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/jobs", post(jobs::create_job))
        .route(
            "/api/jobs/:id",
            put(jobs::update_job).delete(jobs::delete_job),
        )
        .route("/api/jobs/:id/publish", post(jobs::publish_job))
        .route(
            "/api/jobs/:id/save",
            post(jobs::save_job).delete(jobs::unsave_job),
        )
        .route("/api/jobs/user/drafts", get(jobs::my_drafts))
        .route("/api/jobs/user/published", get(jobs::my_published))
        .route("/api/jobs/user/saved", get(jobs::saved_jobs))
        .route(
            "/api/applications/jobs/:job_id",
            post(applications::apply).get(applications::for_job),
        )
        .route("/api/applications/user", get(applications::mine))
        .route("/api/applications/:id", get(applications::get_application))
        .route(
            "/api/applications/:id/status",
            put(applications::update_status),
        )
        .route(
            "/api/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/users/certifications", post(users::add_certification))
        .route(
            "/api/users/certifications/:id",
            delete(users::remove_certification),
        )
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/read-all", put(notifications::mark_all_read))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .route("/api/payments/jobs/:job_id", post(payments::pay_for_job))
        .route("/api/payments/history", get(payments::history))
        .route("/api/payments/:id", get(payments::get_payment))
        .route("/api/wallet", get(wallet::get_wallet))
        .route("/api/wallet/transactions", get(wallet::transactions))
        .route("/api/wallet/connect", post(wallet::connect))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    public_api.merge(protected_api).with_state(state)
}

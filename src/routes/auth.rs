use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, RegisterPayload},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "User registered", body = Json<crate::dto::auth_dto::AuthResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username, email or wallet address already taken")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    let session = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Logged in", body = Json<crate::dto::auth_dto::AuthResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state.auth_service.login(payload).await?;
    Ok(Json(session))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = Json<crate::models::user::User>),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.me(&actor).await?;
    Ok(Json(user))
}

/// Tokens are stateless, so logging out only tells the client to drop its copy.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out")
    )
)]
#[axum::debug_handler]
pub async fn logout(Extension(actor): Extension<Actor>) -> impl IntoResponse {
    tracing::info!(user_id = %actor.id, "user logged out");
    Json(json!({ "message": "Logged out successfully" }))
}

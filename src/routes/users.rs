use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::{AddCertificationPayload, UpdateProfilePayload},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "The caller's profile", body = Json<crate::models::user::User>)
    )
)]
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.profile(&actor).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated", body = Json<crate::models::user::User>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.update_profile(&actor, payload).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/users/certifications",
    request_body = AddCertificationPayload,
    responses(
        (status = 201, description = "Certification added; returns all certifications")
    )
)]
#[axum::debug_handler]
pub async fn add_certification(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<AddCertificationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let certifications = state
        .user_service
        .add_certification(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(certifications)))
}

#[utoipa::path(
    delete,
    path = "/api/users/certifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Certification ID")
    ),
    responses(
        (status = 200, description = "Certification removed; returns the rest")
    )
)]
#[axum::debug_handler]
pub async fn remove_certification(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let certifications = state
        .user_service
        .remove_certification(&actor, id)
        .await?;
    Ok(Json(certifications))
}

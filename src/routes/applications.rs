use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::{ApplicationView, ApplyPayload, UpdateApplicationStatusPayload},
        pagination::{PageQuery, Paginated},
    },
    error::Result,
    models::user::Actor,
    AppState,
};

pub type ApplicationPage = Paginated<ApplicationView>;

#[utoipa::path(
    post,
    path = "/api/applications/jobs/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID")
    ),
    request_body = ApplyPayload,
    responses(
        (status = 201, description = "Application submitted", body = Json<crate::models::application::Application>),
        (status = 400, description = "Deadline passed or invalid payload"),
        (status = 403, description = "Job seekers only, or job not published"),
        (status = 409, description = "Already applied")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<ApplyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .application_service
        .apply(&actor, job_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/api/applications/jobs/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Applications for the job with applicant details", body = Json<ApplicationPage>),
        (status = 403, description = "Not the job's creator")
    )
)]
#[axum::debug_handler]
pub async fn for_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let applications = state
        .application_service
        .for_job(&actor, job_id, query.page())
        .await?;
    Ok(Json(ApplicationPage::from(applications)))
}

#[utoipa::path(
    get,
    path = "/api/applications/user",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "The caller's applications", body = Json<ApplicationPage>)
    )
)]
#[axum::debug_handler]
pub async fn mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let applications = state.application_service.mine(&actor, query.page()).await?;
    Ok(Json(ApplicationPage::from(applications)))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application with applicant and job", body = Json<ApplicationView>),
        (status = 403, description = "Neither the applicant nor the job's creator")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.get(&actor, id).await?;
    Ok(Json(application))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateApplicationStatusPayload,
    responses(
        (status = 200, description = "Status updated", body = Json<crate::models::application::Application>),
        (status = 403, description = "Not the job's creator")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationStatusPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .update_status(&actor, id, payload.status)
        .await?;
    Ok(Json(application))
}

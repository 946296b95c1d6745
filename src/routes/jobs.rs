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
        job_dto::{CreateJobPayload, JobListQuery, JobSearchQuery, JobView, UpdateJobPayload},
        pagination::{PageQuery, Paginated},
    },
    error::Result,
    models::{job::Job, user::Actor},
    AppState,
};

pub type JobPage = Paginated<Job>;
pub type JobViewPage = Paginated<JobView>;

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("location" = Option<String>, Query, description = "Location substring"),
        ("job_type" = Option<String>, Query, description = "remote, onsite or hybrid"),
        ("level" = Option<String>, Query, description = "Seniority level"),
        ("is_urgent" = Option<bool>, Query, description = "Only urgent jobs"),
        ("sort" = Option<String>, Query, description = "latest or oldest")
    ),
    responses(
        (status = 200, description = "Published jobs with their creators", body = Json<JobViewPage>)
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.list(&query).await?;
    let jobs = state.job_service.with_creators(jobs).await?;
    Ok(Json(JobViewPage::from(jobs)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/search",
    params(
        ("q" = String, Query, description = "Search terms"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Matching published jobs", body = Json<JobViewPage>),
        (status = 400, description = "Missing query")
    )
)]
#[axum::debug_handler]
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobSearchQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state
        .job_service
        .search(query.q.as_deref(), query.page())
        .await?;
    let jobs = state.job_service.with_creators(jobs).await?;
    Ok(Json(JobViewPage::from(jobs)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job with its creator", body = Json<JobView>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.view(id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Draft job created", body = Json<Job>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Employer role required")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Draft updated", body = Json<Job>),
        (status = 403, description = "Not the job's creator"),
        (status = 409, description = "Job is no longer a draft")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.update(&actor, id, payload).await?;
    Ok(Json(job))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 403, description = "Not the job's creator")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.job_service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/publish",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job published", body = Json<Job>),
        (status = 402, description = "Job posting has not been paid for"),
        (status = 403, description = "Not the job's creator")
    )
)]
#[axum::debug_handler]
pub async fn publish_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.publish(&actor, id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/save",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job saved"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job already saved")
    )
)]
#[axum::debug_handler]
pub async fn save_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.job_service.save(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}/save",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job removed from saved jobs")
    )
)]
#[axum::debug_handler]
pub async fn unsave_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.job_service.unsave(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/jobs/user/drafts",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "The caller's draft jobs", body = Json<JobPage>)
    )
)]
#[axum::debug_handler]
pub async fn my_drafts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.my_drafts(&actor, query.page()).await?;
    Ok(Json(JobPage::from(jobs)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/user/published",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "The caller's published jobs", body = Json<JobPage>)
    )
)]
#[axum::debug_handler]
pub async fn my_published(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.my_published(&actor, query.page()).await?;
    Ok(Json(JobPage::from(jobs)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/user/saved",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Jobs the caller saved", body = Json<JobPage>)
    )
)]
#[axum::debug_handler]
pub async fn saved_jobs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.saved(&actor, query.page()).await?;
    Ok(Json(JobPage::from(jobs)))
}

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
        pagination::{PageQuery, Paginated},
        payment_dto::{PayForJobPayload, PaymentHistoryEntry},
    },
    error::Result,
    models::user::Actor,
    AppState,
};

pub type PaymentHistoryPage = Paginated<PaymentHistoryEntry>;

#[utoipa::path(
    post,
    path = "/api/payments/jobs/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID")
    ),
    request_body = PayForJobPayload,
    responses(
        (status = 201, description = "Payment settled", body = Json<crate::models::payment::Payment>),
        (status = 400, description = "Invalid amount or transaction id"),
        (status = 403, description = "Not the job's creator"),
        (status = 409, description = "Job already paid or transaction id reused")
    )
)]
#[axum::debug_handler]
pub async fn pay_for_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<PayForJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let payment = state
        .payment_service
        .pay_for_job(&actor, job_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/payments/history",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "The caller's payments", body = Json<PaymentHistoryPage>)
    )
)]
#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let payments = state.payment_service.history(&actor, query.page()).await?;
    Ok(Json(PaymentHistoryPage::from(payments)))
}

#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment found", body = Json<crate::models::payment::Payment>),
        (status = 403, description = "Not the payer")
    )
)]
#[axum::debug_handler]
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let payment = state.payment_service.get(&actor, id).await?;
    Ok(Json(payment))
}

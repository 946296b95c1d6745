use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dto::pagination::{PageQuery, Paginated},
    error::Result,
    models::{notification::Notification, user::Actor},
    AppState,
};

pub type NotificationPage = Paginated<Notification>;

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = Json<NotificationPage>)
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let notifications = state
        .notification_service
        .list(&actor, query.page())
        .await?;
    Ok(Json(NotificationPage::from(notifications)))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked read", body = Json<Notification>),
        (status = 403, description = "Not the recipient")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let notification = state.notification_service.mark_read(&actor, id).await?;
    Ok(Json(notification))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read")
    )
)]
#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let updated = state.notification_service.mark_all_read(&actor).await?;
    Ok(Json(json!({ "updated": updated })))
}

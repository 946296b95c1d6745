use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::{
        pagination::{PageQuery, Paginated},
        payment_dto::ConnectWalletPayload,
    },
    error::Result,
    models::{
        user::Actor,
        wallet::WalletTransaction,
    },
    AppState,
};

pub type WalletTransactionPage = Paginated<WalletTransaction>;

#[utoipa::path(
    get,
    path = "/api/wallet",
    responses(
        (status = 200, description = "The caller's wallet", body = Json<crate::models::wallet::Wallet>),
        (status = 404, description = "Wallet not found")
    )
)]
#[axum::debug_handler]
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let wallet = state.wallet_service.get(&actor).await?;
    Ok(Json(wallet))
}

#[utoipa::path(
    get,
    path = "/api/wallet/transactions",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Wallet history", body = Json<WalletTransactionPage>),
        (status = 404, description = "Wallet not found")
    )
)]
#[axum::debug_handler]
pub async fn transactions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let history = state
        .wallet_service
        .transactions(&actor, query.page())
        .await?;
    Ok(Json(WalletTransactionPage::from(history)))
}

#[utoipa::path(
    post,
    path = "/api/wallet/connect",
    request_body = ConnectWalletPayload,
    responses(
        (status = 200, description = "Wallet connected", body = Json<crate::models::wallet::Wallet>),
        (status = 409, description = "Address belongs to another account")
    )
)]
#[axum::debug_handler]
pub async fn connect(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ConnectWalletPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let wallet = state.wallet_service.connect(&actor, &payload.address).await?;
    Ok(Json(wallet))
}

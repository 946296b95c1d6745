use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::Error;
use crate::AppState;

/// Resolves the bearer token to an [`Actor`](crate::models::user::Actor)
/// and stores it in the request extensions.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Error::Unauthorized("Missing authorization header".to_string()).into_response();
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Error::Unauthorized("Malformed authorization header".to_string()).into_response();
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Error::Unauthorized("Unsupported authorization scheme".to_string()).into_response();
    };

    match state.auth_service.authenticate(token.trim()).await {
        Ok(actor) => {
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

use axum::{
    extract::{Path, State},
    Json,
};
use pricing_engine::Vertical;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::payment::{CheckoutRequest, VerifyPaymentRequest};
use crate::services::checkout;
use crate::AppState;

/// Payment-step submission: creates the booking, settles coins, and either
/// confirms (demo) or returns a gateway order for the client widget.
pub async fn submit(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Path(vertical): Path<String>,
    Json(body): Json<CheckoutRequest>,
) -> AppResult<Json<Value>> {
    let vertical: Vertical = vertical
        .parse()
        .map_err(|e: pricing_engine::UnknownVertical| AppError::BadRequest(e.to_string()))?;

    let outcome = checkout::submit(&state, user.id, vertical, body).await?;
    Ok(Json(json!(outcome)))
}

/// Gateway callback: the client forwards the signed payload here for
/// server-side verification.
pub async fn verify(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Json(body): Json<VerifyPaymentRequest>,
) -> AppResult<Json<Value>> {
    let result = checkout::confirm_payment(&state, user.id, body).await?;
    Ok(Json(result))
}

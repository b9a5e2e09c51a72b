use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::coins::{CoinTransaction, CoinWallet, EarnRequest};
use crate::services::ledger;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn get_wallet(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let wallet: Option<CoinWallet> =
        sqlx::query_as("SELECT * FROM coin_wallets WHERE user_id = $1")
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    let (balance, lifetime_earned) = wallet
        .map(|w| (w.balance, w.lifetime_earned))
        .unwrap_or((0, 0));
    Ok(Json(json!({
        "wallet": { "balance": balance, "lifetimeEarned": lifetime_earned }
    })))
}

pub async fn get_transactions(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Query(q): Query<PaginationQuery>,
) -> AppResult<Json<Value>> {
    let limit = q.limit.unwrap_or(20).min(50);
    let offset = q.offset.unwrap_or(0);

    let rows: Vec<CoinTransaction> = sqlx::query_as(
        r#"SELECT * FROM coin_transactions WHERE user_id = $1
        ORDER BY created_at DESC LIMIT $2 OFFSET $3"#,
    )
    .bind(user.id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let txns: Vec<Value> = rows
        .iter()
        .map(|t| {
            json!({
                "delta": t.delta, "balanceAfter": t.balance_after, "txType": t.tx_type,
                "reason": t.reason, "referenceId": t.reference_id, "createdAt": t.created_at
            })
        })
        .collect();

    Ok(Json(json!({ "transactions": txns })))
}

pub async fn earn(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Json(body): Json<EarnRequest>,
) -> AppResult<Json<Value>> {
    if body.amount <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }
    if body.amount > state.config.coins.max_earn_per_request {
        return Err(AppError::BadRequest(format!(
            "At most {} coins can be earned at once",
            state.config.coins.max_earn_per_request
        )));
    }
    if body.source.trim().is_empty() {
        return Err(AppError::BadRequest("Source is required".into()));
    }

    let balance = ledger::earn(
        &state.db,
        user.id,
        body.amount,
        body.source.trim(),
        body.reference_id.as_deref(),
    )
    .await?;

    Ok(Json(json!({ "balance": balance })))
}

#[derive(Debug, Deserialize)]
pub struct MaxRedeemableQuery {
    pub total: i64,
}

/// Live clamp for the coin input on checkout forms: how many coins this
/// user could apply to an order of the given total.
pub async fn max_redeemable(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Query(q): Query<MaxRedeemableQuery>,
) -> AppResult<Json<Value>> {
    let balance = ledger::balance(&state.db, user.id).await?;
    let max = pricing_engine::max_redeemable(q.total, balance);

    Ok(Json(json!({
        "maxRedeemable": max,
        "balance": balance,
        "capPercent": pricing_engine::REDEMPTION_CAP_PERCENT,
    })))
}

use axum::{
    extract::{Path, State},
    Json,
};
use pricing_engine::Vertical;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::booking::Booking;
use crate::services::checkout::table_for;
use crate::AppState;

fn with_vertical(booking: &Booking, vertical: Vertical) -> Value {
    let mut v = serde_json::to_value(booking).unwrap_or(Value::Null);
    v["type"] = json!(vertical.as_str());
    v
}

/// All of the caller's bookings across the four verticals, newest first.
pub async fn list_my_bookings(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let mut entries: Vec<(chrono::DateTime<chrono::Utc>, Value)> = Vec::new();

    for vertical in Vertical::ALL {
        let table = table_for(vertical);
        let rows: Vec<Booking> = sqlx::query_as(&format!(
            "SELECT * FROM {table} WHERE user_id = $1 ORDER BY created_at DESC LIMIT 50"
        ))
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;

        for b in &rows {
            entries.push((b.created_at, with_vertical(b, vertical)));
        }
    }

    entries.sort_by(|a, b| b.0.cmp(&a.0));
    let bookings: Vec<Value> = entries.into_iter().map(|(_, v)| v).collect();

    Ok(Json(json!({ "bookings": bookings })))
}

pub async fn get_booking(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Path((vertical, id)): Path<(String, Uuid)>,
) -> AppResult<Json<Value>> {
    let vertical: Vertical = vertical
        .parse()
        .map_err(|e: pricing_engine::UnknownVertical| AppError::BadRequest(e.to_string()))?;
    let table = table_for(vertical);

    let booking: Booking = sqlx::query_as(&format!(
        "SELECT * FROM {table} WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

    Ok(Json(json!({ "booking": with_vertical(&booking, vertical) })))
}

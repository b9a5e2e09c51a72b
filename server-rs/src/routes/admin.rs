use axum::{
    extract::{Path, State},
    Json,
};
use pricing_engine::Vertical;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::booking::Booking;
use crate::models::catalog::*;
use crate::services::checkout::table_for;
use crate::AppState;

/// Dashboard stats: booking counts per vertical, confirmed revenue, and the
/// platform's outstanding coin liability.
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let mut counts = serde_json::Map::new();
    let mut revenue: i64 = 0;

    for vertical in Vertical::ALL {
        let table = table_for(vertical);
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&state.db)
            .await?;
        counts.insert(vertical.as_str().to_string(), json!(count));

        let confirmed: i64 = sqlx::query_scalar(&format!(
            "SELECT COALESCE(SUM(amount_due), 0) FROM {table} WHERE status = 'confirmed'"
        ))
        .fetch_one(&state.db)
        .await?;
        revenue += confirmed;
    }

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;
    let coins_liability: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(balance), 0) FROM coin_wallets")
            .fetch_one(&state.db)
            .await?;

    Ok(Json(json!({
        "bookings": counts,
        "revenue": revenue,
        "users": users,
        "coinsLiability": coins_liability,
    })))
}

/// Most recent bookings across all verticals, for the dashboard feed.
pub async fn recent_bookings(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let mut entries: Vec<(chrono::DateTime<chrono::Utc>, Value)> = Vec::new();

    for vertical in Vertical::ALL {
        let table = table_for(vertical);
        let rows: Vec<Booking> = sqlx::query_as(&format!(
            "SELECT * FROM {table} ORDER BY created_at DESC LIMIT 20"
        ))
        .fetch_all(&state.db)
        .await?;

        for b in rows {
            let mut v = serde_json::to_value(&b).unwrap_or(Value::Null);
            v["type"] = json!(vertical.as_str());
            entries.push((b.created_at, v));
        }
    }

    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries.truncate(50);
    let bookings: Vec<Value> = entries.into_iter().map(|(_, v)| v).collect();

    Ok(Json(json!({ "bookings": bookings })))
}

pub async fn create_hotel(
    State(state): State<AppState>,
    Json(body): Json<CreateHotelRequest>,
) -> AppResult<Json<Value>> {
    if body.price_per_night <= 0 {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }

    let hotel: Hotel = sqlx::query_as(
        r#"INSERT INTO hotels (id, name, city, price_per_night, rating, amenities, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, true)
        RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.name)
    .bind(&body.city)
    .bind(body.price_per_night)
    .bind(body.rating)
    .bind(&body.amenities)
    .fetch_one(&state.db)
    .await?;

    state
        .cache
        .del(unfiltered_cache_key(Vertical::Hotel))
        .await;
    Ok(Json(json!({ "hotel": hotel })))
}

pub async fn create_flight(
    State(state): State<AppState>,
    Json(body): Json<CreateFlightRequest>,
) -> AppResult<Json<Value>> {
    if body.base_fare <= 0 {
        return Err(AppError::BadRequest("Base fare must be positive".into()));
    }

    let flight: Flight = sqlx::query_as(
        r#"INSERT INTO flights (id, airline, flight_number, from_city, to_city, departure_at, arrival_at, base_fare, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true)
        RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.airline)
    .bind(&body.flight_number)
    .bind(&body.from_city)
    .bind(&body.to_city)
    .bind(body.departure_at)
    .bind(body.arrival_at)
    .bind(body.base_fare)
    .fetch_one(&state.db)
    .await?;

    state
        .cache
        .del(unfiltered_cache_key(Vertical::Flight))
        .await;
    Ok(Json(json!({ "flight": flight })))
}

pub async fn create_train(
    State(state): State<AppState>,
    Json(body): Json<CreateTrainRequest>,
) -> AppResult<Json<Value>> {
    if body.base_fare <= 0 {
        return Err(AppError::BadRequest("Base fare must be positive".into()));
    }

    let train: Train = sqlx::query_as(
        r#"INSERT INTO trains (id, train_number, name, from_city, to_city, departure_at, base_fare, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, true)
        RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.train_number)
    .bind(&body.name)
    .bind(&body.from_city)
    .bind(&body.to_city)
    .bind(body.departure_at)
    .bind(body.base_fare)
    .fetch_one(&state.db)
    .await?;

    state
        .cache
        .del(unfiltered_cache_key(Vertical::Train))
        .await;
    Ok(Json(json!({ "train": train })))
}

pub async fn create_bus(
    State(state): State<AppState>,
    Json(body): Json<CreateBusRequest>,
) -> AppResult<Json<Value>> {
    if body.base_fare <= 0 {
        return Err(AppError::BadRequest("Base fare must be positive".into()));
    }

    let bus: Bus = sqlx::query_as(
        r#"INSERT INTO buses (id, operator_name, bus_type, from_city, to_city, departure_at, base_fare, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, true)
        RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.operator_name)
    .bind(&body.bus_type)
    .bind(&body.from_city)
    .bind(&body.to_city)
    .bind(body.departure_at)
    .bind(body.base_fare)
    .fetch_one(&state.db)
    .await?;

    state
        .cache
        .del(unfiltered_cache_key(Vertical::Bus))
        .await;
    Ok(Json(json!({ "bus": bus })))
}

fn catalog_table(vertical: Vertical) -> &'static str {
    match vertical {
        Vertical::Hotel => "hotels",
        Vertical::Flight => "flights",
        Vertical::Train => "trains",
        Vertical::Bus => "buses",
    }
}

/// Cached unfiltered listing for a vertical. Filtered variants are keyed by
/// their filter values and simply age out with the TTL.
fn unfiltered_cache_key(vertical: Vertical) -> &'static str {
    match vertical {
        Vertical::Hotel => "catalog:hotels:all",
        Vertical::Flight => "catalog:flights:all:all",
        Vertical::Train => "catalog:trains:all:all",
        Vertical::Bus => "catalog:buses:all:all",
    }
}

pub async fn toggle_catalog_item(
    State(state): State<AppState>,
    Path((vertical, id)): Path<(String, Uuid)>,
) -> AppResult<Json<Value>> {
    let vertical: Vertical = vertical
        .parse()
        .map_err(|e: pricing_engine::UnknownVertical| AppError::BadRequest(e.to_string()))?;
    let table = catalog_table(vertical);

    let is_active: bool = sqlx::query_scalar(&format!(
        "UPDATE {table} SET is_active = NOT is_active WHERE id = $1 RETURNING is_active"
    ))
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Catalog item not found".into()))?;

    state.cache.del(unfiltered_cache_key(vertical)).await;
    Ok(Json(json!({ "id": id, "isActive": is_active })))
}

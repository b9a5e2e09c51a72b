use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::catalog::{Bus, Flight, Hotel, Train};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn list_hotels(
    State(state): State<AppState>,
    Query(q): Query<CityQuery>,
) -> AppResult<Json<Value>> {
    let cache_key = format!("catalog:hotels:{}", q.city.as_deref().unwrap_or("all"));
    if let Some(cached) = state.cache.get_json::<Vec<Hotel>>(&cache_key).await {
        return Ok(Json(json!({ "hotels": cached, "cached": true })));
    }

    let limit = state.config.catalog.page_size as i64;
    let rows: Vec<Hotel> = if let Some(ref city) = q.city {
        sqlx::query_as(
            "SELECT * FROM hotels WHERE is_active = true AND city ILIKE $1 ORDER BY price_per_night LIMIT $2",
        )
        .bind(city)
        .bind(limit)
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as("SELECT * FROM hotels WHERE is_active = true ORDER BY price_per_night LIMIT $1")
            .bind(limit)
            .fetch_all(&state.db)
            .await?
    };

    state
        .cache
        .set_json(&cache_key, &rows, state.config.catalog.cache_seconds as u64)
        .await;

    Ok(Json(json!({ "hotels": rows })))
}

pub async fn list_flights(
    State(state): State<AppState>,
    Query(q): Query<RouteQuery>,
) -> AppResult<Json<Value>> {
    let cache_key = format!(
        "catalog:flights:{}:{}",
        q.from.as_deref().unwrap_or("all"),
        q.to.as_deref().unwrap_or("all")
    );
    if let Some(cached) = state.cache.get_json::<Vec<Flight>>(&cache_key).await {
        return Ok(Json(json!({ "flights": cached, "cached": true })));
    }

    let rows: Vec<Flight> = sqlx::query_as(
        r#"SELECT * FROM flights WHERE is_active = true
        AND ($1::text IS NULL OR from_city ILIKE $1)
        AND ($2::text IS NULL OR to_city ILIKE $2)
        ORDER BY departure_at LIMIT $3"#,
    )
    .bind(&q.from)
    .bind(&q.to)
    .bind(state.config.catalog.page_size as i64)
    .fetch_all(&state.db)
    .await?;

    state
        .cache
        .set_json(&cache_key, &rows, state.config.catalog.cache_seconds as u64)
        .await;

    Ok(Json(json!({ "flights": rows })))
}

pub async fn list_trains(
    State(state): State<AppState>,
    Query(q): Query<RouteQuery>,
) -> AppResult<Json<Value>> {
    let cache_key = format!(
        "catalog:trains:{}:{}",
        q.from.as_deref().unwrap_or("all"),
        q.to.as_deref().unwrap_or("all")
    );
    if let Some(cached) = state.cache.get_json::<Vec<Train>>(&cache_key).await {
        return Ok(Json(json!({ "trains": cached, "cached": true })));
    }

    let rows: Vec<Train> = sqlx::query_as(
        r#"SELECT * FROM trains WHERE is_active = true
        AND ($1::text IS NULL OR from_city ILIKE $1)
        AND ($2::text IS NULL OR to_city ILIKE $2)
        ORDER BY departure_at LIMIT $3"#,
    )
    .bind(&q.from)
    .bind(&q.to)
    .bind(state.config.catalog.page_size as i64)
    .fetch_all(&state.db)
    .await?;

    state
        .cache
        .set_json(&cache_key, &rows, state.config.catalog.cache_seconds as u64)
        .await;

    Ok(Json(json!({ "trains": rows })))
}

pub async fn list_buses(
    State(state): State<AppState>,
    Query(q): Query<RouteQuery>,
) -> AppResult<Json<Value>> {
    let cache_key = format!(
        "catalog:buses:{}:{}",
        q.from.as_deref().unwrap_or("all"),
        q.to.as_deref().unwrap_or("all")
    );
    if let Some(cached) = state.cache.get_json::<Vec<Bus>>(&cache_key).await {
        return Ok(Json(json!({ "buses": cached, "cached": true })));
    }

    let rows: Vec<Bus> = sqlx::query_as(
        r#"SELECT * FROM buses WHERE is_active = true
        AND ($1::text IS NULL OR from_city ILIKE $1)
        AND ($2::text IS NULL OR to_city ILIKE $2)
        ORDER BY departure_at LIMIT $3"#,
    )
    .bind(&q.from)
    .bind(&q.to)
    .bind(state.config.catalog.page_size as i64)
    .fetch_all(&state.db)
    .await?;

    state
        .cache
        .set_json(&cache_key, &rows, state.config.catalog.cache_seconds as u64)
        .await;

    Ok(Json(json!({ "buses": rows })))
}

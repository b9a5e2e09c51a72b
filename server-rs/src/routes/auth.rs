use axum::{extract::State, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{generate_tokens, verify_token};
use crate::models::user::*;
use crate::services::ledger;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<Value>> {
    if body.email.is_empty() || body.password.len() < 6 {
        return Err(AppError::BadRequest(
            "Email required and password must be at least 6 characters".into(),
        ));
    }

    // Check email uniqueness
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(&body.email)
        .fetch_one(&state.db)
        .await?;

    if exists {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash =
        bcrypt::hash(&body.password, 12).map_err(|e| AppError::Internal(e.to_string()))?;

    let user: User = sqlx::query_as(
        r#"INSERT INTO users (id, email, password_hash, full_name, phone, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.email)
    .bind(&password_hash)
    .bind(&body.full_name)
    .bind(&body.phone)
    .fetch_one(&state.db)
    .await?;

    // Seed the loyalty wallet so new users can try redemption right away.
    let mut balance = 0;
    if state.config.coins.welcome_bonus > 0 {
        balance = ledger::earn(
            &state.db,
            user.id,
            state.config.coins.welcome_bonus,
            "signup_bonus",
            None,
        )
        .await?;
    }

    let (token, refresh_token) = generate_tokens(
        user.id,
        None,
        &state.config.jwt.secret,
        state.config.jwt.access_expiry_secs,
        state.config.jwt.refresh_expiry_secs,
    )?;

    Ok(Json(json!({
        "token": token,
        "refreshToken": refresh_token,
        "user": UserPublic::from(&user),
        "coinBalance": balance,
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    let valid =
        bcrypt::verify(&body.password, hash).map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    // Update last login
    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    let balance = ledger::balance(&state.db, user.id).await?;

    let (token, refresh_token) = generate_tokens(
        user.id,
        user.role.as_deref(),
        &state.config.jwt.secret,
        state.config.jwt.access_expiry_secs,
        state.config.jwt.refresh_expiry_secs,
    )?;

    Ok(Json(json!({
        "token": token,
        "refreshToken": refresh_token,
        "user": UserPublic::from(&user),
        "coinBalance": balance,
    })))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let token = body["refreshToken"]
        .as_str()
        .ok_or_else(|| AppError::BadRequest("refreshToken required".into()))?;

    let claims = verify_token(token, &state.config.jwt.secret)?;
    if claims.token_type.as_deref() != Some("refresh") {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    }

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

    let (new_token, new_refresh) = generate_tokens(
        user_id,
        claims.role.as_deref(),
        &state.config.jwt.secret,
        state.config.jwt.access_expiry_secs,
        state.config.jwt.refresh_expiry_secs,
    )?;

    Ok(Json(json!({
        "token": new_token,
        "refreshToken": new_refresh,
    })))
}

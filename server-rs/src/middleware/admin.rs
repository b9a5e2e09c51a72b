use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::AppState;

async fn check_admin_role(state: &AppState, user_id: Uuid) -> Result<String, AppError> {
    let role = sqlx::query_scalar::<_, Option<String>>("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .flatten()
        .unwrap_or_default();

    if role != "admin" {
        return Err(AppError::Forbidden("Requires admin role".into()));
    }
    Ok(role)
}

/// Middleware: requires the admin role. Layer after `authenticate`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    let role = check_admin_role(&state, user.id).await?;
    req.extensions_mut().insert(AuthUser {
        id: user.id,
        role: Some(role),
    });

    Ok(next.run(req).await)
}

// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

// GET /api/me
// Identidade do token + loja vinculada (se já existir).
pub async fn get_me(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let me = app_state.tenant_service.profile(user.0).await?;

    Ok((StatusCode::OK, Json(me)))
}

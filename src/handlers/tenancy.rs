// src/handlers/tenancy.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::tenancy::CreateTenantPayload,
};

// POST /api/tenants
// Primeiro acesso: cria a loja e torna o usuário o seu dono.
pub async fn create_tenant(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tenant = app_state
        .tenant_service
        .create_tenant_for(&user.0, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    config::AppState,
    middleware::tenancy::TenantContext,
    models::settings::UpdateSettingsRequest,
};

// GET /api/settings
pub async fn get_settings(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;

    let settings = app_state.settings_repo.get_settings(&mut *tx, tenant.0).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/settings
pub async fn update_settings(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;

    let updated = app_state
        .settings_repo
        .update_settings(&mut *tx, tenant.0, &payload)
        .await?;
    tx.commit().await?;

    tracing::info!(tenant_id = %tenant.0, "⚙️ Configurações atualizadas");

    Ok((StatusCode::OK, Json(updated)))
}

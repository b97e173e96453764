// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_tenant_tx,
        error::AppError,
        pagination::{ListQuery, Page},
    },
    config::AppState,
    middleware::tenancy::TenantContext,
    models::product::ProductPayload,
};

// POST /api/products
pub async fn create_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let product = app_state.product_repo.create(&mut *tx, tenant.0, &payload).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products?search=&page=&perPage=
pub async fn list_products(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let (items, total) = app_state.product_repo.list(&mut tx, tenant.0, &query).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(Page::new(items, total, &query))))
}

// GET /api/products/{id}
pub async fn get_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let product = app_state
        .product_repo
        .find(&mut *tx, tenant.0, id)
        .await?
        .ok_or_else(|| AppError::not_found("Produto"))?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(product)))
}

// PUT /api/products/{id}
pub async fn update_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let product = app_state
        .product_repo
        .update(&mut *tx, tenant.0, id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Produto"))?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/products/{id}
pub async fn delete_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let deleted = app_state.product_repo.delete(&mut *tx, tenant.0, id).await?;
    if !deleted {
        return Err(AppError::not_found("Produto"));
    }
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

// src/handlers/purchases.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    config::AppState,
    middleware::tenancy::TenantContext,
    models::purchase::{CreatePurchaseBillPayload, PurchaseListQuery},
};

// POST /api/purchase-bills
pub async fn create_purchase_bill(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreatePurchaseBillPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let bill = app_state
        .purchase_service
        .create(&mut tx, tenant.0, &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(bill)))
}

// GET /api/purchase-bills?status=&supplierId=&search=&page=&perPage=
pub async fn list_purchase_bills(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<PurchaseListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let page = app_state.purchase_service.list(&mut tx, tenant.0, &query).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/purchase-bills/{id}
pub async fn get_purchase_bill(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let bill = app_state.purchase_service.get(&mut tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(bill)))
}

// POST /api/purchase-bills/{id}/record
pub async fn record_purchase_bill(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let bill = app_state.purchase_service.record(&mut tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(bill)))
}

// DELETE /api/purchase-bills/{id}
pub async fn delete_purchase_bill(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    app_state.purchase_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

// src/handlers/invoices.rs

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
    models::invoice::{
        CreateInvoicePayload, InvoiceListQuery, InvoicePayload, UpdateInvoiceStatusPayload,
    },
};

// POST /api/invoices
pub async fn create_invoice(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let invoice = app_state
        .invoice_service
        .create(&mut tx, tenant.0, &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

// GET /api/invoices?status=&customerId=&from=&to=&search=&page=&perPage=
pub async fn list_invoices(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<InvoiceListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let page = app_state.invoice_service.list(&mut tx, tenant.0, &query).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/invoices/{id}
pub async fn get_invoice(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let invoice = app_state.invoice_service.get(&mut tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(invoice)))
}

// PUT /api/invoices/{id}
pub async fn update_invoice(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let invoice = app_state
        .invoice_service
        .update(&mut tx, tenant.0, id, &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(invoice)))
}

// PATCH /api/invoices/{id}/status
pub async fn update_invoice_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let invoice = app_state
        .invoice_service
        .change_status(&mut tx, tenant.0, id, &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(invoice)))
}

// DELETE /api/invoices/{id}
pub async fn delete_invoice(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    app_state.invoice_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

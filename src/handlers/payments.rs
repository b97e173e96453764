// src/handlers/payments.rs

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
    models::payment::{PaymentListQuery, RecordPaymentPayload},
};

// POST /api/payments
pub async fn record_payment(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<RecordPaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let payment = app_state
        .payment_service
        .record(&mut tx, tenant.0, &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/payments?invoiceId=&purchaseBillId=&from=&to=&page=&perPage=
pub async fn list_payments(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<PaymentListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let page = app_state.payment_service.list(&mut tx, tenant.0, &query).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(page)))
}

// DELETE /api/payments/{id}
pub async fn delete_payment(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    app_state.payment_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

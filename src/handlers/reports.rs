// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    config::AppState,
    middleware::tenancy::TenantContext,
    models::report::ReportQuery,
};

// GET /api/reports/summary?from=&to=
pub async fn get_summary(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let summary = app_state.report_service.summary(&mut tx, tenant.0, &query).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/reports/daily-sales?from=&to=
pub async fn get_daily_sales(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let data = app_state.report_service.daily_sales(&mut tx, tenant.0, &query).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(data)))
}

// GET /api/reports/top-products?from=&to=&limit=
pub async fn get_top_products(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let data = app_state.report_service.top_products(&mut tx, tenant.0, &query).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(data)))
}

// GET /api/reports/low-stock
pub async fn get_low_stock(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let data = app_state.report_service.low_stock(&mut tx, tenant.0).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(data)))
}

// GET /api/reports/receivables?from=&to=
pub async fn get_receivables(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant).await?;
    let data = app_state.report_service.receivables(&mut tx, tenant.0, &query).await?;
    tx.commit().await?;

    Ok((StatusCode::OK, Json(data)))
}

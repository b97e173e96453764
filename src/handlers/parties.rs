// src/handlers/parties.rs
// Clientes e fornecedores: mesmas operações, tabelas diferentes.

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
    models::party::{Party, PartyKind, PartyPayload},
};

async fn create(
    app_state: &AppState,
    tenant: &TenantContext,
    kind: PartyKind,
    payload: &PartyPayload,
) -> Result<Party, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(app_state, tenant).await?;
    let party = app_state.party_repo.create(&mut *tx, kind, tenant.0, payload).await?;
    tx.commit().await?;

    Ok(party)
}

async fn list(
    app_state: &AppState,
    tenant: &TenantContext,
    kind: PartyKind,
    query: &ListQuery,
) -> Result<Page<Party>, AppError> {
    let mut tx = begin_tenant_tx(app_state, tenant).await?;
    let (items, total) = app_state.party_repo.list(&mut tx, kind, tenant.0, query).await?;
    tx.commit().await?;

    Ok(Page::new(items, total, query))
}

async fn get(
    app_state: &AppState,
    tenant: &TenantContext,
    kind: PartyKind,
    id: Uuid,
) -> Result<Party, AppError> {
    let mut tx = begin_tenant_tx(app_state, tenant).await?;
    let party = app_state
        .party_repo
        .find(&mut *tx, kind, tenant.0, id)
        .await?
        .ok_or_else(|| AppError::not_found(kind.label()))?;
    tx.commit().await?;

    Ok(party)
}

async fn update(
    app_state: &AppState,
    tenant: &TenantContext,
    kind: PartyKind,
    id: Uuid,
    payload: &PartyPayload,
) -> Result<Party, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(app_state, tenant).await?;
    let party = app_state
        .party_repo
        .update(&mut *tx, kind, tenant.0, id, payload)
        .await?
        .ok_or_else(|| AppError::not_found(kind.label()))?;
    tx.commit().await?;

    Ok(party)
}

async fn delete(
    app_state: &AppState,
    tenant: &TenantContext,
    kind: PartyKind,
    id: Uuid,
) -> Result<(), AppError> {
    let mut tx = begin_tenant_tx(app_state, tenant).await?;
    let deleted = app_state.party_repo.delete(&mut *tx, kind, tenant.0, id).await?;
    if !deleted {
        return Err(AppError::not_found(kind.label()));
    }
    tx.commit().await?;

    Ok(())
}

// ---
// Clientes (/api/customers)
// ---

pub async fn create_customer(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<PartyPayload>,
) -> Result<impl IntoResponse, AppError> {
    let customer = create(&app_state, &tenant, PartyKind::Customer, &payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = list(&app_state, &tenant, PartyKind::Customer, &query).await?;
    Ok((StatusCode::OK, Json(page)))
}

pub async fn get_customer(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = get(&app_state, &tenant, PartyKind::Customer, id).await?;
    Ok((StatusCode::OK, Json(customer)))
}

pub async fn update_customer(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartyPayload>,
) -> Result<impl IntoResponse, AppError> {
    let customer = update(&app_state, &tenant, PartyKind::Customer, id, &payload).await?;
    Ok((StatusCode::OK, Json(customer)))
}

pub async fn delete_customer(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete(&app_state, &tenant, PartyKind::Customer, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Fornecedores (/api/suppliers)
// ---

pub async fn create_supplier(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<PartyPayload>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = create(&app_state, &tenant, PartyKind::Supplier, &payload).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn list_suppliers(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = list(&app_state, &tenant, PartyKind::Supplier, &query).await?;
    Ok((StatusCode::OK, Json(page)))
}

pub async fn get_supplier(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = get(&app_state, &tenant, PartyKind::Supplier, id).await?;
    Ok((StatusCode::OK, Json(supplier)))
}

pub async fn update_supplier(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartyPayload>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = update(&app_state, &tenant, PartyKind::Supplier, id, &payload).await?;
    Ok((StatusCode::OK, Json(supplier)))
}

pub async fn delete_supplier(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete(&app_state, &tenant, PartyKind::Supplier, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::tenancy::{Tenant, TenantMembership};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a identidade do provedor para a sua loja.
    /// Esta é a verificação de autorização mais importante: sem vínculo, sem dados.
    pub async fn find_membership(
        &self,
        auth_user_id: &str,
    ) -> Result<Option<TenantMembership>, AppError> {
        let membership = sqlx::query_as::<_, TenantMembership>(
            "SELECT auth_user_id, tenant_id, role, created_at FROM tenant_users WHERE auth_user_id = $1",
        )
        .bind(auth_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    pub async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tenant)
    }

    /// Cria um novo tenant (Loja) na base de dados.
    pub async fn create_tenant<'e, E>(&self, executor: E, name: &str) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name) VALUES ($1) RETURNING *",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    /// Vincula a identidade à loja (tabela-ponte).
    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        auth_user_id: &str,
        tenant_id: Uuid,
        role: &str,
    ) -> Result<TenantMembership, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TenantMembership>(
            r#"
            INSERT INTO tenant_users (auth_user_id, tenant_id, role)
            VALUES ($1, $2, $3)
            RETURNING auth_user_id, tenant_id, role, created_at
            "#,
        )
        .bind(auth_user_id)
        .bind(tenant_id)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_db(e, "tenant_users_pkey", "Este usuário já possui uma loja.")
        })
    }
}

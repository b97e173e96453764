use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{TenantSettings, UpdateSettingsRequest, DEFAULT_INVOICE_PREFIX},
};

#[derive(Clone, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    /// Linha padrão criada junto com a loja.
    pub async fn create_default<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        business_name: &str,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, TenantSettings>(
            r#"
            INSERT INTO tenant_settings (tenant_id, business_name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(business_name)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }

    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TenantSettings>("SELECT * FROM tenant_settings WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found("Configuração da loja"))
    }

    pub async fn get_invoice_prefix<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prefix: Option<String> = sqlx::query_scalar(
            "SELECT invoice_prefix FROM tenant_settings WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(prefix.unwrap_or_else(|| DEFAULT_INVOICE_PREFIX.to_string()))
    }

    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update). Moeda e prefixo só mudam quando enviados.
        let settings = sqlx::query_as::<_, TenantSettings>(
            r#"
            INSERT INTO tenant_settings (
                tenant_id, business_name, address, phone, email, tax_id,
                currency, invoice_prefix
            )
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'BRL'), COALESCE($8, 'INV-'))
            ON CONFLICT (tenant_id)
            DO UPDATE SET
                business_name = EXCLUDED.business_name,
                address = EXCLUDED.address,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                tax_id = EXCLUDED.tax_id,
                currency = COALESCE($7, tenant_settings.currency),
                invoice_prefix = COALESCE($8, tenant_settings.invoice_prefix),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.business_name.trim())
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.tax_id)
        .bind(input.currency.as_ref().map(|c| c.to_uppercase()))
        .bind(&input.invoice_prefix)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}

// src/services/tenancy_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{SettingsRepository, TenantRepository},
    models::{
        auth::{Identity, MeResponse},
        tenancy::{Tenant, TenantMembership},
    },
};

pub const OWNER_ROLE: &str = "owner";

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    settings_repo: SettingsRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, settings_repo: SettingsRepository, pool: PgPool) -> Self {
        Self { tenant_repo, settings_repo, pool }
    }

    /// Identidade -> loja. `None` quando o usuário ainda não criou a sua.
    pub async fn resolve(&self, auth_user_id: &str) -> Result<Option<TenantMembership>, AppError> {
        self.tenant_repo.find_membership(auth_user_id).await
    }

    pub async fn profile(&self, identity: Identity) -> Result<MeResponse, AppError> {
        let membership = self.resolve(&identity.user_id).await?;

        let tenant = match &membership {
            Some(m) => self.tenant_repo.find_tenant(m.tenant_id).await?,
            None => None,
        };

        Ok(MeResponse {
            user: identity,
            tenant_id: membership.as_ref().map(|m| m.tenant_id),
            role: membership.map(|m| m.role),
            tenant,
        })
    }

    /// LÓGICA DE NEGÓCIO: Cria a loja, as configurações padrão e o vínculo
    /// de dono de forma atômica. Cada identidade tem no máximo uma loja.
    pub async fn create_tenant_for(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<Tenant, AppError> {
        if self.resolve(&identity.user_id).await?.is_some() {
            return Err(AppError::conflict("Este usuário já possui uma loja."));
        }

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria a loja
        let tenant = self.tenant_repo.create_tenant(&mut *tx, name.trim()).await?;

        // 3. As policies de RLS exigem o tenant da transação para gravar as configurações
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(tenant.id.to_string())
            .execute(&mut *tx)
            .await?;

        self.settings_repo
            .create_default(&mut *tx, tenant.id, &tenant.name)
            .await?;

        // 4. Vincula o usuário como dono (a PK em auth_user_id barra corridas)
        self.tenant_repo
            .add_member(&mut *tx, &identity.user_id, tenant.id, OWNER_ROLE)
            .await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant.id,
            auth_user_id = %identity.user_id,
            "🏪 Loja criada"
        );

        Ok(tenant)
    }
}

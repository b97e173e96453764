// src/config.rs

use crate::{
    db::{
        InvoiceRepository, PartyRepository, PaymentRepository, ProductRepository,
        PurchaseRepository, ReportRepository, SettingsRepository, TenantRepository,
    },
    services::{
        auth::AuthService, invoice_service::InvoiceService, payment_service::PaymentService,
        purchase_service::PurchaseService, report_service::ReportService,
        tenancy_service::TenantService,
    },
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, net::SocketAddr, time::Duration};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuração lida do ambiente (.env incluso).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = non_empty("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET deve ser definido")?;

        let bind_addr = non_empty("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR inválido (esperado host:porta)")?;

        let max_connections = match non_empty("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .context("DB_MAX_CONNECTIONS deve ser um número inteiro")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_issuer: non_empty("AUTH_ISSUER"),
            jwt_audience: non_empty("AUTH_AUDIENCE"),
            bind_addr,
            max_connections,
            cors_origin: non_empty("CORS_ORIGIN"),
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub settings_repo: SettingsRepository,
    pub product_repo: ProductRepository,
    pub party_repo: PartyRepository,
    pub invoice_service: InvoiceService,
    pub purchase_service: PurchaseService,
    pub payment_service: PaymentService,
    pub report_service: ReportService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: &Config) -> Self {
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new();
        let product_repo = ProductRepository::new();
        let party_repo = PartyRepository::new();
        let invoice_repo = InvoiceRepository::new();
        let purchase_repo = PurchaseRepository::new();
        let payment_repo = PaymentRepository::new();

        let auth_service = AuthService::new(
            config.jwt_secret.clone(),
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
        );
        let tenant_service = TenantService::new(tenant_repo, settings_repo.clone(), db_pool.clone());
        let invoice_service = InvoiceService::new(
            invoice_repo.clone(),
            party_repo.clone(),
            product_repo.clone(),
            settings_repo.clone(),
            payment_repo.clone(),
        );
        let purchase_service = PurchaseService::new(
            purchase_repo.clone(),
            party_repo.clone(),
            product_repo.clone(),
            payment_repo.clone(),
        );
        let payment_service = PaymentService::new(payment_repo, invoice_repo, purchase_repo);
        let report_service = ReportService::new(ReportRepository::new());

        Self {
            db_pool,
            auth_service,
            tenant_service,
            settings_repo,
            product_repo,
            party_repo,
            invoice_service,
            purchase_service,
            payment_service,
            report_service,
        }
    }
}

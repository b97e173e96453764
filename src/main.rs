//src/main.rs

use anyhow::Context;
use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::middleware::auth::{auth_guard, tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, info para a aplicação e só avisos do sqlx.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env().context("Falha ao carregar a configuração")?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = app(app_state, cors_layer(config.cors_origin.as_deref())?);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .context("Falha ao iniciar o listener TCP")?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

/// Sem CORS_ORIGIN configurado, qualquer origem é aceita (ambiente de desenvolvimento).
fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    Ok(match origin {
        Some(origin) => layer.allow_origin(
            origin
                .parse::<HeaderValue>()
                .context("CORS_ORIGIN inválido")?,
        ),
        None => layer.allow_origin(Any),
    })
}

fn app(app_state: AppState, cors: CorsLayer) -> Router {
    // Rotas que só exigem identidade (a loja pode ainda não existir)
    let identity_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/tenants", post(handlers::tenancy::create_tenant))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas de dados da loja: identidade + tenant resolvido
    let tenant_routes = Router::new()
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        // Produtos
        .route(
            "/products",
            post(handlers::products::create_product).get(handlers::products::list_products),
        )
        .route(
            "/products/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        // Clientes
        .route(
            "/customers",
            post(handlers::parties::create_customer).get(handlers::parties::list_customers),
        )
        .route(
            "/customers/{id}",
            get(handlers::parties::get_customer)
                .put(handlers::parties::update_customer)
                .delete(handlers::parties::delete_customer),
        )
        // Fornecedores
        .route(
            "/suppliers",
            post(handlers::parties::create_supplier).get(handlers::parties::list_suppliers),
        )
        .route(
            "/suppliers/{id}",
            get(handlers::parties::get_supplier)
                .put(handlers::parties::update_supplier)
                .delete(handlers::parties::delete_supplier),
        )
        // Faturas
        .route(
            "/invoices",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route(
            "/invoices/{id}",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .route(
            "/invoices/{id}/status",
            patch(handlers::invoices::update_invoice_status),
        )
        // Notas de compra
        .route(
            "/purchase-bills",
            post(handlers::purchases::create_purchase_bill)
                .get(handlers::purchases::list_purchase_bills),
        )
        .route(
            "/purchase-bills/{id}",
            get(handlers::purchases::get_purchase_bill)
                .delete(handlers::purchases::delete_purchase_bill),
        )
        .route(
            "/purchase-bills/{id}/record",
            post(handlers::purchases::record_purchase_bill),
        )
        // Pagamentos
        .route(
            "/payments",
            post(handlers::payments::record_payment).get(handlers::payments::list_payments),
        )
        .route("/payments/{id}", axum::routing::delete(handlers::payments::delete_payment))
        // Relatórios
        .route("/reports/summary", get(handlers::reports::get_summary))
        .route("/reports/daily-sales", get(handlers::reports::get_daily_sales))
        .route("/reports/top-products", get(handlers::reports::get_top_products))
        .route("/reports/low-stock", get(handlers::reports::get_low_stock))
        .route("/reports/receivables", get(handlers::reports::get_receivables))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", identity_routes.merge(tenant_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

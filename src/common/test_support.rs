// Helpers dos testes que rodam contra um Postgres de verdade (`#[sqlx::test]`).

use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    config::{AppState, Config},
    middleware::tenancy::TenantContext,
    models::{
        auth::Identity,
        invoice::{CreateInvoicePayload, InvoiceDetail},
        party::{Party, PartyKind, PartyPayload},
        product::{Product, ProductPayload},
    },
};

/// Uma loja recém-criada e o estado da aplicação apontando para o banco do teste.
pub(crate) struct Shop {
    pub state: AppState,
    pub tenant: TenantContext,
}

pub(crate) fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub(crate) async fn open_shop(pool: PgPool, user_id: &str) -> Shop {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://gerenciada-pelo-sqlx-test".to_string()),
        "AUTH_JWT_SECRET" => Some("segredo-de-teste".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::with_pool(pool, &config);

    let identity = Identity { user_id: user_id.to_string(), email: None };
    let tenant = state
        .tenant_service
        .create_tenant_for(&identity, "Mercadinho Teste")
        .await
        .unwrap();

    Shop { state, tenant: TenantContext(tenant.id) }
}

impl Shop {
    pub fn id(&self) -> Uuid {
        self.tenant.0
    }

    pub async fn tx(&self) -> Transaction<'static, Postgres> {
        begin_tenant_tx(&self.state, &self.tenant).await.unwrap()
    }

    pub async fn product(&self, name: &str, sale_price: &str, stock: &str) -> Product {
        let payload: ProductPayload = serde_json::from_value(json!({
            "name": name,
            "salePrice": d(sale_price),
            "purchasePrice": 1,
            "stockQuantity": d(stock),
        }))
        .unwrap();

        let mut tx = self.tx().await;
        let product = self.state.product_repo.create(&mut *tx, self.id(), &payload).await.unwrap();
        tx.commit().await.unwrap();
        product
    }

    pub async fn find_product(&self, id: Uuid) -> Product {
        let mut tx = self.tx().await;
        let product = self.state.product_repo.find(&mut *tx, self.id(), id).await.unwrap().unwrap();
        tx.commit().await.unwrap();
        product
    }

    pub async fn party(&self, kind: PartyKind, name: &str) -> Party {
        let payload: PartyPayload = serde_json::from_value(json!({ "name": name })).unwrap();

        let mut tx = self.tx().await;
        let party = self.state.party_repo.create(&mut *tx, kind, self.id(), &payload).await.unwrap();
        tx.commit().await.unwrap();
        party
    }

    /// Cria e confirma a fatura; devolve o erro sem confirmar nada.
    pub async fn create_invoice(&self, body: Value) -> Result<InvoiceDetail, AppError> {
        let payload: CreateInvoicePayload = serde_json::from_value(body).unwrap();

        let mut tx = self.tx().await;
        let detail = self.state.invoice_service.create(&mut tx, self.id(), &payload).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn invoice_count(&self) -> i64 {
        let mut tx = self.tx().await;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE tenant_id = $1")
            .bind(self.id())
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        count
    }
}

/// Uma linha de fatura com `quantity` unidades do produto, sem imposto.
pub(crate) fn line(product: &Product, quantity: &str) -> Value {
    json!({
        "productId": product.id,
        "description": product.name,
        "quantity": d(quantity),
        "unitPrice": product.sale_price,
    })
}

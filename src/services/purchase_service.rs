// src/services/purchase_service.rs

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Page},
    db::{PartyRepository, PaymentRepository, ProductRepository, PurchaseRepository},
    models::{
        party::PartyKind,
        purchase::{
            aggregate_stock_increments, price_purchase_lines, CreatePurchaseBillPayload,
            PurchaseBill, PurchaseBillDetail, PurchaseBillStatus, PurchaseListQuery,
        },
    },
};

#[derive(Clone)]
pub struct PurchaseService {
    purchase_repo: PurchaseRepository,
    party_repo: PartyRepository,
    product_repo: ProductRepository,
    payment_repo: PaymentRepository,
}

impl PurchaseService {
    pub fn new(
        purchase_repo: PurchaseRepository,
        party_repo: PartyRepository,
        product_repo: ProductRepository,
        payment_repo: PaymentRepository,
    ) -> Self {
        Self { purchase_repo, party_repo, product_repo, payment_repo }
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: &CreatePurchaseBillPayload,
    ) -> Result<PurchaseBillDetail, AppError> {
        let mut tx = conn.begin().await?;

        let supplier_ok = self
            .party_repo
            .exists(&mut *tx, PartyKind::Supplier, tenant_id, payload.supplier_id)
            .await?;
        if !supplier_ok {
            return Err(AppError::not_found(PartyKind::Supplier.label()));
        }

        let product_ids: Vec<Uuid> = payload
            .items
            .iter()
            .map(|line| line.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let owned = self
            .product_repo
            .count_owned(&mut *tx, tenant_id, &product_ids)
            .await?;
        if owned != product_ids.len() as i64 {
            return Err(AppError::not_found("Produto"));
        }

        let (line_totals, total) = price_purchase_lines(&payload.items).ok_or_else(|| {
            AppError::bad_request("Os valores da nota excedem o limite permitido.")
        })?;
        let bill_date = payload.bill_date.unwrap_or_else(|| Utc::now().date_naive());

        let bill_id = self
            .purchase_repo
            .insert_header(&mut *tx, tenant_id, payload, bill_date, total)
            .await?;
        self.purchase_repo
            .insert_items(&mut tx, tenant_id, bill_id, payload, &line_totals)
            .await?;

        let detail = self.load_detail(&mut tx, tenant_id, bill_id).await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, bill_id = %bill_id, total = %total, "📥 Nota de compra criada");

        Ok(detail)
    }

    /// LÓGICA DE NEGÓCIO: lança a nota no estoque.
    /// 1. "Reivindica" a nota (pending -> recorded); só uma requisição vence.
    /// 2. Agrega as linhas por produto (soma quantidades, último custo vence).
    /// 3. Atualiza estoque e custo de compra em ordem crescente de id.
    /// Qualquer falha desfaz tudo, inclusive a mudança de status.
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<PurchaseBillDetail, AppError> {
        let mut tx = conn.begin().await?;

        let claimed = self
            .purchase_repo
            .claim_for_record(&mut *tx, tenant_id, bill_id)
            .await?;

        if claimed.is_none() {
            return match self.purchase_repo.find(&mut *tx, tenant_id, bill_id).await? {
                Some(_) => Err(AppError::conflict("Esta nota de compra já foi lançada.")),
                None => Err(AppError::not_found("Nota de compra")),
            };
        }

        let items = self.purchase_repo.items(&mut *tx, tenant_id, bill_id).await?;
        let increments = aggregate_stock_increments(&items);

        for inc in &increments {
            let applied = self
                .product_repo
                .apply_stock_increment(&mut *tx, tenant_id, inc.product_id, inc.quantity, inc.last_cost)
                .await?;
            if !applied {
                return Err(AppError::not_found("Produto"));
            }
        }

        let header = self
            .purchase_repo
            .find(&mut *tx, tenant_id, bill_id)
            .await?
            .ok_or_else(|| AppError::not_found("Nota de compra"))?;

        tx.commit().await?;

        tracing::info!(
            %tenant_id,
            bill_id = %bill_id,
            products = increments.len(),
            "📦 Nota de compra lançada no estoque"
        );

        Ok(PurchaseBillDetail { header, items })
    }

    /// Apenas notas pendentes e sem pagamentos podem ser excluídas.
    pub async fn delete(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = conn.begin().await?;

        let bill = self
            .purchase_repo
            .find_for_update(&mut *tx, tenant_id, bill_id)
            .await?
            .ok_or_else(|| AppError::not_found("Nota de compra"))?;

        if bill.status == PurchaseBillStatus::Recorded {
            return Err(AppError::conflict(
                "Notas já lançadas no estoque não podem ser excluídas.",
            ));
        }

        let payments = self
            .payment_repo
            .count_for_bill(&mut *tx, tenant_id, bill_id)
            .await?;
        if payments > 0 {
            return Err(AppError::conflict(
                "A nota possui pagamentos. Remova-os antes de excluir.",
            ));
        }

        self.purchase_repo.delete(&mut *tx, tenant_id, bill_id).await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, bill_id = %bill_id, "🗑️ Nota de compra excluída");
        Ok(())
    }

    pub async fn get(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<PurchaseBillDetail, AppError> {
        self.load_detail(conn, tenant_id, bill_id).await
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &PurchaseListQuery,
    ) -> Result<Page<PurchaseBill>, AppError> {
        let (items, total) = self.purchase_repo.list(conn, tenant_id, filter).await?;
        Ok(Page::new(items, total, &filter.list_query()))
    }

    async fn load_detail(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<PurchaseBillDetail, AppError> {
        let header = self
            .purchase_repo
            .find(&mut *conn, tenant_id, bill_id)
            .await?
            .ok_or_else(|| AppError::not_found("Nota de compra"))?;
        let items = self.purchase_repo.items(&mut *conn, tenant_id, bill_id).await?;

        Ok(PurchaseBillDetail { header, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::{d, open_shop, Shop};
    use serde_json::{json, Value};
    use sqlx::PgPool;

    async fn create_bill(shop: &Shop, items: Value) -> Result<PurchaseBillDetail, AppError> {
        let supplier = shop.party(PartyKind::Supplier, "Atacadão Sul").await;
        let payload: CreatePurchaseBillPayload =
            serde_json::from_value(json!({ "supplierId": supplier.id, "items": items })).unwrap();

        let mut tx = shop.tx().await;
        let detail = shop.state.purchase_service.create(&mut tx, shop.id(), &payload).await?;
        tx.commit().await?;
        Ok(detail)
    }

    async fn record(shop: &Shop, bill_id: Uuid) -> Result<PurchaseBillDetail, AppError> {
        let mut tx = shop.tx().await;
        let detail = shop.state.purchase_service.record(&mut tx, shop.id(), bill_id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    #[sqlx::test]
    async fn recording_moves_stock_once(pool: PgPool) {
        let shop = open_shop(pool, "user_estoque").await;
        let oleo = shop.product("Óleo de soja", "7.99", "5").await;
        let sal = shop.product("Sal 1kg", "2.49", "0").await;

        let bill = create_bill(
            &shop,
            json!([
                { "productId": oleo.id, "quantity": 2, "unitCost": 5.10 },
                { "productId": sal.id, "quantity": 12, "unitCost": 1.2 },
                { "productId": oleo.id, "quantity": 1, "unitCost": 5.35 },
            ]),
        )
        .await
        .unwrap();
        assert_eq!(bill.header.status, PurchaseBillStatus::Pending);
        assert_eq!(bill.header.total, d("29.95"));

        // Pendente: estoque ainda não mudou
        assert_eq!(shop.find_product(oleo.id).await.stock_quantity, d("5"));

        let recorded = record(&shop, bill.header.id).await.unwrap();
        assert_eq!(recorded.header.status, PurchaseBillStatus::Recorded);
        assert!(recorded.header.recorded_at.is_some());

        let oleo_after = shop.find_product(oleo.id).await;
        assert_eq!(oleo_after.stock_quantity, d("8"));
        assert_eq!(oleo_after.purchase_price, d("5.35"));
        assert_eq!(shop.find_product(sal.id).await.stock_quantity, d("12"));

        let err = record(&shop, bill.header.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(shop.find_product(oleo.id).await.stock_quantity, d("8"));

        let mut tx = shop.tx().await;
        let err = shop.state.purchase_service.delete(&mut tx, shop.id(), bill.header.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[sqlx::test]
    async fn unknown_bills_and_products_are_404(pool: PgPool) {
        let shop = open_shop(pool, "user_nota_invalida").await;

        let err = record(&shop, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));

        let err = create_bill(&shop, json!([{ "productId": Uuid::new_v4(), "quantity": 1, "unitCost": 1 }]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }
}

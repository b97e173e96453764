// src/services/report_service.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ReportRepository,
    models::report::{
        CustomerReceivable, DailySalesEntry, LowStockEntry, ReportQuery, ReportSummary,
        TopProductEntry,
    },
};

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository) -> Self {
        Self { repo }
    }

    pub async fn summary(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        query: &ReportQuery,
    ) -> Result<ReportSummary, AppError> {
        check_range(query)?;
        self.repo.summary(conn, tenant_id, query).await
    }

    pub async fn daily_sales(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        query: &ReportQuery,
    ) -> Result<Vec<DailySalesEntry>, AppError> {
        check_range(query)?;
        self.repo.daily_sales(conn, tenant_id, query).await
    }

    pub async fn top_products(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        query: &ReportQuery,
    ) -> Result<Vec<TopProductEntry>, AppError> {
        check_range(query)?;
        self.repo.top_products(conn, tenant_id, query).await
    }

    pub async fn low_stock(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
    ) -> Result<Vec<LowStockEntry>, AppError> {
        self.repo.low_stock(conn, tenant_id).await
    }

    pub async fn receivables(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        query: &ReportQuery,
    ) -> Result<Vec<CustomerReceivable>, AppError> {
        check_range(query)?;
        self.repo.receivables_by_customer(conn, tenant_id, query).await
    }
}

fn check_range(query: &ReportQuery) -> Result<(), AppError> {
    if !query.has_valid_range() {
        return Err(AppError::bad_request(
            "A data inicial não pode ser posterior à data final.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::{d, line, open_shop};
    use crate::models::party::PartyKind;
    use serde_json::json;
    use sqlx::PgPool;

    #[test]
    fn inverted_range_is_rejected() {
        let query = ReportQuery {
            from: chrono::NaiveDate::from_ymd_opt(2026, 5, 1),
            to: chrono::NaiveDate::from_ymd_opt(2026, 4, 1),
            limit: None,
        };
        assert!(matches!(check_range(&query), Err(AppError::BadRequest(_))));
    }

    #[sqlx::test]
    async fn receivables_list_every_customer_with_a_balance(pool: PgPool) {
        let shop = open_shop(pool, "user_relatorios").await;
        let produto = shop.product("Refrigerante 2L", "9.00", "100").await;

        // Mais clientes que o limite padrão do ranking de produtos
        for i in 1..=12 {
            let cliente = shop.party(PartyKind::Customer, &format!("Cliente {i:02}")).await;
            shop.create_invoice(json!({
                "customerId": cliente.id,
                "status": "sent",
                "items": [line(&produto, &i.to_string())],
            }))
            .await
            .unwrap();
        }

        let mut tx = shop.tx().await;
        let query = ReportQuery::default();
        let rows = shop.state.report_service.receivables(&mut tx, shop.id(), &query).await.unwrap();
        let summary = shop.state.report_service.summary(&mut tx, shop.id(), &query).await.unwrap();

        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].outstanding, d("108.00"));
        let listed: rust_decimal::Decimal = rows.iter().map(|r| r.outstanding).sum();
        assert_eq!(listed, summary.receivables_outstanding);
    }
}

// src/db/report_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::report::{
        CustomerReceivable, DailySalesEntry, LowStockEntry, ReportQuery, ReportSummary,
        TopProductEntry,
    },
};

// Rascunhos não contam como venda. $2/$3 = período opcional (inclusivo).
const SALES_SCOPE: &str = r#"
    i.tenant_id = $1
    AND i.status <> 'draft'
    AND ($2::date IS NULL OR i.issue_date >= $2)
    AND ($3::date IS NULL OR i.issue_date <= $3)
"#;

#[derive(Clone, Default)]
pub struct ReportRepository;

impl ReportRepository {
    pub fn new() -> Self {
        Self
    }

    // 1. Resumo
    // Uma única instrução: todos os cards saem do mesmo snapshot.
    pub async fn summary<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        query: &ReportQuery,
    ) -> Result<ReportSummary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH sales AS (
                SELECT
                    COUNT(*) AS invoice_count,
                    COALESCE(SUM(i.total), 0) AS sales_total,
                    COALESCE(SUM(i.tax_total), 0) AS tax_collected,
                    COALESCE(SUM(i.total - i.amount_paid), 0) AS receivables_outstanding
                FROM invoices i
                WHERE {SALES_SCOPE}
            ),
            received AS (
                SELECT COALESCE(SUM(amount), 0) AS amount_received
                FROM payments
                WHERE tenant_id = $1
                  AND invoice_id IS NOT NULL
                  AND ($2::date IS NULL OR payment_date >= $2)
                  AND ($3::date IS NULL OR payment_date <= $3)
            ),
            purchases AS (
                SELECT
                    COALESCE(SUM(total), 0) AS purchase_total,
                    COALESCE(SUM(total - amount_paid), 0) AS payables_outstanding
                FROM purchase_bills
                WHERE tenant_id = $1
                  AND ($2::date IS NULL OR bill_date >= $2)
                  AND ($3::date IS NULL OR bill_date <= $3)
            ),
            stock AS (
                SELECT COUNT(*) AS low_stock_count
                FROM products
                WHERE tenant_id = $1 AND stock_quantity <= low_stock_threshold
            )
            SELECT
                sales.invoice_count, sales.sales_total, sales.tax_collected,
                received.amount_received, sales.receivables_outstanding,
                purchases.purchase_total, purchases.payables_outstanding,
                stock.low_stock_count
            FROM sales, received, purchases, stock
            "#
        );

        let summary = sqlx::query_as::<_, ReportSummary>(&sql)
            .bind(tenant_id)
            .bind(query.from)
            .bind(query.to)
            .fetch_one(executor)
            .await?;

        Ok(summary)
    }

    // 2. Vendas por dia
    pub async fn daily_sales<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        query: &ReportQuery,
    ) -> Result<Vec<DailySalesEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT
                i.issue_date AS date,
                COUNT(*) AS invoice_count,
                COALESCE(SUM(i.total), 0) AS total
            FROM invoices i
            WHERE {SALES_SCOPE}
            GROUP BY i.issue_date
            ORDER BY i.issue_date ASC
            "#
        );

        let data = sqlx::query_as::<_, DailySalesEntry>(&sql)
            .bind(tenant_id)
            .bind(query.from)
            .bind(query.to)
            .fetch_all(executor)
            .await?;

        Ok(data)
    }

    // 3. Top produtos por receita (valor líquido, sem imposto)
    pub async fn top_products<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        query: &ReportQuery,
    ) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                SUM(ii.quantity) AS total_quantity,
                SUM(ii.net_amount) AS total_revenue
            FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            JOIN products p ON p.id = ii.product_id
            WHERE {SALES_SCOPE}
            GROUP BY p.id, p.name
            ORDER BY total_revenue DESC, p.name ASC
            LIMIT $4
            "#
        );

        let data = sqlx::query_as::<_, TopProductEntry>(&sql)
            .bind(tenant_id)
            .bind(query.from)
            .bind(query.to)
            .bind(query.limit())
            .fetch_all(executor)
            .await?;

        Ok(data)
    }

    // 4. Estoque baixo
    pub async fn low_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<LowStockEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let data = sqlx::query_as::<_, LowStockEntry>(
            r#"
            SELECT
                id AS product_id,
                name AS product_name,
                sku,
                stock_quantity,
                low_stock_threshold
            FROM products
            WHERE tenant_id = $1 AND stock_quantity <= low_stock_threshold
            ORDER BY (stock_quantity - low_stock_threshold) ASC, name ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(data)
    }

    // 5. A receber por cliente (faturas sem cliente ficam agrupadas em `null`).
    // Sem LIMIT: a lista precisa fechar com o total a receber do resumo.
    pub async fn receivables_by_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        query: &ReportQuery,
    ) -> Result<Vec<CustomerReceivable>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT
                i.customer_id,
                c.name AS customer_name,
                COUNT(*) AS invoice_count,
                SUM(i.total - i.amount_paid) AS outstanding
            FROM invoices i
            LEFT JOIN customers c ON c.id = i.customer_id
            WHERE {SALES_SCOPE}
              AND i.total > i.amount_paid
            GROUP BY i.customer_id, c.name
            ORDER BY outstanding DESC
            "#
        );

        let data = sqlx::query_as::<_, CustomerReceivable>(&sql)
            .bind(tenant_id)
            .bind(query.from)
            .bind(query.to)
            .fetch_all(executor)
            .await?;

        Ok(data)
    }
}

// src/db/purchase_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::purchase::{
        CreatePurchaseBillPayload, PurchaseBill, PurchaseBillItem, PurchaseListQuery,
    },
};

const BILL_SELECT: &str = r#"
    SELECT
        b.id, b.tenant_id, b.supplier_id,
        s.name AS supplier_name,
        b.bill_number, b.bill_date, b.status, b.notes,
        b.total, b.amount_paid,
        (b.total - b.amount_paid) AS balance_due,
        b.recorded_at, b.created_at, b.updated_at
    FROM purchase_bills b
    JOIN suppliers s ON s.id = b.supplier_id
"#;

const BILL_FILTER: &str = r#"
    WHERE b.tenant_id = $1
      AND ($2::purchase_bill_status IS NULL OR b.status = $2)
      AND ($3::uuid IS NULL OR b.supplier_id = $3)
      AND ($4::text IS NULL OR b.bill_number ILIKE $4 OR s.name ILIKE $4)
"#;

#[derive(Clone, Default)]
pub struct PurchaseRepository;

impl PurchaseRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Escrita
    // ---

    pub async fn insert_header<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreatePurchaseBillPayload,
        bill_date: NaiveDate,
        total: Decimal,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO purchase_bills (tenant_id, supplier_id, bill_number, bill_date, notes, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(payload.supplier_id)
        .bind(payload.bill_number.as_deref().map(str::trim))
        .bind(bill_date)
        .bind(&payload.notes)
        .bind(total)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    pub async fn insert_items(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        bill_id: Uuid,
        payload: &CreatePurchaseBillPayload,
        line_totals: &[Decimal],
    ) -> Result<(), AppError> {
        for (idx, (line, line_total)) in payload.items.iter().zip(line_totals).enumerate() {
            sqlx::query(
                r#"
                INSERT INTO purchase_bill_items (
                    tenant_id, purchase_bill_id, position, product_id, quantity, unit_cost, line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(tenant_id)
            .bind(bill_id)
            .bind(idx as i32 + 1)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_cost)
            .bind(*line_total)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Marca a nota como lançada somente se ainda estiver pendente.
    /// `None` significa que outra requisição chegou antes (ou a nota não existe).
    pub async fn claim_for_record<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let claimed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE purchase_bills
            SET status = 'recorded', recorded_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'pending'
            RETURNING id
            "#,
        )
        .bind(bill_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(claimed)
    }

    pub async fn set_amount_paid<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        bill_id: Uuid,
        amount_paid: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE purchase_bills SET amount_paid = $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(bill_id)
        .bind(tenant_id)
        .bind(amount_paid)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn delete<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM purchase_bills WHERE id = $1 AND tenant_id = $2")
            .bind(bill_id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(AppError::in_use)?;

        Ok(result.rows_affected() > 0)
    }

    // ---
    // Leitura
    // ---

    pub async fn find<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<Option<PurchaseBill>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{BILL_SELECT} WHERE b.id = $1 AND b.tenant_id = $2");

        let bill = sqlx::query_as::<_, PurchaseBill>(&sql)
            .bind(bill_id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(bill)
    }

    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<Option<PurchaseBill>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{BILL_SELECT} WHERE b.id = $1 AND b.tenant_id = $2 FOR UPDATE OF b");

        let bill = sqlx::query_as::<_, PurchaseBill>(&sql)
            .bind(bill_id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(bill)
    }

    pub async fn items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<Vec<PurchaseBillItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, PurchaseBillItem>(
            r#"
            SELECT
                pi.id, pi.purchase_bill_id, pi.position, pi.product_id,
                p.name AS product_name,
                pi.quantity, pi.unit_cost, pi.line_total
            FROM purchase_bill_items pi
            JOIN products p ON p.id = pi.product_id
            WHERE pi.purchase_bill_id = $1 AND pi.tenant_id = $2
            ORDER BY pi.position ASC
            "#,
        )
        .bind(bill_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &PurchaseListQuery,
    ) -> Result<(Vec<PurchaseBill>, i64), AppError> {
        let query = filter.list_query();
        let pattern = query.search_pattern();

        let count_sql = format!(
            "SELECT COUNT(*) FROM purchase_bills b JOIN suppliers s ON s.id = b.supplier_id {BILL_FILTER}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(tenant_id)
            .bind(filter.status)
            .bind(filter.supplier_id)
            .bind(&pattern)
            .fetch_one(&mut *conn)
            .await?;

        let list_sql = format!(
            "{BILL_SELECT} {BILL_FILTER} ORDER BY b.bill_date DESC, b.created_at DESC LIMIT $5 OFFSET $6"
        );
        let bills = sqlx::query_as::<_, PurchaseBill>(&list_sql)
            .bind(tenant_id)
            .bind(filter.status)
            .bind(filter.supplier_id)
            .bind(&pattern)
            .bind(query.per_page())
            .bind(query.offset())
            .fetch_all(&mut *conn)
            .await?;

        Ok((bills, total))
    }
}

// src/db/invoice_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::invoice::{
        Invoice, InvoiceItem, InvoiceListQuery, InvoicePayload, InvoiceStatus, InvoiceTotals,
        PreparedLine,
    },
};

// Cabeçalho com o nome do cliente e o saldo já calculados.
const INVOICE_SELECT: &str = r#"
    SELECT
        i.id, i.tenant_id, i.invoice_number, i.customer_id,
        c.name AS customer_name,
        i.status, i.issue_date, i.due_date, i.notes,
        i.subtotal, i.tax_total, i.total, i.amount_paid,
        (i.total - i.amount_paid) AS balance_due,
        i.created_at, i.updated_at
    FROM invoices i
    LEFT JOIN customers c ON c.id = i.customer_id
"#;

const INVOICE_FILTER: &str = r#"
    WHERE i.tenant_id = $1
      AND ($2::invoice_status IS NULL OR i.status = $2)
      AND ($3::uuid IS NULL OR i.customer_id = $3)
      AND ($4::date IS NULL OR i.issue_date >= $4)
      AND ($5::date IS NULL OR i.issue_date <= $5)
      AND ($6::text IS NULL OR i.invoice_number ILIKE $6 OR c.name ILIKE $6)
"#;

#[derive(Clone, Default)]
pub struct InvoiceRepository;

impl InvoiceRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Numeração
    // ---

    /// Avança o contador da loja e devolve o próximo sequencial.
    /// Na primeira alocação o contador nasce a partir do maior sufixo numérico
    /// já gravado, para lojas que já tinham faturas antes do contador existir.
    /// A linha do contador fica travada até o fim da transação.
    pub async fn next_sequence(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
    ) -> Result<i64, AppError> {
        let advanced: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE invoice_counters SET last_value = last_value + 1
            WHERE tenant_id = $1
            RETURNING last_value
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(value) = advanced {
            return Ok(value);
        }

        let seeded: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_counters (tenant_id, last_value)
            SELECT $1, COALESCE(MAX((substring(invoice_number FROM '([0-9]{1,18})$'))::bigint), 0) + 1
            FROM invoices
            WHERE tenant_id = $1
            ON CONFLICT (tenant_id)
            DO UPDATE SET last_value = invoice_counters.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(seeded)
    }

    // ---
    // Escrita
    // ---

    pub async fn insert_header<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_number: &str,
        status: InvoiceStatus,
        payload: &InvoicePayload,
        issue_date: NaiveDate,
        totals: &InvoiceTotals,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar(
            r#"
            INSERT INTO invoices (
                tenant_id, invoice_number, customer_id, status, issue_date, due_date, notes,
                subtotal, tax_total, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(invoice_number)
        .bind(payload.customer_id)
        .bind(status)
        .bind(issue_date)
        .bind(payload.due_date)
        .bind(&payload.notes)
        .bind(totals.subtotal)
        .bind(totals.tax_total)
        .bind(totals.total)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_db(
                e,
                "invoices_tenant_number_key",
                "Número de fatura já utilizado. Tente novamente.",
            )
        })
    }

    pub async fn insert_items(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        invoice_id: Uuid,
        lines: &[PreparedLine],
    ) -> Result<(), AppError> {
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    tenant_id, invoice_id, position, product_id, description,
                    quantity, unit_price, tax_rate, discount,
                    net_amount, tax_amount, line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(tenant_id)
            .bind(invoice_id)
            .bind(line.position)
            .bind(line.product_id)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.tax_rate)
            .bind(line.discount)
            .bind(line.amounts.net)
            .bind(line.amounts.tax)
            .bind(line.amounts.total)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn delete_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1 AND tenant_id = $2")
            .bind(invoice_id)
            .bind(tenant_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Regrava cabeçalho e totais de uma fatura em rascunho.
    pub async fn update_header<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
        payload: &InvoicePayload,
        issue_date: NaiveDate,
        totals: &InvoiceTotals,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE invoices SET
                customer_id = $3,
                issue_date = $4,
                due_date = $5,
                notes = $6,
                subtotal = $7,
                tax_total = $8,
                total = $9,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(invoice_id)
        .bind(tenant_id)
        .bind(payload.customer_id)
        .bind(issue_date)
        .bind(payload.due_date)
        .bind(&payload.notes)
        .bind(totals.subtotal)
        .bind(totals.tax_total)
        .bind(totals.total)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE invoices SET status = $3, updated_at = NOW() WHERE id = $1 AND tenant_id = $2",
        )
        .bind(invoice_id)
        .bind(tenant_id)
        .bind(status)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Grava o novo valor pago e o status derivado dele.
    pub async fn set_payment_state<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
        amount_paid: Decimal,
        status: InvoiceStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE invoices SET amount_paid = $3, status = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(invoice_id)
        .bind(tenant_id)
        .bind(amount_paid)
        .bind(status)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Itens saem junto (ON DELETE CASCADE); pagamentos bloqueiam (RESTRICT).
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1 AND tenant_id = $2")
            .bind(invoice_id)
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
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{INVOICE_SELECT} WHERE i.id = $1 AND i.tenant_id = $2");

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(invoice)
    }

    /// Mesmo que `find`, mas trava a linha da fatura até o fim da transação.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{INVOICE_SELECT} WHERE i.id = $1 AND i.tenant_id = $2 FOR UPDATE OF i");

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(invoice)
    }

    /// Já existe fatura da loja com este número?
    pub async fn number_taken<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_number: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE tenant_id = $1 AND invoice_number = $2)",
        )
        .bind(tenant_id)
        .bind(invoice_number)
        .fetch_one(executor)
        .await?;

        Ok(taken)
    }

    pub async fn items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, position, product_id, description, quantity, unit_price,
                   tax_rate, discount, net_amount, tax_amount, line_total
            FROM invoice_items
            WHERE invoice_id = $1 AND tenant_id = $2
            ORDER BY position ASC
            "#,
        )
        .bind(invoice_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    /// Filtros por status, cliente, período e busca por número/nome do cliente.
    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &InvoiceListQuery,
    ) -> Result<(Vec<Invoice>, i64), AppError> {
        let query = filter.list_query();
        let pattern = query.search_pattern();

        let count_sql = format!(
            "SELECT COUNT(*) FROM invoices i LEFT JOIN customers c ON c.id = i.customer_id {INVOICE_FILTER}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(tenant_id)
            .bind(filter.status)
            .bind(filter.customer_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&pattern)
            .fetch_one(&mut *conn)
            .await?;

        let list_sql = format!(
            "{INVOICE_SELECT} {INVOICE_FILTER} ORDER BY i.issue_date DESC, i.created_at DESC LIMIT $7 OFFSET $8"
        );
        let invoices = sqlx::query_as::<_, Invoice>(&list_sql)
            .bind(tenant_id)
            .bind(filter.status)
            .bind(filter.customer_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&pattern)
            .bind(query.per_page())
            .bind(query.offset())
            .fetch_all(&mut *conn)
            .await?;

        Ok((invoices, total))
    }
}

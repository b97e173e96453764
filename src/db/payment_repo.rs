// src/db/payment_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::payment::{NewPayment, Payment, PaymentListQuery},
};

const PAYMENT_FILTER: &str = r#"
    WHERE tenant_id = $1
      AND ($2::uuid IS NULL OR invoice_id = $2)
      AND ($3::uuid IS NULL OR purchase_bill_id = $3)
      AND ($4::date IS NULL OR payment_date >= $4)
      AND ($5::date IS NULL OR payment_date <= $5)
"#;

#[derive(Clone, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payment: &NewPayment,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                tenant_id, invoice_id, purchase_bill_id, amount, payment_date,
                method, reference, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payment.target.invoice_id())
        .bind(payment.target.purchase_bill_id())
        .bind(payment.amount)
        .bind(payment.payment_date)
        .bind(payment.method)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    /// Apaga e devolve o pagamento. A linha fica travada até o fim da transação,
    /// então dois estornos simultâneos do mesmo pagamento não passam: o segundo recebe `None`.
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            "DELETE FROM payments WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(payment_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(payment)
    }

    /// Soma dos pagamentos de uma fatura.
    pub async fn sum_for_invoice<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sum: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE tenant_id = $1 AND invoice_id = $2",
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .fetch_one(executor)
        .await?;

        Ok(sum)
    }

    /// Soma dos pagamentos de uma nota de compra.
    pub async fn sum_for_bill<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sum: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE tenant_id = $1 AND purchase_bill_id = $2",
        )
        .bind(tenant_id)
        .bind(bill_id)
        .fetch_one(executor)
        .await?;

        Ok(sum)
    }

    pub async fn count_for_invoice<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payments WHERE tenant_id = $1 AND invoice_id = $2",
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    pub async fn count_for_bill<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        bill_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payments WHERE tenant_id = $1 AND purchase_bill_id = $2",
        )
        .bind(tenant_id)
        .bind(bill_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &PaymentListQuery,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        let query = filter.list_query();

        let count_sql = format!("SELECT COUNT(*) FROM payments {PAYMENT_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(tenant_id)
            .bind(filter.invoice_id)
            .bind(filter.purchase_bill_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&mut *conn)
            .await?;

        let list_sql = format!(
            "SELECT * FROM payments {PAYMENT_FILTER} ORDER BY payment_date DESC, created_at DESC LIMIT $6 OFFSET $7"
        );
        let payments = sqlx::query_as::<_, Payment>(&list_sql)
            .bind(tenant_id)
            .bind(filter.invoice_id)
            .bind(filter.purchase_bill_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(query.per_page())
            .bind(query.offset())
            .fetch_all(&mut *conn)
            .await?;

        Ok((payments, total))
    }
}

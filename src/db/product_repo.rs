// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::ListQuery},
    models::product::{Product, ProductPayload},
};

const SKU_TAKEN: &str = "Já existe um produto com este SKU.";

#[derive(Clone, Default)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Leitura
    // ---

    pub async fn find<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    /// Busca por nome ou SKU, paginada. Devolve a página e o total filtrado.
    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        query: &ListQuery,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let pattern = query.search_pattern();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2)
            "#,
        )
        .bind(tenant_id)
        .bind(&pattern)
        .fetch_one(&mut *conn)
        .await?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2)
            ORDER BY name ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(&pattern)
        .bind(query.per_page())
        .bind(query.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok((products, total))
    }

    /// Quantos dos ids informados pertencem à loja.
    pub async fn count_owned<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    // ---
    // Escrita
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &ProductPayload,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                tenant_id, name, sku, unit, sale_price, purchase_price,
                tax_rate, stock_quantity, low_stock_threshold
            )
            VALUES ($1, $2, $3, COALESCE($4, 'pcs'), $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.name.trim())
        .bind(payload.sku.as_deref().map(str::trim))
        .bind(&payload.unit)
        .bind(payload.sale_price)
        .bind(payload.purchase_price)
        .bind(payload.tax_rate)
        .bind(payload.stock_quantity)
        .bind(payload.low_stock_threshold)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, "products_tenant_sku_key", SKU_TAKEN))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &ProductPayload,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = $3,
                sku = $4,
                unit = COALESCE($5, unit),
                sale_price = $6,
                purchase_price = $7,
                tax_rate = $8,
                stock_quantity = $9,
                low_stock_threshold = $10,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(payload.name.trim())
        .bind(payload.sku.as_deref().map(str::trim))
        .bind(&payload.unit)
        .bind(payload.sale_price)
        .bind(payload.purchase_price)
        .bind(payload.tax_rate)
        .bind(payload.stock_quantity)
        .bind(payload.low_stock_threshold)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_db(e, "products_tenant_sku_key", SKU_TAKEN))
    }

    /// Produtos citados em notas de compra não podem ser removidos (FK RESTRICT).
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(AppError::in_use)?;

        Ok(result.rows_affected() > 0)
    }

    /// Entrada de estoque de uma nota de compra: soma a quantidade e grava o último custo.
    /// Retorna `false` se o produto não existir mais na loja.
    pub async fn apply_stock_increment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        unit_cost: Decimal,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity + $3,
                purchase_price = $4,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING id
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .bind(quantity)
        .bind(unit_cost)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            AppError::numeric_overflow(e, "O estoque do produto excederia o limite permitido.")
        })?;

        Ok(updated.is_some())
    }
}

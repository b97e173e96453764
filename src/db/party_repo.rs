// src/db/party_repo.rs

use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::ListQuery},
    models::party::{Party, PartyKind, PartyPayload},
};

/// Clientes e fornecedores têm o mesmo formato; só a tabela muda.
/// Os nomes de tabela vêm de `PartyKind::table`, nunca da requisição.
#[derive(Clone, Default)]
pub struct PartyRepository;

impl PartyRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        kind: PartyKind,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Party>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE id = $1 AND tenant_id = $2",
            kind.table()
        );

        let party = sqlx::query_as::<_, Party>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(party)
    }

    pub async fn exists<'e, E>(
        &self,
        executor: E,
        kind: PartyKind,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1 AND tenant_id = $2)",
            kind.table()
        );

        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    /// Busca por nome, e-mail, telefone ou documento.
    pub async fn list(
        &self,
        conn: &mut PgConnection,
        kind: PartyKind,
        tenant_id: Uuid,
        query: &ListQuery,
    ) -> Result<(Vec<Party>, i64), AppError> {
        let pattern = query.search_pattern();
        let filter = r#"
            WHERE tenant_id = $1
              AND ($2::text IS NULL
                   OR name ILIKE $2 OR email ILIKE $2 OR phone ILIKE $2 OR tax_id ILIKE $2)
        "#;

        let count_sql = format!("SELECT COUNT(*) FROM {} {}", kind.table(), filter);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(tenant_id)
            .bind(&pattern)
            .fetch_one(&mut *conn)
            .await?;

        let list_sql = format!(
            "SELECT * FROM {} {} ORDER BY name ASC, id ASC LIMIT $3 OFFSET $4",
            kind.table(),
            filter
        );
        let parties = sqlx::query_as::<_, Party>(&list_sql)
            .bind(tenant_id)
            .bind(&pattern)
            .bind(query.per_page())
            .bind(query.offset())
            .fetch_all(&mut *conn)
            .await?;

        Ok((parties, total))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        kind: PartyKind,
        tenant_id: Uuid,
        payload: &PartyPayload,
    ) -> Result<Party, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {} (tenant_id, name, email, phone, address, tax_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
            kind.table()
        );

        let party = sqlx::query_as::<_, Party>(&sql)
            .bind(tenant_id)
            .bind(payload.name.trim())
            .bind(&payload.email)
            .bind(&payload.phone)
            .bind(&payload.address)
            .bind(&payload.tax_id)
            .fetch_one(executor)
            .await?;

        Ok(party)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        kind: PartyKind,
        tenant_id: Uuid,
        id: Uuid,
        payload: &PartyPayload,
    ) -> Result<Option<Party>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE {} SET
                name = $3, email = $4, phone = $5, address = $6, tax_id = $7,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
            kind.table()
        );

        let party = sqlx::query_as::<_, Party>(&sql)
            .bind(id)
            .bind(tenant_id)
            .bind(payload.name.trim())
            .bind(&payload.email)
            .bind(&payload.phone)
            .bind(&payload.address)
            .bind(&payload.tax_id)
            .fetch_optional(executor)
            .await?;

        Ok(party)
    }

    /// Falha com 409 se houver faturas/notas apontando para o cadastro (FK RESTRICT).
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        kind: PartyKind,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND tenant_id = $2", kind.table());

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(AppError::in_use)?;

        Ok(result.rows_affected() > 0)
    }
}

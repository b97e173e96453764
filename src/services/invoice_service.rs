// src/services/invoice_service.rs

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Page},
    db::{
        InvoiceRepository, PartyRepository, PaymentRepository, ProductRepository,
        SettingsRepository,
    },
    models::{
        invoice::{
            prepare_lines, CreateInvoicePayload, Invoice, InvoiceDetail, InvoiceListQuery,
            InvoicePayload, InvoiceStatus, UpdateInvoiceStatusPayload,
        },
        party::PartyKind,
        payment::{NewPayment, PaymentMethod, PaymentTarget},
    },
    services::numbering::next_invoice_number,
};

const SETTLEMENT_NOTE: &str = "Quitação registrada na mudança de status";

#[derive(Clone)]
pub struct InvoiceService {
    invoice_repo: InvoiceRepository,
    party_repo: PartyRepository,
    product_repo: ProductRepository,
    settings_repo: SettingsRepository,
    payment_repo: PaymentRepository,
}

impl InvoiceService {
    pub fn new(
        invoice_repo: InvoiceRepository,
        party_repo: PartyRepository,
        product_repo: ProductRepository,
        settings_repo: SettingsRepository,
        payment_repo: PaymentRepository,
    ) -> Self {
        Self { invoice_repo, party_repo, product_repo, settings_repo, payment_repo }
    }

    // ---
    // Criação
    // ---
    // Número, cabeçalho e itens na mesma transação: ou tudo, ou nada.
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: &CreateInvoicePayload,
    ) -> Result<InvoiceDetail, AppError> {
        let invoice = &payload.invoice;
        let issue_date = resolve_issue_date(invoice)?;
        let target_status = payload.status.unwrap_or(InvoiceStatus::Draft);

        let mut tx = conn.begin().await?;

        self.check_references(&mut tx, tenant_id, invoice).await?;

        let (lines, totals) = prepare_lines(&invoice.items).ok_or_else(totals_overflow)?;

        let number = next_invoice_number(&self.invoice_repo, &self.settings_repo, &mut tx, tenant_id)
            .await?;

        // Faturas criadas já como "paid" nascem "sent" e são quitadas logo abaixo.
        let initial_status = match target_status {
            InvoiceStatus::Paid => InvoiceStatus::Sent,
            other => other,
        };

        let invoice_id = self
            .invoice_repo
            .insert_header(&mut *tx, tenant_id, &number, initial_status, invoice, issue_date, &totals)
            .await?;

        self.invoice_repo
            .insert_items(&mut tx, tenant_id, invoice_id, &lines)
            .await?;

        if target_status == InvoiceStatus::Paid {
            let header = self.lock(&mut tx, tenant_id, invoice_id).await?;
            self.settle(&mut tx, tenant_id, &header, PaymentMethod::Cash).await?;
        }

        let detail = self.load_detail(&mut tx, tenant_id, invoice_id).await?;

        tx.commit().await?;

        tracing::info!(
            %tenant_id,
            invoice_id = %invoice_id,
            invoice_number = %number,
            total = %totals.total,
            lines = lines.len(),
            "🧾 Fatura criada"
        );

        Ok(detail)
    }

    // ---
    // Edição (somente rascunhos)
    // ---
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        invoice_id: Uuid,
        payload: &InvoicePayload,
    ) -> Result<InvoiceDetail, AppError> {
        let issue_date = resolve_issue_date(payload)?;

        let mut tx = conn.begin().await?;

        let current = self.lock(&mut tx, tenant_id, invoice_id).await?;
        if current.status != InvoiceStatus::Draft {
            return Err(AppError::conflict("Somente faturas em rascunho podem ser editadas."));
        }

        self.check_references(&mut tx, tenant_id, payload).await?;

        let (lines, totals) = prepare_lines(&payload.items).ok_or_else(totals_overflow)?;

        self.invoice_repo
            .update_header(&mut *tx, tenant_id, invoice_id, payload, issue_date, &totals)
            .await?;
        self.invoice_repo
            .delete_items(&mut *tx, tenant_id, invoice_id)
            .await?;
        self.invoice_repo
            .insert_items(&mut tx, tenant_id, invoice_id, &lines)
            .await?;

        let detail = self.load_detail(&mut tx, tenant_id, invoice_id).await?;

        tx.commit().await?;

        tracing::info!(%tenant_id, invoice_id = %invoice_id, total = %totals.total, "✏️ Fatura atualizada");

        Ok(detail)
    }

    // ---
    // Status
    // ---
    /// draft -> sent, draft -> paid, sent -> paid. Repetir o status atual não faz nada.
    /// Marcar como paga com saldo em aberto registra um pagamento de quitação.
    pub async fn change_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        invoice_id: Uuid,
        payload: &UpdateInvoiceStatusPayload,
    ) -> Result<InvoiceDetail, AppError> {
        let mut tx = conn.begin().await?;

        let current = self.lock(&mut tx, tenant_id, invoice_id).await?;
        let next = payload.status;

        if current.status != next {
            if !current.status.can_transition_to(next) {
                return Err(AppError::conflict(format!(
                    "Transição de status inválida: {} -> {}.",
                    status_label(current.status),
                    status_label(next)
                )));
            }

            if next == InvoiceStatus::Paid {
                let method = payload.payment_method.unwrap_or(PaymentMethod::Cash);
                self.settle(&mut tx, tenant_id, &current, method).await?;
            } else {
                self.invoice_repo
                    .set_status(&mut *tx, tenant_id, invoice_id, next)
                    .await?;
            }

            tracing::info!(
                %tenant_id,
                invoice_id = %invoice_id,
                from = status_label(current.status),
                to = status_label(next),
                "🔁 Status da fatura alterado"
            );
        }

        let detail = self.load_detail(&mut tx, tenant_id, invoice_id).await?;
        tx.commit().await?;

        Ok(detail)
    }

    // ---
    // Exclusão
    // ---
    pub async fn delete(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = conn.begin().await?;

        self.lock(&mut tx, tenant_id, invoice_id).await?;

        let payments = self
            .payment_repo
            .count_for_invoice(&mut *tx, tenant_id, invoice_id)
            .await?;
        if payments > 0 {
            return Err(AppError::conflict(
                "A fatura possui pagamentos. Remova-os antes de excluir.",
            ));
        }

        self.invoice_repo.delete(&mut *tx, tenant_id, invoice_id).await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, invoice_id = %invoice_id, "🗑️ Fatura excluída");
        Ok(())
    }

    // ---
    // Leitura
    // ---
    pub async fn get(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<InvoiceDetail, AppError> {
        self.load_detail(conn, tenant_id, invoice_id).await
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &InvoiceListQuery,
    ) -> Result<Page<Invoice>, AppError> {
        let (items, total) = self.invoice_repo.list(conn, tenant_id, filter).await?;
        Ok(Page::new(items, total, &filter.list_query()))
    }

    // ---
    // Auxiliares
    // ---

    async fn lock(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Invoice, AppError> {
        self.invoice_repo
            .find_for_update(conn, tenant_id, invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found("Fatura"))
    }

    async fn load_detail(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<InvoiceDetail, AppError> {
        let header = self
            .invoice_repo
            .find(&mut *conn, tenant_id, invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found("Fatura"))?;
        let items = self.invoice_repo.items(&mut *conn, tenant_id, invoice_id).await?;

        Ok(InvoiceDetail { header, items })
    }

    /// Cliente e produtos citados precisam ser da mesma loja.
    /// (FKs não passam pelas policies de RLS, então a checagem é explícita.)
    async fn check_references(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: &InvoicePayload,
    ) -> Result<(), AppError> {
        if let Some(customer_id) = payload.customer_id {
            let exists = self
                .party_repo
                .exists(&mut *conn, PartyKind::Customer, tenant_id, customer_id)
                .await?;
            if !exists {
                return Err(AppError::not_found(PartyKind::Customer.label()));
            }
        }

        let product_ids: BTreeSet<Uuid> =
            payload.items.iter().filter_map(|item| item.product_id).collect();
        if !product_ids.is_empty() {
            let ids: Vec<Uuid> = product_ids.into_iter().collect();
            let owned = self
                .product_repo
                .count_owned(&mut *conn, tenant_id, &ids)
                .await?;
            if owned != ids.len() as i64 {
                return Err(AppError::not_found("Produto"));
            }
        }

        Ok(())
    }

    /// Registra um pagamento pelo saldo em aberto e marca a fatura como paga.
    async fn settle(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        invoice: &Invoice,
        method: PaymentMethod,
    ) -> Result<(), AppError> {
        let balance = invoice.total - invoice.amount_paid;

        if balance > Decimal::ZERO {
            let payment = NewPayment {
                target: PaymentTarget::Invoice(invoice.id),
                amount: balance,
                payment_date: Utc::now().date_naive(),
                method,
                reference: None,
                notes: Some(SETTLEMENT_NOTE.to_string()),
            };
            let recorded = self.payment_repo.insert(&mut *conn, tenant_id, &payment).await?;

            tracing::info!(
                %tenant_id,
                invoice_id = %invoice.id,
                payment_id = %recorded.id,
                amount = %balance,
                "💰 Quitação registrada"
            );
        }

        self.invoice_repo
            .set_payment_state(conn, tenant_id, invoice.id, invoice.total, InvoiceStatus::Paid)
            .await
    }
}

fn resolve_issue_date(payload: &InvoicePayload) -> Result<NaiveDate, AppError> {
    let issue_date = payload.issue_date.unwrap_or_else(|| Utc::now().date_naive());

    if let Some(due) = payload.due_date {
        if due < issue_date {
            return Err(AppError::bad_request(
                "O vencimento não pode ser anterior à emissão.",
            ));
        }
    }

    Ok(issue_date)
}

fn totals_overflow() -> AppError {
    AppError::bad_request("Os valores da fatura excedem o limite permitido.")
}

fn status_label(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Draft => "draft",
        InvoiceStatus::Sent => "sent",
        InvoiceStatus::Paid => "paid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::InvoiceLinePayload;

    fn payload(issue: Option<NaiveDate>, due: Option<NaiveDate>) -> InvoicePayload {
        InvoicePayload {
            customer_id: None,
            issue_date: issue,
            due_date: due,
            notes: None,
            items: vec![InvoiceLinePayload {
                product_id: None,
                description: "Serviço".into(),
                quantity: Decimal::ONE,
                unit_price: Decimal::ONE_HUNDRED,
                tax_rate: Decimal::ZERO,
                discount: Decimal::ZERO,
            }],
        }
    }

    #[test]
    fn issue_date_defaults_to_today() {
        let today = Utc::now().date_naive();
        assert_eq!(resolve_issue_date(&payload(None, None)).unwrap(), today);
    }

    #[test]
    fn due_date_before_default_issue_is_rejected() {
        let yesterday = Utc::now().date_naive().pred_opt().unwrap();
        let err = resolve_issue_date(&payload(None, Some(yesterday))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn explicit_dates_are_kept() {
        let issue = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(resolve_issue_date(&payload(Some(issue), Some(due))).unwrap(), issue);
    }

    #[test]
    fn labels_match_wire_format() {
        for status in [InvoiceStatus::Draft, InvoiceStatus::Sent, InvoiceStatus::Paid] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, status_label(status));
        }
    }

    // ---
    // Contra o banco (`#[sqlx::test]` cria um banco novo e roda as migrações)
    // ---

    use crate::common::test_support::{d, line, open_shop};
    use crate::models::settings::UpdateSettingsRequest;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn numbers_follow_the_counter_and_rollbacks_give_them_back(pool: PgPool) {
        let shop = open_shop(pool, "user_numeracao").await;
        let arroz = shop.product("Arroz 5kg", "25.90", "10").await;

        let first = shop.create_invoice(json!({ "items": [line(&arroz, "1")] })).await.unwrap();
        assert_eq!(first.header.invoice_number, "INV-0001");

        // Criada e desfeita: o número volta para o contador
        let payload: CreateInvoicePayload =
            serde_json::from_value(json!({ "items": [line(&arroz, "2")] })).unwrap();
        let mut tx = shop.tx().await;
        let discarded = shop.state.invoice_service.create(&mut tx, shop.id(), &payload).await.unwrap();
        assert_eq!(discarded.header.invoice_number, "INV-0002");
        tx.rollback().await.unwrap();

        // Produto de outra loja: nada é gravado
        let mut foreign = line(&arroz, "1");
        foreign["productId"] = json!(Uuid::new_v4());
        let err = shop.create_invoice(json!({ "items": [foreign] })).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(shop.invoice_count().await, 1);

        let second = shop.create_invoice(json!({ "items": [line(&arroz, "1")] })).await.unwrap();
        assert_eq!(second.header.invoice_number, "INV-0002");
        assert_eq!(second.header.total, d("25.90"));
        assert_eq!(second.items.len(), 1);
    }

    #[sqlx::test]
    async fn created_as_paid_records_the_settlement_payment(pool: PgPool) {
        let shop = open_shop(pool, "user_quitacao").await;
        let cafe = shop.product("Café 500g", "18.50", "10").await;

        let detail = shop
            .create_invoice(json!({ "status": "paid", "items": [line(&cafe, "2")] }))
            .await
            .unwrap();

        assert_eq!(detail.header.status, InvoiceStatus::Paid);
        assert_eq!(detail.header.amount_paid, d("37.00"));
        assert_eq!(detail.header.balance_due, Decimal::ZERO);

        let mut tx = shop.tx().await;
        let paid = shop
            .state
            .payment_service
            .list(&mut tx, shop.id(), &Default::default())
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(paid.items.len(), 1);
        assert_eq!(paid.items[0].amount, d("37.00"));
    }

    #[sqlx::test]
    async fn invoices_with_payments_cannot_be_deleted(pool: PgPool) {
        let shop = open_shop(pool, "user_exclusao").await;
        let leite = shop.product("Leite 1L", "5.49", "24").await;

        let paid = shop
            .create_invoice(json!({ "status": "paid", "items": [line(&leite, "1")] }))
            .await
            .unwrap();
        let draft = shop.create_invoice(json!({ "items": [line(&leite, "1")] })).await.unwrap();

        let mut tx = shop.tx().await;
        let err = shop
            .state
            .invoice_service
            .delete(&mut tx, shop.id(), paid.header.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        shop.state.invoice_service.delete(&mut tx, shop.id(), draft.header.id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(shop.invoice_count().await, 1);
    }

    #[sqlx::test]
    async fn prefix_change_skips_numbers_already_issued(pool: PgPool) {
        let shop = open_shop(pool, "user_prefixo").await;
        let pao = shop.product("Pão de forma", "8.99", "10").await;

        let set_prefix = |prefix: &str| -> UpdateSettingsRequest {
            serde_json::from_value(json!({ "businessName": "Mercadinho Teste", "invoicePrefix": prefix }))
                .unwrap()
        };

        let mut tx = shop.tx().await;
        shop.state.settings_repo.update_settings(&mut *tx, shop.id(), &set_prefix("INV-1")).await.unwrap();
        tx.commit().await.unwrap();

        let old = shop.create_invoice(json!({ "items": [line(&pao, "1")] })).await.unwrap();
        assert_eq!(old.header.invoice_number, "INV-10001");

        // "INV-" + 10001 daria o mesmo texto da fatura acima
        let mut tx = shop.tx().await;
        sqlx::query("UPDATE invoice_counters SET last_value = 10000 WHERE tenant_id = $1")
            .bind(shop.id())
            .execute(&mut *tx)
            .await
            .unwrap();
        shop.state.settings_repo.update_settings(&mut *tx, shop.id(), &set_prefix("INV-")).await.unwrap();
        tx.commit().await.unwrap();

        let new = shop.create_invoice(json!({ "items": [line(&pao, "1")] })).await.unwrap();
        assert_eq!(new.header.invoice_number, "INV-10002");
        assert_eq!(shop.invoice_count().await, 2);
    }
}

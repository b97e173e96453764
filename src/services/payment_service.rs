// src/services/payment_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Page},
    db::{InvoiceRepository, PaymentRepository, PurchaseRepository},
    models::payment::{NewPayment, Payment, PaymentListQuery, PaymentTarget, RecordPaymentPayload},
};

#[derive(Clone)]
pub struct PaymentService {
    payment_repo: PaymentRepository,
    invoice_repo: InvoiceRepository,
    purchase_repo: PurchaseRepository,
}

impl PaymentService {
    pub fn new(
        payment_repo: PaymentRepository,
        invoice_repo: InvoiceRepository,
        purchase_repo: PurchaseRepository,
    ) -> Self {
        Self { payment_repo, invoice_repo, purchase_repo }
    }

    /// Registra um pagamento contra uma fatura (recebimento) ou nota de compra.
    /// O documento fica travado enquanto o saldo é conferido e atualizado.
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: &RecordPaymentPayload,
    ) -> Result<Payment, AppError> {
        let target = payload.target().ok_or_else(|| {
            AppError::bad_request("Informe exatamente um entre 'invoiceId' e 'purchaseBillId'.")
        })?;

        let new_payment = NewPayment {
            target,
            amount: payload.amount,
            payment_date: payload.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
            method: payload.method,
            reference: payload.reference.clone(),
            notes: payload.notes.clone(),
        };

        let mut tx = conn.begin().await?;

        match target {
            PaymentTarget::Invoice(invoice_id) => {
                let invoice = self
                    .invoice_repo
                    .find_for_update(&mut *tx, tenant_id, invoice_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Fatura"))?;

                ensure_within_balance(payload.amount, invoice.total - invoice.amount_paid)?;

                let amount_paid = invoice.amount_paid + payload.amount;
                let status = invoice.status.after_payment_change(amount_paid, invoice.total);

                self.invoice_repo
                    .set_payment_state(&mut *tx, tenant_id, invoice_id, amount_paid, status)
                    .await?;
            }
            PaymentTarget::PurchaseBill(bill_id) => {
                let bill = self
                    .purchase_repo
                    .find_for_update(&mut *tx, tenant_id, bill_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Nota de compra"))?;

                ensure_within_balance(payload.amount, bill.total - bill.amount_paid)?;

                self.purchase_repo
                    .set_amount_paid(&mut *tx, tenant_id, bill_id, bill.amount_paid + payload.amount)
                    .await?;
            }
        }

        let payment = self
            .payment_repo
            .insert(&mut *tx, tenant_id, &new_payment)
            .await?;

        tx.commit().await?;

        tracing::info!(
            %tenant_id,
            payment_id = %payment.id,
            invoice_id = ?payment.invoice_id,
            purchase_bill_id = ?payment.purchase_bill_id,
            amount = %payment.amount,
            "💰 Pagamento registrado"
        );

        Ok(payment)
    }

    /// Estorna o pagamento: devolve o valor ao saldo do documento.
    /// Fatura paga que volta a ter saldo retorna para "sent".
    pub async fn delete(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payment_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = conn.begin().await?;

        // O DELETE vem primeiro: só quem de fato removeu a linha estorna o valor.
        let payment = self
            .payment_repo
            .delete(&mut *tx, tenant_id, payment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pagamento"))?;

        if let Some(invoice_id) = payment.invoice_id {
            let invoice = self
                .invoice_repo
                .find_for_update(&mut *tx, tenant_id, invoice_id)
                .await?
                .ok_or_else(|| AppError::not_found("Fatura"))?;

            // Recalculado a partir dos pagamentos que restaram
            let amount_paid = self
                .payment_repo
                .sum_for_invoice(&mut *tx, tenant_id, invoice_id)
                .await?;
            let status = invoice.status.after_payment_change(amount_paid, invoice.total);

            self.invoice_repo
                .set_payment_state(&mut *tx, tenant_id, invoice_id, amount_paid, status)
                .await?;
        }

        if let Some(bill_id) = payment.purchase_bill_id {
            self.purchase_repo
                .find_for_update(&mut *tx, tenant_id, bill_id)
                .await?
                .ok_or_else(|| AppError::not_found("Nota de compra"))?;

            let amount_paid = self
                .payment_repo
                .sum_for_bill(&mut *tx, tenant_id, bill_id)
                .await?;
            self.purchase_repo
                .set_amount_paid(&mut *tx, tenant_id, bill_id, amount_paid)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(%tenant_id, payment_id = %payment_id, amount = %payment.amount, "↩️ Pagamento estornado");
        Ok(())
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &PaymentListQuery,
    ) -> Result<Page<Payment>, AppError> {
        let (items, total) = self.payment_repo.list(conn, tenant_id, filter).await?;
        Ok(Page::new(items, total, &filter.list_query()))
    }
}

fn ensure_within_balance(amount: Decimal, balance_due: Decimal) -> Result<(), AppError> {
    if amount > balance_due {
        return Err(AppError::conflict(format!(
            "O valor excede o saldo em aberto ({}).",
            balance_due
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn exact_balance_is_accepted() {
        assert!(ensure_within_balance(d("150.00"), d("150.00")).is_ok());
        assert!(ensure_within_balance(d("0.01"), d("150.00")).is_ok());
    }

    #[test]
    fn overpayment_is_a_conflict() {
        let err = ensure_within_balance(d("150.01"), d("150.00")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = ensure_within_balance(d("1"), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    // ---
    // Contra o banco
    // ---

    use crate::common::test_support::{line, open_shop, Shop};
    use crate::models::{
        invoice::InvoiceStatus, party::PartyKind, purchase::CreatePurchaseBillPayload,
    };
    use serde_json::{json, Value};
    use sqlx::PgPool;

    async fn pay(shop: &Shop, body: Value) -> Result<Payment, AppError> {
        let payload: RecordPaymentPayload = serde_json::from_value(body).unwrap();
        let mut tx = shop.tx().await;
        let payment = shop.state.payment_service.record(&mut tx, shop.id(), &payload).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn reverse(shop: &Shop, payment_id: Uuid) -> Result<(), AppError> {
        let mut tx = shop.tx().await;
        shop.state.payment_service.delete(&mut tx, shop.id(), payment_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn invoice_state(shop: &Shop, invoice_id: Uuid) -> (InvoiceStatus, Decimal) {
        let mut tx = shop.tx().await;
        let detail = shop.state.invoice_service.get(&mut tx, shop.id(), invoice_id).await.unwrap();
        (detail.header.status, detail.header.amount_paid)
    }

    /// Fatura enviada de 100,00.
    async fn sent_invoice(shop: &Shop) -> Uuid {
        let produto = shop.product("Cesta básica", "50.00", "10").await;
        shop.create_invoice(json!({ "status": "sent", "items": [line(&produto, "2")] }))
            .await
            .unwrap()
            .header
            .id
    }

    #[sqlx::test]
    async fn payments_move_the_invoice_balance_both_ways(pool: PgPool) {
        let shop = open_shop(pool, "user_recebimentos").await;
        let invoice_id = sent_invoice(&shop).await;

        let err = pay(&shop, json!({ "invoiceId": invoice_id, "amount": 100.01 })).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        pay(&shop, json!({ "invoiceId": invoice_id, "amount": 60 })).await.unwrap();
        assert_eq!(invoice_state(&shop, invoice_id).await, (InvoiceStatus::Sent, d("60")));

        let last = pay(&shop, json!({ "invoiceId": invoice_id, "amount": 40 })).await.unwrap();
        assert_eq!(invoice_state(&shop, invoice_id).await, (InvoiceStatus::Paid, d("100")));

        reverse(&shop, last.id).await.unwrap();
        assert_eq!(invoice_state(&shop, invoice_id).await, (InvoiceStatus::Sent, d("60")));

        // Estornar de novo não mexe no saldo
        let err = reverse(&shop, last.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(invoice_state(&shop, invoice_id).await, (InvoiceStatus::Sent, d("60")));
    }

    #[sqlx::test]
    async fn concurrent_reversals_of_one_payment_apply_once(pool: PgPool) {
        let shop = open_shop(pool, "user_estorno_duplo").await;
        let invoice_id = sent_invoice(&shop).await;

        pay(&shop, json!({ "invoiceId": invoice_id, "amount": 30 })).await.unwrap();
        let big = pay(&shop, json!({ "invoiceId": invoice_id, "amount": 70 })).await.unwrap();

        let (a, b) = tokio::join!(reverse(&shop, big.id), reverse(&shop, big.id));

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::ResourceNotFound(_)))));

        let (status, amount_paid) = invoice_state(&shop, invoice_id).await;
        assert_eq!(status, InvoiceStatus::Sent);
        assert_eq!(amount_paid, d("30"));

        let mut tx = shop.tx().await;
        let sum = shop
            .state
            .payment_service
            .payment_repo
            .sum_for_invoice(&mut *tx, shop.id(), invoice_id)
            .await
            .unwrap();
        assert_eq!(sum, amount_paid);
    }

    #[sqlx::test]
    async fn bill_payments_are_reversed_once(pool: PgPool) {
        let shop = open_shop(pool, "user_contas_a_pagar").await;
        let fornecedor = shop.party(PartyKind::Supplier, "Distribuidora Central").await;
        let produto = shop.product("Feijão 1kg", "9.90", "0").await;

        let payload: CreatePurchaseBillPayload = serde_json::from_value(json!({
            "supplierId": fornecedor.id,
            "items": [{ "productId": produto.id, "quantity": 10, "unitCost": 6.5 }],
        }))
        .unwrap();
        let mut tx = shop.tx().await;
        let bill = shop.state.purchase_service.create(&mut tx, shop.id(), &payload).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(bill.header.total, d("65.00"));

        let payment = pay(&shop, json!({ "purchaseBillId": bill.header.id, "amount": 65 })).await.unwrap();
        let err = pay(&shop, json!({ "purchaseBillId": bill.header.id, "amount": 0.01 })).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        reverse(&shop, payment.id).await.unwrap();
        let err = reverse(&shop, payment.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));

        let mut tx = shop.tx().await;
        let bill = shop.state.purchase_service.get(&mut tx, shop.id(), bill.header.id).await.unwrap();
        assert_eq!(bill.header.amount_paid, Decimal::ZERO);
        assert_eq!(bill.header.balance_due, d("65.00"));
    }
}

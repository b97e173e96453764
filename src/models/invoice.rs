// src/models/invoice.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::money::{
    fit_money, round_money, validate_money, validate_quantity, validate_tax_rate,
};
use crate::common::pagination::ListQuery;
use crate::models::payment::PaymentMethod;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
}

impl InvoiceStatus {
    /// draft -> sent, draft -> paid, sent -> paid. `paid` é terminal.
    pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Draft, InvoiceStatus::Sent)
                | (InvoiceStatus::Draft, InvoiceStatus::Paid)
                | (InvoiceStatus::Sent, InvoiceStatus::Paid)
        )
    }

    /// Status resultante depois que `amount_paid` mudou (pagamento lançado ou estornado).
    pub fn after_payment_change(self, amount_paid: Decimal, total: Decimal) -> InvoiceStatus {
        if amount_paid >= total && total > Decimal::ZERO {
            InvoiceStatus::Paid
        } else if self == InvoiceStatus::Paid || amount_paid > Decimal::ZERO {
            InvoiceStatus::Sent
        } else {
            self
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub position: i32,
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
    pub discount: Decimal,
    pub net_amount: Decimal,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub header: Invoice,
    pub items: Vec<InvoiceItem>,
}

// ---
// Cálculo de valores
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    pub net: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// net = qtd * preço - desconto; imposto = net * alíquota / 100 (centavos).
/// `None` quando a conta estoura ou o resultado não cabe nas colunas.
pub fn compute_line(
    quantity: Decimal,
    unit_price: Decimal,
    tax_rate: Decimal,
    discount: Decimal,
) -> Option<LineAmounts> {
    let net = round_money(quantity.checked_mul(unit_price)?.checked_sub(discount)?);
    let tax = round_money(
        net.checked_mul(tax_rate)?
            .checked_div(Decimal::ONE_HUNDRED)?,
    );
    let total = net.checked_add(tax)?;

    Some(LineAmounts {
        net: fit_money(net)?,
        tax: fit_money(tax)?,
        total: fit_money(total)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LineAmounts>) -> Option<Self> {
        lines.into_iter().try_fold(InvoiceTotals::default(), |acc, line| {
            Some(InvoiceTotals {
                subtotal: fit_money(acc.subtotal.checked_add(line.net)?)?,
                tax_total: fit_money(acc.tax_total.checked_add(line.tax)?)?,
                total: fit_money(acc.total.checked_add(line.total)?)?,
            })
        })
    }
}

/// Linha pronta para o INSERT (valores já calculados).
#[derive(Debug, Clone)]
pub struct PreparedLine {
    pub position: i32,
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
    pub discount: Decimal,
    pub amounts: LineAmounts,
}

/// `None` se alguma linha ou os totais não couberem nas colunas.
pub fn prepare_lines(items: &[InvoiceLinePayload]) -> Option<(Vec<PreparedLine>, InvoiceTotals)> {
    let lines = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            Some(PreparedLine {
                position: idx as i32 + 1,
                product_id: item.product_id,
                description: item.description.trim().to_string(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                tax_rate: item.tax_rate,
                discount: item.discount,
                amounts: compute_line(item.quantity, item.unit_price, item.tax_rate, item.discount)?,
            })
        })
        .collect::<Option<Vec<PreparedLine>>>()?;

    let totals = InvoiceTotals::from_lines(lines.iter().map(|l| &l.amounts))?;
    Some((lines, totals))
}

// ---
// Payloads
// ---

fn validate_line_discount(line: &InvoiceLinePayload) -> Result<(), ValidationError> {
    let within_line = line
        .quantity
        .checked_mul(line.unit_price)
        .is_some_and(|gross| line.discount <= gross);

    if !within_line {
        let mut err = ValidationError::new("discount");
        err.message = Some("O desconto não pode ser maior que o valor da linha.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_line_discount"))]
pub struct InvoiceLinePayload {
    pub product_id: Option<Uuid>,

    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,

    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_money"))]
    pub unit_price: Decimal,

    #[validate(custom(function = "validate_tax_rate"))]
    #[serde(default)]
    pub tax_rate: Decimal,

    #[validate(custom(function = "validate_money"))]
    #[serde(default)]
    pub discount: Decimal,
}

fn validate_invoice_dates(payload: &InvoicePayload) -> Result<(), ValidationError> {
    if let (Some(issue), Some(due)) = (payload.issue_date, payload.due_date) {
        if due < issue {
            let mut err = ValidationError::new("due_date");
            err.message = Some("O vencimento não pode ser anterior à emissão.".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Cabeçalho + linhas; usado na criação e na edição de rascunhos.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_invoice_dates"))]
pub struct InvoicePayload {
    pub customer_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,

    #[validate(length(min = 1, message = "A fatura precisa de pelo menos um item."), nested)]
    pub items: Vec<InvoiceLinePayload>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoicePayload {
    #[serde(flatten)]
    #[validate(nested)]
    pub invoice: InvoicePayload,

    // "draft" (padrão), "sent" ou "paid"; "paid" nasce quitada com um pagamento em dinheiro.
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceStatusPayload {
    pub status: InvoiceStatus,
    // Usado na quitação manual (status -> paid com saldo em aberto)
    pub payment_method: Option<PaymentMethod>,
}

/// ?status=&customerId=&from=&to=&search=&page=&perPage=
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl InvoiceListQuery {
    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            search: self.search.clone(),
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(qty: &str, price: &str, rate: &str, discount: &str) -> InvoiceLinePayload {
        InvoiceLinePayload {
            product_id: None,
            description: "Item".into(),
            quantity: d(qty),
            unit_price: d(price),
            tax_rate: d(rate),
            discount: d(discount),
        }
    }

    #[test]
    fn computes_line_amounts_with_discount_and_tax() {
        let amounts = compute_line(d("3"), d("19.99"), d("18"), d("5")).unwrap();
        // 3 * 19.99 = 59.97 - 5 = 54.97; 18% = 9.8946 -> 9.89
        assert_eq!(amounts.net, d("54.97"));
        assert_eq!(amounts.tax, d("9.89"));
        assert_eq!(amounts.total, d("64.86"));
    }

    #[test]
    fn fractional_quantities_round_to_cents() {
        let amounts = compute_line(d("0.333"), d("10"), d("0"), d("0")).unwrap();
        assert_eq!(amounts.net, d("3.33"));
        assert_eq!(amounts.tax, Decimal::ZERO);
    }

    #[test]
    fn totals_sum_every_line() {
        let (lines, totals) = prepare_lines(&[
            line("2", "10.00", "10", "0"),
            line("1", "5.50", "0", "0.50"),
        ])
        .unwrap();

        assert_eq!(lines[0].position, 1);
        assert_eq!(lines[1].position, 2);
        assert_eq!(totals.subtotal, d("25.00"));
        assert_eq!(totals.tax_total, d("2.00"));
        assert_eq!(totals.total, d("27.00"));
    }

    #[test]
    fn status_machine_only_moves_forward() {
        use InvoiceStatus::*;
        assert!(Draft.can_transition_to(Sent));
        assert!(Draft.can_transition_to(Paid));
        assert!(Sent.can_transition_to(Paid));

        assert!(!Sent.can_transition_to(Draft));
        assert!(!Paid.can_transition_to(Sent));
        assert!(!Paid.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Draft));
    }

    #[test]
    fn payment_changes_drive_status() {
        use InvoiceStatus::*;
        assert_eq!(Sent.after_payment_change(d("100"), d("100")), Paid);
        assert_eq!(Draft.after_payment_change(d("40"), d("100")), Sent);
        assert_eq!(Sent.after_payment_change(d("40"), d("100")), Sent);
        // estorno de uma fatura quitada reabre a fatura
        assert_eq!(Paid.after_payment_change(d("60"), d("100")), Sent);
        assert_eq!(Draft.after_payment_change(Decimal::ZERO, d("100")), Draft);
    }

    #[test]
    fn rejects_discount_above_line_value() {
        assert!(line("1", "10", "0", "10").validate().is_ok());
        assert!(line("1", "10", "0", "10.01").validate().is_err());
    }

    #[test]
    fn invoice_requires_items_and_ordered_dates() {
        let empty: InvoicePayload = serde_json::from_value(serde_json::json!({
            "items": []
        }))
        .unwrap();
        assert!(empty.validate().is_err());

        let bad_dates: InvoicePayload = serde_json::from_value(serde_json::json!({
            "issueDate": "2026-03-10",
            "dueDate": "2026-03-01",
            "items": [{ "description": "Arroz 5kg", "quantity": 1, "unitPrice": 27.5 }]
        }))
        .unwrap();
        assert!(bad_dates.validate().is_err());

        let ok: CreateInvoicePayload = serde_json::from_value(serde_json::json!({
            "issueDate": "2026-03-01",
            "dueDate": "2026-03-10",
            "status": "sent",
            "items": [{ "description": "Arroz 5kg", "quantity": 2, "unitPrice": 27.5 }]
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.status, Some(InvoiceStatus::Sent));
        assert_eq!(ok.invoice.items.len(), 1);
    }

    #[test]
    fn nested_line_errors_surface() {
        let payload: InvoicePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "description": "Feijão", "quantity": 0, "unitPrice": 8 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn oversized_lines_fail_validation_instead_of_panicking() {
        let payload: InvoicePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "description": "Lote", "quantity": 1e20, "unitPrice": 1e20 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        // Direto na conta, sem passar pela validação
        let huge = d("79228162514264337593543950335");
        assert_eq!(compute_line(huge, huge, Decimal::ZERO, Decimal::ZERO), None);
    }

    #[test]
    fn totals_beyond_the_column_are_refused() {
        // Cada linha cabe, a soma não
        let big = line("1", "999999999999.99", "0", "0");
        assert!(big.validate().is_ok());
        assert!(prepare_lines(&[big.clone()]).is_some());
        assert!(prepare_lines(&[big.clone(), big]).is_none());
    }

    #[test]
    fn sub_cent_prices_are_rejected() {
        assert!(line("1", "19.999", "0", "0").validate().is_err());
        assert!(line("0.0005", "10", "0", "0").validate().is_err());
        assert!(line("0.005", "10", "0", "0").validate().is_ok());
    }
}

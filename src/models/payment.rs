// src/models/payment.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::pagination::ListQuery;
use crate::common::money::validate_positive_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    Bank,
    Cheque,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub purchase_bill_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Para onde o dinheiro vai: recebido de uma fatura ou pago a uma nota de compra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTarget {
    Invoice(Uuid),
    PurchaseBill(Uuid),
}

impl PaymentTarget {
    pub fn invoice_id(self) -> Option<Uuid> {
        match self {
            PaymentTarget::Invoice(id) => Some(id),
            PaymentTarget::PurchaseBill(_) => None,
        }
    }

    pub fn purchase_bill_id(self) -> Option<Uuid> {
        match self {
            PaymentTarget::PurchaseBill(id) => Some(id),
            PaymentTarget::Invoice(_) => None,
        }
    }
}

fn validate_single_target(payload: &RecordPaymentPayload) -> Result<(), ValidationError> {
    if payload.invoice_id.is_some() == payload.purchase_bill_id.is_some() {
        let mut err = ValidationError::new("target");
        err.message = Some("Informe exatamente um entre 'invoiceId' e 'purchaseBillId'.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_single_target"))]
pub struct RecordPaymentPayload {
    pub invoice_id: Option<Uuid>,
    pub purchase_bill_id: Option<Uuid>,

    #[validate(custom(function = "validate_positive_money"))]
    pub amount: Decimal,

    pub payment_date: Option<NaiveDate>,

    #[serde(default = "default_method")]
    pub method: PaymentMethod,

    #[validate(length(max = 128, message = "Referência muito longa."))]
    pub reference: Option<String>,

    pub notes: Option<String>,
}

fn default_method() -> PaymentMethod {
    PaymentMethod::Cash
}

impl RecordPaymentPayload {
    pub fn target(&self) -> Option<PaymentTarget> {
        match (self.invoice_id, self.purchase_bill_id) {
            (Some(id), None) => Some(PaymentTarget::Invoice(id)),
            (None, Some(id)) => Some(PaymentTarget::PurchaseBill(id)),
            _ => None,
        }
    }
}

/// Dados do lançamento, já resolvidos (data padrão = hoje).
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub target: PaymentTarget,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// ?invoiceId=&purchaseBillId=&from=&to=&page=&perPage=
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListQuery {
    pub invoice_id: Option<Uuid>,
    pub purchase_bill_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PaymentListQuery {
    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            search: None,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

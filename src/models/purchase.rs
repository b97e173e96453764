// src/models/purchase.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::money::{fit_money, round_money, validate_money, validate_quantity};
use crate::common::pagination::ListQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "purchase_bill_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseBillStatus {
    Pending,  // Digitada, estoque ainda não movimentado
    Recorded, // Estoque e custo de compra já atualizados
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBill {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub bill_number: Option<String>,
    pub bill_date: NaiveDate,
    pub status: PurchaseBillStatus,
    pub notes: Option<String>,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub recorded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBillItem {
    pub id: Uuid,
    pub purchase_bill_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBillDetail {
    #[serde(flatten)]
    pub header: PurchaseBill,
    pub items: Vec<PurchaseBillItem>,
}

// ---
// Agregação do "record"
// ---

/// Entrada de estoque consolidada de um produto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockIncrement {
    pub product_id: Uuid,
    pub quantity: Decimal,
    // Custo da última linha do produto, na ordem da nota
    pub last_cost: Decimal,
}

/// Soma as quantidades por produto; o custo é o da última linha.
/// `lines` deve vir na ordem da nota (position). O resultado sai ordenado por
/// product_id, que é a ordem em que os UPDATEs travam as linhas de products.
pub fn aggregate_stock_increments(lines: &[PurchaseBillItem]) -> Vec<StockIncrement> {
    let mut by_product: BTreeMap<Uuid, StockIncrement> = BTreeMap::new();

    for line in lines {
        by_product
            .entry(line.product_id)
            .and_modify(|inc| {
                inc.quantity += line.quantity;
                inc.last_cost = line.unit_cost;
            })
            .or_insert_with(|| StockIncrement {
                product_id: line.product_id,
                quantity: line.quantity,
                last_cost: line.unit_cost,
            });
    }

    by_product.into_values().collect()
}

/// `None` quando a conta estoura ou não cabe na coluna.
pub fn purchase_line_total(quantity: Decimal, unit_cost: Decimal) -> Option<Decimal> {
    fit_money(round_money(quantity.checked_mul(unit_cost)?))
}

/// Total de cada linha (na ordem da nota) e o total da nota.
pub fn price_purchase_lines(items: &[PurchaseLinePayload]) -> Option<(Vec<Decimal>, Decimal)> {
    let line_totals = items
        .iter()
        .map(|line| purchase_line_total(line.quantity, line.unit_cost))
        .collect::<Option<Vec<Decimal>>>()?;

    let total = line_totals
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| fit_money(acc.checked_add(*line)?))?;

    Some((line_totals, total))
}

// ---
// Payloads
// ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLinePayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_money"))]
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseBillPayload {
    pub supplier_id: Uuid,

    #[validate(length(min = 1, max = 64, message = "Número da nota inválido."))]
    pub bill_number: Option<String>,

    pub bill_date: Option<NaiveDate>,
    pub notes: Option<String>,

    #[validate(length(min = 1, message = "A nota precisa de pelo menos um item."), nested)]
    pub items: Vec<PurchaseLinePayload>,
}

/// ?status=&supplierId=&search=&page=&perPage=
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseListQuery {
    pub status: Option<PurchaseBillStatus>,
    pub supplier_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PurchaseListQuery {
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

    fn item(position: i32, product_id: Uuid, qty: &str, cost: &str) -> PurchaseBillItem {
        PurchaseBillItem {
            id: Uuid::new_v4(),
            purchase_bill_id: Uuid::nil(),
            position,
            product_id,
            product_name: "Produto".into(),
            quantity: d(qty),
            unit_cost: d(cost),
            line_total: purchase_line_total(d(qty), d(cost)).unwrap(),
        }
    }

    #[test]
    fn sums_quantities_and_keeps_last_cost() {
        let rice = Uuid::from_u128(2);
        let beans = Uuid::from_u128(1);

        let increments = aggregate_stock_increments(&[
            item(1, rice, "10", "20.00"),
            item(2, beans, "5", "7.50"),
            item(3, rice, "4", "21.40"),
        ]);

        assert_eq!(
            increments,
            vec![
                StockIncrement { product_id: beans, quantity: d("5"), last_cost: d("7.50") },
                StockIncrement { product_id: rice, quantity: d("14"), last_cost: d("21.40") },
            ]
        );
    }

    #[test]
    fn output_is_sorted_by_product_id() {
        let ids: Vec<Uuid> = (0..5u128).rev().map(Uuid::from_u128).collect();
        let lines: Vec<PurchaseBillItem> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| item(i as i32 + 1, *id, "1", "1"))
            .collect();

        let increments = aggregate_stock_increments(&lines);
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(increments.iter().map(|i| i.product_id).collect::<Vec<_>>(), sorted);
    }

    #[test]
    fn empty_bill_has_no_increments() {
        assert!(aggregate_stock_increments(&[]).is_empty());
    }

    #[test]
    fn line_total_rounds_to_cents() {
        assert_eq!(purchase_line_total(d("1.5"), d("3.333")), Some(d("5.00")));
    }

    #[test]
    fn payload_requires_items() {
        let payload: CreatePurchaseBillPayload = serde_json::from_value(serde_json::json!({
            "supplierId": Uuid::new_v4(),
            "items": []
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    fn line_payload(qty: &str, cost: &str) -> PurchaseLinePayload {
        PurchaseLinePayload { product_id: Uuid::nil(), quantity: d(qty), unit_cost: d(cost) }
    }

    #[test]
    fn prices_every_line_and_the_bill() {
        let (lines, total) =
            price_purchase_lines(&[line_payload("10", "2.50"), line_payload("0.5", "7.99")]).unwrap();
        assert_eq!(lines, vec![d("25.00"), d("4.00")]);
        assert_eq!(total, d("29.00"));
    }

    #[test]
    fn overflowing_bills_are_refused() {
        let huge = d("79228162514264337593543950335");
        assert_eq!(purchase_line_total(huge, huge), None);

        let big = line_payload("1", "999999999999.99");
        assert!(price_purchase_lines(&[big.clone()]).is_some());
        assert!(price_purchase_lines(&[big.clone(), big]).is_none());
    }

    #[test]
    fn tiny_quantities_are_rejected() {
        assert!(line_payload("0.0001", "10").validate().is_err());
        assert!(line_payload("0.001", "10").validate().is_ok());
        assert!(line_payload("1", "19.999").validate().is_err());
    }
}

// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::money::{validate_money, validate_stock_quantity, validate_tax_rate};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub unit: String,
    pub sale_price: Decimal,
    // Atualizado pelo "record" da nota de compra
    pub purchase_price: Decimal,
    pub tax_rate: Decimal,
    pub stock_quantity: Decimal,
    pub low_stock_threshold: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload de criação e de atualização (PUT substitui todos os campos).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(length(min = 1, message = "O SKU não pode ser vazio."))]
    pub sku: Option<String>,

    #[validate(length(min = 1, max = 16, message = "Unidade inválida."))]
    pub unit: Option<String>,

    #[validate(custom(function = "validate_money"))]
    #[serde(default)]
    pub sale_price: Decimal,

    #[validate(custom(function = "validate_money"))]
    #[serde(default)]
    pub purchase_price: Decimal,

    #[validate(custom(function = "validate_tax_rate"))]
    #[serde(default)]
    pub tax_rate: Decimal,

    #[validate(custom(function = "validate_stock_quantity"))]
    #[serde(default)]
    pub stock_quantity: Decimal,

    #[validate(custom(function = "validate_stock_quantity"))]
    #[serde(default)]
    pub low_stock_threshold: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn payload() -> ProductPayload {
        serde_json::from_value(serde_json::json!({
            "name": "Caderno 96 folhas",
            "sku": "CAD-96",
            "salePrice": 18.9,
            "taxRate": 12
        }))
        .unwrap()
    }

    #[test]
    fn missing_numbers_default_to_zero() {
        let p = payload();
        assert_eq!(p.stock_quantity, Decimal::ZERO);
        assert_eq!(p.purchase_price, Decimal::ZERO);
        assert_eq!(p.sale_price, d("18.9"));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_negative_prices_and_bad_rates() {
        let mut p = payload();
        p.sale_price = d("-1");
        assert!(p.validate().is_err());

        let mut p = payload();
        p.tax_rate = d("100.01");
        assert!(p.validate().is_err());

        let mut p = payload();
        p.tax_rate = d("100");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_values_the_columns_cannot_hold() {
        let mut p = payload();
        p.sale_price = d("19.999");
        assert!(p.validate().unwrap_err().field_errors().contains_key("sale_price"));

        let mut p = payload();
        p.stock_quantity = d("12.5005");
        assert!(p.validate().is_err());

        let mut p = payload();
        p.stock_quantity = d("12.505");
        assert!(p.validate().is_ok());
    }
}

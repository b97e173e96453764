// src/models/report.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// 1. Resumo do período (os cards do topo)
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub invoice_count: i64,
    pub sales_total: Decimal,
    pub tax_collected: Decimal,
    pub amount_received: Decimal,
    pub receivables_outstanding: Decimal,
    pub purchase_total: Decimal,
    pub payables_outstanding: Decimal,
    pub low_stock_count: i64,
}

// 2. Gráfico de vendas por dia
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailySalesEntry {
    pub date: NaiveDate,
    pub invoice_count: i64,
    pub total: Decimal,
}

// 3. Curva ABC (Top produtos)
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub total_quantity: Decimal,
    pub total_revenue: Decimal,
}

// 4. Estoque baixo
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: Option<String>,
    pub stock_quantity: Decimal,
    pub low_stock_threshold: Decimal,
}

// 5. A receber por cliente
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReceivable {
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub invoice_count: i64,
    pub outstanding: Decimal,
}

pub const DEFAULT_TOP_LIMIT: i64 = 10;
pub const MAX_TOP_LIMIT: i64 = 50;

/// ?from=&to=&limit=
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Só vale para o ranking de produtos.
    pub limit: Option<i64>,
}

impl ReportQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT)
    }

    pub fn has_valid_range(&self) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        }
    }
}

// src/models/financial.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

// Categoria global (restaurant_id nulo) ou do restaurante
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialCategory {
    pub id: Uuid,
    pub restaurant_id: Option<Uuid>,
    #[schema(example = "Fornecedores")]
    pub name: String,
    pub category_type: TransactionType,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: Uuid,
    pub restaurant_id: Option<Uuid>,
    #[schema(example = "Pix")]
    pub name: String,
    #[schema(example = "pix")]
    pub method_type: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTransaction {
    pub id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    #[schema(value_type = f64, example = 250.0)]
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionPayload {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    #[schema(value_type = f64, example = 250.0)]
    pub amount: Decimal,

    pub category_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,

    #[validate(length(max = 500, message = "Descrição muito longa."))]
    pub description: Option<String>,

    #[schema(value_type = Option<String>, example = "2026-10-17")]
    pub transaction_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, max = 120, message = "O nome deve ter entre 1 e 120 caracteres."))]
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryFilter {
    #[serde(rename = "type")]
    pub category_type: Option<TransactionType>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodPayload {
    #[validate(length(min = 1, max = 80, message = "O nome deve ter entre 1 e 80 caracteres."))]
    pub name: String,
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodFilter {
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    pub is_active: Option<bool>,
}

// ---
// Fluxo de caixa
// ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// Totais brutos vindos do banco
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct CashFlowTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub reinforcements: Decimal,
    pub withdrawals: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(value_type = f64)]
    pub total_income: Decimal,
    #[schema(value_type = f64)]
    pub total_expense: Decimal,
    #[schema(value_type = f64)]
    pub total_reinforcements: Decimal,
    #[schema(value_type = f64)]
    pub total_withdrawals: Decimal,
    #[schema(value_type = f64)]
    pub net_cash_flow: Decimal,
}

impl CashFlowReport {
    /// Entradas + reforços − saídas − sangrias.
    pub fn from_totals(start_date: NaiveDate, end_date: NaiveDate, t: CashFlowTotals) -> Self {
        Self {
            start_date,
            end_date,
            total_income: t.income,
            total_expense: t.expense,
            total_reinforcements: t.reinforcements,
            total_withdrawals: t.withdrawals,
            net_cash_flow: t.income + t.reinforcements - t.expense - t.withdrawals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    #[test]
    fn net_cash_flow_combines_all_totals() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 10, 31).unwrap();
        let report = CashFlowReport::from_totals(
            start,
            end,
            CashFlowTotals {
                income: d("1000.00"),
                expense: d("400.00"),
                reinforcements: d("50.00"),
                withdrawals: d("120.50"),
            },
        );
        assert_eq!(report.net_cash_flow, d("529.50"));
        assert_eq!(report.total_withdrawals, d("120.50"));
    }

    #[test]
    fn empty_period_is_zero() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let report = CashFlowReport::from_totals(day, day, CashFlowTotals::default());
        assert_eq!(report.net_cash_flow, Decimal::ZERO);
    }
}

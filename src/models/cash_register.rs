// src/models/cash_register.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cash_movement_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CashMovementType {
    Reinforcement,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cash_session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CashSessionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashRegisterCategory {
    pub id: Uuid,
    pub restaurant_id: Option<Uuid>,
    #[schema(example = "Sangria")]
    pub name: String,
    pub movement_type: CashMovementType,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashRegisterSession {
    pub id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = f64, example = 200.0)]
    pub opening_cash: Decimal,
    pub opening_observations: Option<String>,
    pub opening_time: DateTime<Utc>,
    #[schema(value_type = Option<f64>)]
    pub closing_cash: Option<Decimal>,
    pub closing_observations: Option<String>,
    pub closing_time: Option<DateTime<Utc>>,
    pub status: CashSessionStatus,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashRegisterMovement {
    pub id: Uuid,
    pub session_id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub movement_type: CashMovementType,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Dinheiro esperado na gaveta: abertura + reforços − sangrias.
pub fn expected_closing_cash(opening_cash: Decimal, movements: &[CashRegisterMovement]) -> Decimal {
    movements.iter().fold(opening_cash, |acc, m| match m.movement_type {
        CashMovementType::Reinforcement => acc + m.amount,
        CashMovementType::Withdrawal => acc - m.amount,
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSession {
    #[serde(flatten)]
    pub session: CashRegisterSession,
    pub movements: Vec<CashRegisterMovement>,
    #[schema(value_type = f64)]
    pub expected_cash: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionResult {
    pub session: CashRegisterSession,
    #[schema(value_type = f64)]
    pub expected_cash: Decimal,
    #[schema(value_type = f64)]
    pub difference: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionPayload {
    #[schema(value_type = f64, example = 200.0)]
    pub opening_cash: Decimal,
    pub opening_observations: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashMovementPayload {
    pub session_id: Uuid,
    #[serde(rename = "type")]
    pub movement_type: CashMovementType,
    #[schema(value_type = f64, example = 50.0)]
    pub amount: Decimal,
    pub category_id: Option<Uuid>,
    #[validate(length(max = 500, message = "Observação muito longa."))]
    pub observations: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionPayload {
    #[schema(value_type = f64, example = 330.0)]
    pub closing_cash: Decimal,
    pub closing_observations: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    fn movement(movement_type: CashMovementType, amount: &str) -> CashRegisterMovement {
        CashRegisterMovement {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            user_id: None,
            category_id: None,
            movement_type,
            amount: d(amount),
            observations: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn expected_cash_applies_movements() {
        let movements = vec![
            movement(CashMovementType::Reinforcement, "100.00"),
            movement(CashMovementType::Withdrawal, "30.50"),
            movement(CashMovementType::Withdrawal, "19.50"),
        ];
        assert_eq!(expected_closing_cash(d("200.00"), &movements), d("250.00"));
    }

    #[test]
    fn expected_cash_without_movements_is_opening() {
        assert_eq!(expected_closing_cash(d("75.25"), &[]), d("75.25"));
    }
}

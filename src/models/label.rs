// src/models/label.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::stock::{StockMovement, StockableType};

// Item que pode receber etiqueta (produto ou ingrediente)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelableItem {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: StockableType,
    pub unit_of_measure: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrintedLabel {
    pub id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub labelable_id: Uuid,
    pub labelable_type: StockableType,
    pub item_name: String,
    pub expiration_date: NaiveDate,
    pub quantity_printed: i32,
    pub lot_number: Option<String>,
    pub sif: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub weight: Option<Decimal>,
    pub unit_of_measure: Option<String>,
    pub print_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrintLabelPayload {
    pub labelable_id: Uuid,
    pub labelable_type: StockableType,

    #[schema(value_type = String, example = "2026-12-31")]
    pub expiration_date: NaiveDate,

    #[validate(range(min = 1, max = 1000, message = "A quantidade deve estar entre 1 e 1000."))]
    #[schema(example = 2)]
    pub quantity_printed: i32,

    #[validate(length(max = 60, message = "Lote muito longo."))]
    pub lot_number: Option<String>,

    #[validate(length(max = 60, message = "SIF muito longo."))]
    pub sif: Option<String>,

    #[schema(value_type = Option<f64>)]
    pub weight: Option<Decimal>,

    pub unit_of_measure: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LossRecord {
    pub id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub stockable_id: Uuid,
    pub stockable_type: StockableType,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    pub reason: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LossResult {
    pub loss: LossRecord,
    pub movement: StockMovement,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordLossPayload {
    pub stockable_id: Uuid,
    pub stockable_type: StockableType,

    #[schema(value_type = f64, example = 1.5)]
    pub quantity: Decimal,

    #[validate(length(min = 1, max = 120, message = "O motivo é obrigatório."))]
    #[schema(example = "vencido")]
    pub reason: String,

    pub notes: Option<String>,
}

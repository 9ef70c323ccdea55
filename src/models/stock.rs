// src/models/stock.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Alvo polimórfico de estoque/etiquetas (stockable_type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stockable_type")]
pub enum StockableType {
    Product,
    Ingredient,
}

impl StockableType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Product" | "product" => Some(StockableType::Product),
            "Ingredient" | "ingredient" => Some(StockableType::Ingredient),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_movement_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn classify(quantity: Decimal, min_level: Decimal) -> Self {
        if quantity <= Decimal::ZERO {
            StockStatus::OutOfStock
        } else if quantity <= min_level {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub stockable_id: Uuid,
    pub stockable_type: StockableType,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha de estoque com o nome do item e o nível mínimo
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: Uuid,
    pub stockable_id: Uuid,
    pub stockable_type: StockableType,
    pub name: String,
    pub unit_of_measure: String,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    #[schema(value_type = f64)]
    pub min_stock_level: Decimal,
    #[sqlx(skip)]
    pub status: Option<StockStatus>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    pub fn with_status(mut self) -> Self {
        self.status = Some(StockStatus::classify(self.quantity, self.min_stock_level));
        self
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub stock_id: Uuid,
    pub user_id: Option<Uuid>,
    pub movement_type: MovementType,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    #[schema(value_type = f64)]
    pub quantity_after: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentMovement {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: StockMovement,
    pub item_name: String,
    pub stockable_type: StockableType,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockDashboard {
    pub total_items: usize,
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub alerts: Vec<StockItem>,
    pub recent_movements: Vec<RecentMovement>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementResult {
    pub stock: Stock,
    pub movement: StockMovement,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementPayload {
    pub stockable_id: Uuid,
    pub stockable_type: StockableType,

    #[serde(rename = "type")]
    pub movement_type: MovementType,

    #[schema(value_type = f64, example = 10.0)]
    pub quantity: Decimal,

    pub notes: Option<String>,
}

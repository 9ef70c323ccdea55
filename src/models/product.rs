// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Categorias ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    #[schema(example = "Massas")]
    pub name: String,

    pub description: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 120, message = "O nome deve ter entre 1 e 120 caracteres."))]
    #[schema(example = "Massas")]
    pub name: String,

    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

// --- Produtos ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    pub category_id: Option<Uuid>,

    #[schema(example = "Lasanha à Bolonhesa")]
    pub name: String,

    pub description: Option<String>,

    #[schema(value_type = f64, example = 49.90)]
    pub price: Decimal,

    pub sku: Option<String>,
    pub image_url: Option<String>,

    #[schema(example = "un")]
    pub unit_of_measure: String,

    #[schema(value_type = f64, example = 5.0)]
    pub min_stock_level: Decimal,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, max = 150, message = "O nome deve ter entre 1 e 150 caracteres."))]
    #[schema(example = "Lasanha à Bolonhesa")]
    pub name: String,

    pub description: Option<String>,
    pub category_id: Option<Uuid>,

    #[schema(value_type = f64, example = 49.90)]
    pub price: Decimal,

    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub unit_of_measure: Option<String>,

    #[schema(value_type = Option<f64>)]
    pub min_stock_level: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, max = 150, message = "O nome deve ter entre 1 e 150 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub unit_of_measure: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub min_stock_level: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

// --- Ingredientes ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    #[schema(example = "Farinha de trigo")]
    pub name: String,

    #[schema(example = "kg")]
    pub unit_of_measure: String,

    #[schema(value_type = f64)]
    pub cost_per_unit: Decimal,

    pub supplier: Option<String>,

    #[schema(value_type = f64)]
    pub min_stock_level: Decimal,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngredientPayload {
    #[validate(length(min = 1, max = 150, message = "O nome deve ter entre 1 e 150 caracteres."))]
    #[schema(example = "Farinha de trigo")]
    pub name: String,

    pub unit_of_measure: Option<String>,

    #[schema(value_type = Option<f64>)]
    pub cost_per_unit: Option<Decimal>,

    pub supplier: Option<String>,

    #[schema(value_type = Option<f64>)]
    pub min_stock_level: Option<Decimal>,

    pub is_active: Option<bool>,
}

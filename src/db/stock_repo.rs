// src/db/stock_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::stock::{
    MovementType, RecentMovement, Stock, StockItem, StockMovement, StockableType,
};

// Nome e unidade do item resolvidos pelo tipo polimórfico
const STOCK_ITEM_SELECT: &str = r#"
    SELECT
        s.id, s.stockable_id, s.stockable_type,
        COALESCE(p.name, i.name) AS name,
        COALESCE(p.unit_of_measure, i.unit_of_measure) AS unit_of_measure,
        s.quantity,
        COALESCE(p.min_stock_level, i.min_stock_level, 0) AS min_stock_level,
        s.updated_at
    FROM stocks s
    LEFT JOIN products p ON s.stockable_type = 'Product' AND p.id = s.stockable_id
    LEFT JOIN ingredients i ON s.stockable_type = 'Ingredient' AND i.id = s.stockable_id
    WHERE s.restaurant_id = $1
"#;

#[derive(Clone)]
pub struct StockRepository {
    pool: PgPool,
}

impl StockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list_items(&self, restaurant_id: Uuid) -> Result<Vec<StockItem>, AppError> {
        let sql = format!("{STOCK_ITEM_SELECT} ORDER BY name");
        let items = sqlx::query_as::<_, StockItem>(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Linha de estoque travada para atualização (dentro de transação).
    pub async fn lock_stock<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        stockable_type: StockableType,
        stockable_id: Uuid,
    ) -> Result<Option<Stock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, Stock>(
            r#"
            SELECT * FROM stocks
            WHERE restaurant_id = $1 AND stockable_type = $2 AND stockable_id = $3
            FOR UPDATE
            "#,
        )
        .bind(restaurant_id)
        .bind(stockable_type)
        .bind(stockable_id)
        .fetch_optional(executor)
        .await?;
        Ok(stock)
    }

    /// Cria a linha zerada se ainda não existir; concorrência resolvida pelo UNIQUE.
    pub async fn ensure_stock<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        stockable_type: StockableType,
        stockable_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO stocks (restaurant_id, stockable_type, stockable_id, quantity)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (restaurant_id, stockable_type, stockable_id) DO NOTHING
            "#,
        )
        .bind(restaurant_id)
        .bind(stockable_type)
        .bind(stockable_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn set_quantity<'e, E>(&self, executor: E, stock_id: Uuid, quantity: Decimal) -> Result<Stock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, Stock>(
            "UPDATE stocks SET quantity = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(stock_id)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(stock)
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        stock: &Stock,
        user_id: Option<Uuid>,
        movement_type: MovementType,
        quantity: Decimal,
        notes: Option<&str>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (restaurant_id, stock_id, user_id, movement_type, quantity, quantity_after, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(stock.restaurant_id)
        .bind(stock.id)
        .bind(user_id)
        .bind(movement_type)
        .bind(quantity)
        .bind(stock.quantity)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn history(
        &self,
        restaurant_id: Uuid,
        stockable_type: StockableType,
        stockable_id: Uuid,
    ) -> Result<Vec<StockMovement>, AppError> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT m.* FROM stock_movements m
            JOIN stocks s ON s.id = m.stock_id
            WHERE s.restaurant_id = $1 AND s.stockable_type = $2 AND s.stockable_id = $3
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(stockable_type)
        .bind(stockable_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }

    pub async fn recent_movements(&self, restaurant_id: Uuid, limit: i64) -> Result<Vec<RecentMovement>, AppError> {
        let movements = sqlx::query_as::<_, RecentMovement>(
            r#"
            SELECT m.*, COALESCE(p.name, i.name, '') AS item_name, s.stockable_type
            FROM stock_movements m
            JOIN stocks s ON s.id = m.stock_id
            LEFT JOIN products p ON s.stockable_type = 'Product' AND p.id = s.stockable_id
            LEFT JOIN ingredients i ON s.stockable_type = 'Ingredient' AND i.id = s.stockable_id
            WHERE m.restaurant_id = $1
            ORDER BY m.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(restaurant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }
}

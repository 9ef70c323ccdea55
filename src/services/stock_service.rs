// src/services/stock_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ProductRepository, StockRepository},
    models::stock::{
        MovementResult, MovementType, StockDashboard, StockItem, StockMovement, StockMovementPayload, StockStatus,
        StockableType,
    },
};

const RECENT_MOVEMENTS: i64 = 5;

/// Saldo após a movimentação. `adjustment` define o valor absoluto.
pub fn apply_movement(current: Decimal, movement_type: MovementType, quantity: Decimal) -> Result<Decimal, AppError> {
    if quantity <= Decimal::ZERO {
        return Err(AppError::BadRequest("stock.invalid_quantity"));
    }

    match movement_type {
        MovementType::In => Ok(current + quantity),
        MovementType::Out => {
            let remaining = current - quantity;
            if remaining.is_sign_negative() && !remaining.is_zero() {
                return Err(AppError::BadRequest("stock.insufficient"));
            }
            Ok(remaining)
        }
        MovementType::Adjustment => Ok(quantity),
    }
}

/// Totais por situação; os alertas são os itens baixos ou zerados.
pub fn summarize(items: Vec<StockItem>) -> (usize, usize, usize, Vec<StockItem>) {
    let (mut in_stock, mut low, mut out) = (0, 0, 0);
    let mut alerts = Vec::new();

    for item in items {
        match StockStatus::classify(item.quantity, item.min_stock_level) {
            StockStatus::InStock => in_stock += 1,
            StockStatus::LowStock => {
                low += 1;
                alerts.push(item.with_status());
            }
            StockStatus::OutOfStock => {
                out += 1;
                alerts.push(item.with_status());
            }
        }
    }

    (in_stock, low, out, alerts)
}

#[derive(Clone)]
pub struct StockService {
    repo: StockRepository,
    product_repo: ProductRepository,
}

impl StockService {
    pub fn new(repo: StockRepository, product_repo: ProductRepository) -> Self {
        Self { repo, product_repo }
    }

    pub fn product_repo(&self) -> &ProductRepository {
        &self.product_repo
    }

    pub async fn list(&self, restaurant_id: Uuid) -> Result<Vec<StockItem>, AppError> {
        let items = self.repo.list_items(restaurant_id).await?;
        Ok(items.into_iter().map(StockItem::with_status).collect())
    }

    pub async fn move_stock<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        user_id: Uuid,
        payload: &StockMovementPayload,
    ) -> Result<MovementResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let result = self
            .apply_in_tx(
                &mut *tx,
                restaurant_id,
                Some(user_id),
                payload.stockable_type,
                payload.stockable_id,
                payload.movement_type,
                payload.quantity,
                payload.notes.as_deref(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            %restaurant_id,
            stock_id = %result.stock.id,
            movement = ?result.movement.movement_type,
            quantity_after = %result.stock.quantity,
            "Movimentação de estoque registrada"
        );
        Ok(result)
    }

    /// Movimenta dentro de uma transação já aberta (usado também pelo registro de perdas).
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_in_tx(
        &self,
        conn: &mut PgConnection,
        restaurant_id: Uuid,
        user_id: Option<Uuid>,
        stockable_type: StockableType,
        stockable_id: Uuid,
        movement_type: MovementType,
        quantity: Decimal,
        notes: Option<&str>,
    ) -> Result<MovementResult, AppError> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::BadRequest("stock.invalid_quantity"));
        }

        self.product_repo
            .find_stockable(&mut *conn, restaurant_id, stockable_type, stockable_id)
            .await?
            .ok_or(AppError::NotFound("stock.item_not_found"))?;

        // A linha de estoque nasce na primeira movimentação
        self.repo
            .ensure_stock(&mut *conn, restaurant_id, stockable_type, stockable_id)
            .await?;

        let stock = self
            .repo
            .lock_stock(&mut *conn, restaurant_id, stockable_type, stockable_id)
            .await?
            .ok_or(AppError::NotFound("stock.item_not_found"))?;

        let new_quantity = apply_movement(stock.quantity, movement_type, quantity)?;
        let stock = self.repo.set_quantity(&mut *conn, stock.id, new_quantity).await?;

        let movement = self
            .repo
            .insert_movement(&mut *conn, &stock, user_id, movement_type, quantity, notes)
            .await?;

        Ok(MovementResult { stock, movement })
    }

    pub async fn history(
        &self,
        restaurant_id: Uuid,
        stockable_type: StockableType,
        stockable_id: Uuid,
    ) -> Result<Vec<StockMovement>, AppError> {
        self.repo.history(restaurant_id, stockable_type, stockable_id).await
    }

    pub async fn dashboard(&self, restaurant_id: Uuid) -> Result<StockDashboard, AppError> {
        let items = self.repo.list_items(restaurant_id).await?;
        let total_items = items.len();
        let (in_stock, low_stock, out_of_stock, alerts) = summarize(items);
        let recent_movements = self.repo.recent_movements(restaurant_id, RECENT_MOVEMENTS).await?;

        Ok(StockDashboard {
            total_items,
            in_stock,
            low_stock,
            out_of_stock,
            alerts,
            recent_movements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(name: &str, quantity: &str, min: &str) -> StockItem {
        StockItem {
            id: Uuid::new_v4(),
            stockable_id: Uuid::new_v4(),
            stockable_type: StockableType::Ingredient,
            name: name.into(),
            unit_of_measure: "kg".into(),
            quantity: d(quantity),
            min_stock_level: d(min),
            status: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn entry_adds_and_exit_subtracts() {
        assert_eq!(apply_movement(d("10"), MovementType::In, d("2.5")).unwrap(), d("12.5"));
        assert_eq!(apply_movement(d("10"), MovementType::Out, d("4")).unwrap(), d("6"));
        assert_eq!(apply_movement(d("4"), MovementType::Out, d("4")).unwrap(), d("0"));
    }

    #[test]
    fn exit_below_zero_is_rejected() {
        assert!(matches!(
            apply_movement(d("3"), MovementType::Out, d("3.01")),
            Err(AppError::BadRequest("stock.insufficient"))
        ));
    }

    #[test]
    fn adjustment_sets_absolute_value() {
        assert_eq!(apply_movement(d("10"), MovementType::Adjustment, d("7")).unwrap(), d("7"));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        for qty in ["0", "-1"] {
            assert!(matches!(
                apply_movement(d("10"), MovementType::In, d(qty)),
                Err(AppError::BadRequest("stock.invalid_quantity"))
            ));
        }
    }

    #[test]
    fn summary_counts_each_status() {
        let (in_stock, low, out, alerts) = summarize(vec![
            item("Farinha", "20", "5"),
            item("Açúcar", "5", "5"),
            item("Sal", "0", "1"),
        ]);

        assert_eq!((in_stock, low, out), (1, 1, 1));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].status, Some(StockStatus::LowStock));
        assert_eq!(alerts[1].status, Some(StockStatus::OutOfStock));
    }
}

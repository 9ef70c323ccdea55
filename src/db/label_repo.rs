// src/db/label_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::label::{LossRecord, PrintLabelPayload, PrintedLabel, RecordLossPayload};

#[derive(Clone)]
pub struct LabelRepository {
    pool: PgPool,
}

impl LabelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create_printed(
        &self,
        restaurant_id: Uuid,
        user_id: Uuid,
        item_name: &str,
        payload: &PrintLabelPayload,
    ) -> Result<PrintedLabel, AppError> {
        let label = sqlx::query_as::<_, PrintedLabel>(
            r#"
            INSERT INTO printed_labels
                (restaurant_id, user_id, labelable_id, labelable_type, item_name, expiration_date,
                 quantity_printed, lot_number, sif, weight, unit_of_measure)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .bind(payload.labelable_id)
        .bind(payload.labelable_type)
        .bind(item_name)
        .bind(payload.expiration_date)
        .bind(payload.quantity_printed)
        .bind(payload.lot_number.as_deref())
        .bind(payload.sif.as_deref())
        .bind(payload.weight)
        .bind(payload.unit_of_measure.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(label)
    }

    pub async fn find_printed(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<PrintedLabel>, AppError> {
        let label = sqlx::query_as::<_, PrintedLabel>(
            "SELECT * FROM printed_labels WHERE id = $1 AND restaurant_id = $2",
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(label)
    }

    pub async fn list_printed(&self, restaurant_id: Uuid) -> Result<Vec<PrintedLabel>, AppError> {
        let labels = sqlx::query_as::<_, PrintedLabel>(
            "SELECT * FROM printed_labels WHERE restaurant_id = $1 ORDER BY print_date DESC LIMIT 100",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(labels)
    }

    pub async fn create_loss<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        user_id: Uuid,
        payload: &RecordLossPayload,
    ) -> Result<LossRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, LossRecord>(
            r#"
            INSERT INTO loss_records (restaurant_id, user_id, stockable_id, stockable_type, quantity, reason, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .bind(payload.stockable_id)
        .bind(payload.stockable_type)
        .bind(payload.quantity)
        .bind(&payload.reason)
        .bind(payload.notes.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(record)
    }
}

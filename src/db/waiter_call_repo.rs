// src/db/waiter_call_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::waiter_call::{WaiterCall, WaiterCallStatus};

#[derive(Clone)]
pub struct WaiterCallRepository {
    pool: PgPool,
}

impl WaiterCallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, restaurant_id: Uuid, table_number: &str, call_type: &str) -> Result<WaiterCall, AppError> {
        let call = sqlx::query_as::<_, WaiterCall>(
            r#"
            INSERT INTO waiter_calls (restaurant_id, table_number, call_type)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(table_number)
        .bind(call_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(call)
    }

    pub async fn list(&self, restaurant_id: Uuid, status: Option<WaiterCallStatus>) -> Result<Vec<WaiterCall>, AppError> {
        let calls = sqlx::query_as::<_, WaiterCall>(
            r#"
            SELECT * FROM waiter_calls
            WHERE restaurant_id = $1 AND ($2::waiter_call_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(calls)
    }

    pub async fn update_status(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        status: WaiterCallStatus,
        attended_by: Option<Uuid>,
    ) -> Result<Option<WaiterCall>, AppError> {
        let call = sqlx::query_as::<_, WaiterCall>(
            r#"
            UPDATE waiter_calls SET status = $3, attended_by = COALESCE($4, attended_by), updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(status)
        .bind(attended_by)
        .fetch_optional(&self.pool)
        .await?;
        Ok(call)
    }
}

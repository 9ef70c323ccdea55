// src/db/reward_repo.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::reward::{CreateRewardPayload, Reward, TypeCount, UpdateRewardPayload};

#[derive(Clone)]
pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list(&self, restaurant_id: Uuid, active_only: bool) -> Result<Vec<Reward>, AppError> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT * FROM rewards
            WHERE restaurant_id = $1 AND ($2 = FALSE OR is_active)
            ORDER BY created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rewards)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<Option<Reward>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reward = sqlx::query_as::<_, Reward>("SELECT * FROM rewards WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .fetch_optional(executor)
            .await?;
        Ok(reward)
    }

    /// Trava a recompensa para atualizar usos e analytics sem corrida.
    pub async fn lock<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<Option<Reward>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reward = sqlx::query_as::<_, Reward>(
            "SELECT * FROM rewards WHERE id = $1 AND restaurant_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(executor)
        .await?;
        Ok(reward)
    }

    pub async fn create(
        &self,
        restaurant_id: Uuid,
        created_by: Uuid,
        payload: &CreateRewardPayload,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<Reward, AppError> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            INSERT INTO rewards
                (restaurant_id, customer_id, created_by, title, description, reward_type, value, is_active,
                 valid_from, valid_until, days_valid, coupon_validity_days, total_uses_limit,
                 max_uses_per_customer, trigger_conditions, wheel_config)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, TRUE), $9, $10, $11, $12, $13, $14,
                    COALESCE($15, '{}'::jsonb), $16)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(payload.customer_id)
        .bind(created_by)
        .bind(&payload.title)
        .bind(payload.description.as_deref())
        .bind(payload.reward_type)
        .bind(payload.value)
        .bind(payload.is_active)
        .bind(payload.valid_from)
        .bind(valid_until)
        .bind(payload.days_valid)
        .bind(payload.coupon_validity_days)
        .bind(payload.total_uses_limit)
        .bind(payload.max_uses_per_customer)
        .bind(payload.trigger_conditions.as_ref())
        .bind(payload.wheel_config.as_ref())
        .fetch_one(&self.pool)
        .await?;
        Ok(reward)
    }

    pub async fn update(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &UpdateRewardPayload,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<Option<Reward>, AppError> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            UPDATE rewards SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                value = COALESCE($5, value),
                is_active = COALESCE($6, is_active),
                valid_from = COALESCE($7, valid_from),
                valid_until = COALESCE($8, valid_until),
                days_valid = COALESCE($9, days_valid),
                coupon_validity_days = COALESCE($10, coupon_validity_days),
                total_uses_limit = COALESCE($11, total_uses_limit),
                max_uses_per_customer = COALESCE($12, max_uses_per_customer),
                trigger_conditions = COALESCE($13, trigger_conditions),
                wheel_config = COALESCE($14, wheel_config),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(payload.title.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.value)
        .bind(payload.is_active)
        .bind(payload.valid_from)
        .bind(valid_until)
        .bind(payload.days_valid)
        .bind(payload.coupon_validity_days)
        .bind(payload.total_uses_limit)
        .bind(payload.max_uses_per_customer)
        .bind(payload.trigger_conditions.as_ref())
        .bind(payload.wheel_config.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(reward)
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM rewards WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn increment_uses<'e, E>(&self, executor: E, id: Uuid, analytics: &Value) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE rewards SET current_uses = current_uses + 1, analytics = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(analytics)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn set_analytics<'e, E>(&self, executor: E, id: Uuid, analytics: &Value) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE rewards SET analytics = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(analytics)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Analytics
    // ---

    /// (total, ativas)
    pub async fn counts(&self, restaurant_id: Uuid) -> Result<(i64, i64), AppError> {
        let row = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM rewards WHERE restaurant_id = $1",
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count_by_type(&self, restaurant_id: Uuid) -> Result<Vec<TypeCount>, AppError> {
        let rows = sqlx::query_as::<_, TypeCount>(
            r#"
            SELECT reward_type, COUNT(*) AS count FROM rewards
            WHERE restaurant_id = $1
            GROUP BY reward_type
            ORDER BY count DESC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// src/db/cash_register_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::on_unique_violation, error::AppError};
use crate::models::cash_register::{
    CashMovementPayload, CashRegisterCategory, CashRegisterMovement, CashRegisterSession,
};

#[derive(Clone)]
pub struct CashRegisterRepository {
    pool: PgPool,
}

impl CashRegisterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_open_session(&self, restaurant_id: Uuid, user_id: Uuid) -> Result<Option<CashRegisterSession>, AppError> {
        let session = sqlx::query_as::<_, CashRegisterSession>(
            r#"
            SELECT * FROM cash_register_sessions
            WHERE restaurant_id = $1 AND user_id = $2 AND status = 'open'
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn find_session(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<CashRegisterSession>, AppError> {
        let session = sqlx::query_as::<_, CashRegisterSession>(
            "SELECT * FROM cash_register_sessions WHERE id = $1 AND restaurant_id = $2",
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// Trava a sessão até o fim da transação (movimentos e fechamento não se cruzam).
    pub async fn lock_session<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<Option<CashRegisterSession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, CashRegisterSession>(
            "SELECT * FROM cash_register_sessions WHERE id = $1 AND restaurant_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(executor)
        .await?;
        Ok(session)
    }

    pub async fn lock_open_session<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CashRegisterSession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, CashRegisterSession>(
            r#"
            SELECT * FROM cash_register_sessions
            WHERE restaurant_id = $1 AND user_id = $2 AND status = 'open'
            FOR UPDATE
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(session)
    }

    /// O índice parcial garante uma sessão aberta por usuário e restaurante.
    pub async fn open_session(
        &self,
        restaurant_id: Uuid,
        user_id: Uuid,
        opening_cash: Decimal,
        observations: Option<&str>,
    ) -> Result<CashRegisterSession, AppError> {
        sqlx::query_as::<_, CashRegisterSession>(
            r#"
            INSERT INTO cash_register_sessions (restaurant_id, user_id, opening_cash, opening_observations)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .bind(opening_cash)
        .bind(observations)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match on_unique_violation(e, "cash_register.session_already_open") {
            AppError::Conflict(key) => AppError::BadRequest(key),
            other => other,
        })
    }

    pub async fn close_session<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        closing_cash: Decimal,
        observations: Option<&str>,
    ) -> Result<Option<CashRegisterSession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, CashRegisterSession>(
            r#"
            UPDATE cash_register_sessions SET
                closing_cash = $2, closing_observations = $3, closing_time = NOW(), status = 'closed'
            WHERE id = $1 AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(closing_cash)
        .bind(observations)
        .fetch_optional(executor)
        .await?;
        Ok(session)
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        user_id: Uuid,
        payload: &CashMovementPayload,
    ) -> Result<CashRegisterMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, CashRegisterMovement>(
            r#"
            INSERT INTO cash_register_movements
                (session_id, restaurant_id, user_id, category_id, movement_type, amount, observations)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(payload.session_id)
        .bind(restaurant_id)
        .bind(user_id)
        .bind(payload.category_id)
        .bind(payload.movement_type)
        .bind(payload.amount)
        .bind(payload.observations.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn list_movements<'e, E>(&self, executor: E, session_id: Uuid) -> Result<Vec<CashRegisterMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, CashRegisterMovement>(
            "SELECT * FROM cash_register_movements WHERE session_id = $1 ORDER BY created_at ASC",
        )
        .bind(session_id)
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }

    pub async fn list_categories(&self, restaurant_id: Uuid) -> Result<Vec<CashRegisterCategory>, AppError> {
        let categories = sqlx::query_as::<_, CashRegisterCategory>(
            r#"
            SELECT * FROM cash_register_categories
            WHERE restaurant_id IS NULL OR restaurant_id = $1
            ORDER BY movement_type, name
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }
}

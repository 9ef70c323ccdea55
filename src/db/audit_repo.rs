// src/db/audit_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::audit::AuditLog};

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        actor_user_id: Option<Uuid>,
        restaurant_id: Option<Uuid>,
        action: &str,
        resource: &str,
        payload: &Value,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (actor_user_id, restaurant_id, action, resource, payload)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(actor_user_id)
        .bind(restaurant_id)
        .bind(action)
        .bind(resource)
        .bind(payload)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_for_restaurant(&self, restaurant_id: Uuid, limit: i64, offset: i64) -> Result<(Vec<AuditLog>, i64), AppError> {
        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT * FROM audit_logs
            WHERE restaurant_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(restaurant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs WHERE restaurant_id = $1")
            .bind(restaurant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((logs, total))
    }
}

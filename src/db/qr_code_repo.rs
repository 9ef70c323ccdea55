// src/db/qr_code_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::on_unique_violation, error::AppError};
use crate::models::qr_code::{CreateQrCodePayload, QrCode, QrCodeType, UpdateQrCodePayload};

#[derive(Clone)]
pub struct QrCodeRepository {
    pool: PgPool,
}

impl QrCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Quais dos códigos curtos candidatos já estão em uso.
    pub async fn taken_short_codes<'e, E>(&self, executor: E, codes: &[String]) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken = sqlx::query_scalar::<_, String>("SELECT short_code FROM qr_codes WHERE short_code = ANY($1)")
            .bind(codes)
            .fetch_all(executor)
            .await?;
        Ok(taken)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        payload: &CreateQrCodePayload,
        short_code: &str,
        target_url: &str,
        created_by: Uuid,
    ) -> Result<QrCode, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, QrCode>(
            r#"
            INSERT INTO qr_codes (
                restaurant_id, qr_type, table_number, table_name, location_description,
                capacity, short_code, target_url, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(payload.qr_type)
        .bind(payload.table_number)
        .bind(payload.table_name.as_deref())
        .bind(payload.location_description.as_deref())
        .bind(payload.capacity)
        .bind(short_code)
        .bind(target_url)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| on_unique_violation(e, "qrcode.already_exists"))
    }

    pub async fn list(&self, restaurant_id: Uuid, qr_type: Option<QrCodeType>) -> Result<Vec<QrCode>, AppError> {
        let codes = sqlx::query_as::<_, QrCode>(
            r#"
            SELECT * FROM qr_codes
            WHERE restaurant_id = $1 AND ($2::qr_code_type IS NULL OR qr_type = $2)
            ORDER BY qr_type, table_number NULLS FIRST, created_at
            "#,
        )
        .bind(restaurant_id)
        .bind(qr_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(codes)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<Option<QrCode>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let code = sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .fetch_optional(executor)
            .await?;
        Ok(code)
    }

    pub async fn find_active_by_short_code(&self, short_code: &str) -> Result<Option<QrCode>, AppError> {
        let code = sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE short_code = $1 AND is_active")
            .bind(short_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(code)
    }

    pub async fn update(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &UpdateQrCodePayload,
    ) -> Result<Option<QrCode>, AppError> {
        let code = sqlx::query_as::<_, QrCode>(
            r#"
            UPDATE qr_codes SET
                table_name = COALESCE($3, table_name),
                location_description = COALESCE($4, location_description),
                capacity = COALESCE($5, capacity),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(payload.table_name.as_deref())
        .bind(payload.location_description.as_deref())
        .bind(payload.capacity)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(code)
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM qr_codes WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn record_scan(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE qr_codes SET total_scans = total_scans + 1, last_scan = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_feedback<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE qr_codes SET total_feedbacks = total_feedbacks + 1, last_feedback = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

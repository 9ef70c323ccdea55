// src/db/feedback_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::feedback::{
    Feedback, FeedbackDetails, FeedbackPriority, FeedbackSource, FeedbackStatus, FeedbackType,
};

const DETAILS_SELECT: &str = r#"
    SELECT f.*, cu.name AS customer_name, cu.phone AS customer_phone
    FROM feedbacks f
    LEFT JOIN customers cu ON cu.id = f.customer_id
"#;

// Avaliação já validada e resolvida pelo serviço
#[derive(Debug)]
pub struct NewFeedback<'a> {
    pub restaurant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub qr_code_id: Option<Uuid>,
    pub rating: i32,
    pub nps_score: Option<i32>,
    pub comment: Option<&'a str>,
    pub feedback_type: FeedbackType,
    pub source: FeedbackSource,
    pub table_number: Option<i32>,
    pub priority: FeedbackPriority,
}

// Filtros da listagem do painel
#[derive(Debug, Default)]
pub struct FeedbackQuery {
    pub status: Option<FeedbackStatus>,
    pub priority: Option<FeedbackPriority>,
    pub source: Option<FeedbackSource>,
    pub rating: Option<i32>,
}

#[derive(Clone)]
pub struct FeedbackRepository {
    pool: PgPool,
}

impl FeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert<'e, E>(&self, executor: E, feedback: &NewFeedback<'_>) -> Result<Feedback, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedbacks (
                restaurant_id, customer_id, qr_code_id, rating, nps_score, comment,
                feedback_type, source, table_number, priority
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(feedback.restaurant_id)
        .bind(feedback.customer_id)
        .bind(feedback.qr_code_id)
        .bind(feedback.rating)
        .bind(feedback.nps_score)
        .bind(feedback.comment)
        .bind(feedback.feedback_type)
        .bind(feedback.source)
        .bind(feedback.table_number)
        .bind(feedback.priority)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    pub async fn list(
        &self,
        restaurant_id: Uuid,
        query: &FeedbackQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<FeedbackDetails>, i64), AppError> {
        let filter = "WHERE f.restaurant_id = $1 \
                      AND ($2::feedback_status IS NULL OR f.status = $2) \
                      AND ($3::feedback_priority IS NULL OR f.priority = $3) \
                      AND ($4::feedback_source IS NULL OR f.source = $4) \
                      AND ($5::int IS NULL OR f.rating = $5)";

        let sql = format!("{DETAILS_SELECT} {filter} ORDER BY f.created_at DESC LIMIT $6 OFFSET $7");
        let feedbacks = sqlx::query_as::<_, FeedbackDetails>(&sql)
            .bind(restaurant_id)
            .bind(query.status)
            .bind(query.priority)
            .bind(query.source)
            .bind(query.rating)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM feedbacks f {filter}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(restaurant_id)
            .bind(query.status)
            .bind(query.priority)
            .bind(query.source)
            .bind(query.rating)
            .fetch_one(&self.pool)
            .await?;

        Ok((feedbacks, total))
    }

    pub async fn find_details(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<FeedbackDetails>, AppError> {
        let sql = format!("{DETAILS_SELECT} WHERE f.id = $1 AND f.restaurant_id = $2");
        let feedback = sqlx::query_as::<_, FeedbackDetails>(&sql)
            .bind(id)
            .bind(restaurant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(feedback)
    }

    pub async fn update(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        status: Option<FeedbackStatus>,
        priority: Option<FeedbackPriority>,
        internal_notes: Option<&str>,
    ) -> Result<Option<Feedback>, AppError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            UPDATE feedbacks SET
                status = COALESCE($3, status),
                priority = COALESCE($4, priority),
                internal_notes = COALESCE($5, internal_notes),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(status)
        .bind(priority)
        .bind(internal_notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(feedback)
    }

    /// Grava a resposta da equipe e marca a avaliação como respondida.
    pub async fn respond(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        response_text: &str,
        responded_by: Uuid,
    ) -> Result<Option<Feedback>, AppError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            UPDATE feedbacks SET
                response_text = $3,
                response_date = NOW(),
                responded_by = $4,
                status = 'responded',
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(response_text)
        .bind(responded_by)
        .fetch_optional(&self.pool)
        .await?;
        Ok(feedback)
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM feedbacks WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn average_rating_for_qr_code(&self, qr_code_id: Uuid) -> Result<Option<f64>, AppError> {
        let average = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(rating)::float8 FROM feedbacks WHERE qr_code_id = $1",
        )
        .bind(qr_code_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(average)
    }
}

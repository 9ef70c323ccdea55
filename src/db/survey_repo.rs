// src/db/survey_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::survey::{
    AnswerCount, Question, QuestionPayload, QuestionTypeCount, Survey, SurveyResponse, SurveyStatus,
};

#[derive(Clone)]
pub struct SurveyRepository {
    pool: PgPool,
}

impl SurveyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list(&self, restaurant_id: Uuid, status: Option<SurveyStatus>) -> Result<Vec<Survey>, AppError> {
        let surveys = sqlx::query_as::<_, Survey>(
            r#"
            SELECT * FROM surveys
            WHERE restaurant_id = $1 AND ($2::survey_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(surveys)
    }

    pub async fn find_by_id(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<Survey>, AppError> {
        let survey = sqlx::query_as::<_, Survey>("SELECT * FROM surveys WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(survey)
    }

    pub async fn questions(&self, survey_id: Uuid) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE survey_id = $1 ORDER BY order_index, id",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        created_by: Uuid,
        title: &str,
        description: Option<&str>,
        status: SurveyStatus,
    ) -> Result<Survey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let survey = sqlx::query_as::<_, Survey>(
            r#"
            INSERT INTO surveys (restaurant_id, created_by, title, description, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(created_by)
        .bind(title)
        .bind(description)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(survey)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        status: Option<SurveyStatus>,
    ) -> Result<Option<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let survey = sqlx::query_as::<_, Survey>(
            r#"
            UPDATE surveys SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(title)
        .bind(description)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(survey)
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM surveys WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_questions<'e, E>(&self, executor: E, survey_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM questions WHERE survey_id = $1")
            .bind(survey_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_question<'e, E>(
        &self,
        executor: E,
        survey_id: Uuid,
        position: i32,
        question: &QuestionPayload,
    ) -> Result<Question, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let options = Value::from(question.options.clone());
        let created = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (survey_id, question_text, question_type, options, is_required, order_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(survey_id)
        .bind(&question.question_text)
        .bind(question.question_type)
        .bind(options)
        .bind(question.is_required)
        .bind(question.order_index.unwrap_or(position))
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    // ---
    // Respostas
    // ---

    pub async fn find_active_public(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<Survey>, AppError> {
        let survey = sqlx::query_as::<_, Survey>(
            "SELECT * FROM surveys WHERE id = $1 AND restaurant_id = $2 AND status = 'active'",
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(survey)
    }

    pub async fn create_response<'e, E>(
        &self,
        executor: E,
        survey_id: Uuid,
        restaurant_id: Uuid,
        customer_id: Option<Uuid>,
    ) -> Result<SurveyResponse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let response = sqlx::query_as::<_, SurveyResponse>(
            r#"
            INSERT INTO survey_responses (survey_id, restaurant_id, customer_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(survey_id)
        .bind(restaurant_id)
        .bind(customer_id)
        .fetch_one(executor)
        .await?;
        Ok(response)
    }

    pub async fn insert_answer<'e, E>(
        &self,
        executor: E,
        response_id: Uuid,
        question_id: Uuid,
        value: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO answers (survey_response_id, question_id, value) VALUES ($1, $2, $3)")
            .bind(response_id)
            .bind(question_id)
            .bind(value)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Analytics (por pesquisa)
    // ---

    pub async fn count_responses(&self, survey_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM survey_responses WHERE survey_id = $1")
            .bind(survey_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn answers_by_type(&self, survey_id: Uuid) -> Result<Vec<QuestionTypeCount>, AppError> {
        let rows = sqlx::query_as::<_, QuestionTypeCount>(
            r#"
            SELECT q.question_type, COUNT(a.id) AS count
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.survey_id = $1
            GROUP BY q.question_type
            "#,
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn nps_values(&self, survey_id: Uuid) -> Result<Vec<i32>, AppError> {
        let values = sqlx::query_scalar::<_, String>(
            r#"
            SELECT a.value FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.survey_id = $1 AND q.question_type = 'nps'
            "#,
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(values.iter().filter_map(|v| v.parse().ok()).collect())
    }

    pub async fn distribution(&self, question_id: Uuid) -> Result<Vec<AnswerCount>, AppError> {
        let rows = sqlx::query_as::<_, AnswerCount>(
            r#"
            SELECT value, COUNT(*) AS count FROM answers
            WHERE question_id = $1
            GROUP BY value
            ORDER BY count DESC, value
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

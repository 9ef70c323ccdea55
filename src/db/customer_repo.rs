// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::on_unique_violation, error::AppError};
use crate::models::{
    checkin::Checkin,
    coupon::Coupon,
    customer::{CreateCustomerPayload, Customer, UpdateCustomerPayload},
    feedback::Feedback,
    survey::SurveyResponse,
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND restaurant_id = $2",
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    /// Trava a linha do cliente até o fim da transação (serializa check-ins simultâneos).
    pub async fn lock<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND restaurant_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn find_by_phone<'e, E>(&self, executor: E, restaurant_id: Uuid, phone: &str) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE restaurant_id = $1 AND phone = $2",
        )
        .bind(restaurant_id)
        .bind(phone)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn find_by_cpf<'e, E>(&self, executor: E, restaurant_id: Uuid, cpf: &str) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE restaurant_id = $1 AND cpf = $2",
        )
        .bind(restaurant_id)
        .bind(cpf)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn list(
        &self,
        restaurant_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Customer>, i64), AppError> {
        let pattern = search.map(|s| format!("%{s}%"));

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE restaurant_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2 OR phone ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(restaurant_id)
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE restaurant_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2 OR phone ILIKE $2)
            "#,
        )
        .bind(restaurant_id)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((customers, total))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        payload: &CreateCustomerPayload,
        source: &str,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (restaurant_id, name, email, phone, whatsapp, cpf, birth_date, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(&payload.name)
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.whatsapp.as_deref())
        .bind(payload.cpf.as_deref())
        .bind(payload.birth_date)
        .bind(source)
        .fetch_one(executor)
        .await
        .map_err(|e| on_unique_violation(e, "customer.already_exists"))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                whatsapp = COALESCE($6, whatsapp),
                cpf = COALESCE($7, cpf),
                birth_date = COALESCE($8, birth_date),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(payload.name.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.whatsapp.as_deref())
        .bind(payload.cpf.as_deref())
        .bind(payload.birth_date)
        .fetch_optional(executor)
        .await
        .map_err(|e| on_unique_violation(e, "customer.already_exists"))
    }

    pub async fn rename<'e, E>(&self, executor: E, id: Uuid, name: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE customers SET name = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Conta uma visita e devolve o novo total.
    pub async fn register_visit<'e, E>(&self, executor: E, id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE customers SET total_visits = total_visits + 1, last_visit = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING total_visits
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("customer.not_found"))?;
        Ok(total)
    }

    pub async fn add_loyalty_points<'e, E>(&self, executor: E, id: Uuid, points: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE customers SET loyalty_points = loyalty_points + $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(points)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn increment_survey_responses<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE customers SET survey_responses_count = survey_responses_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Remove o cliente; check-ins e cupons saem em cascata, respostas e avaliações ficam sem vínculo.
    pub async fn delete<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn reset_visits<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET total_visits = 0, updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn clear_checkins<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM checkins WHERE customer_id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Clientes nascidos no mês; o dia exato é conferido no serviço.
    pub async fn born_in_month(&self, restaurant_id: Uuid, month: i32) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE restaurant_id = $1 AND birth_date IS NOT NULL
              AND EXTRACT(MONTH FROM birth_date)::int = $2
            ORDER BY name
            "#,
        )
        .bind(restaurant_id)
        .bind(month)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    // ---
    // Histórico da ficha do cliente
    // ---

    pub async fn recent_checkins(&self, restaurant_id: Uuid, id: Uuid, limit: i64) -> Result<Vec<Checkin>, AppError> {
        let checkins = sqlx::query_as::<_, Checkin>(
            r#"
            SELECT * FROM checkins
            WHERE customer_id = $1 AND restaurant_id = $2
            ORDER BY checkin_time DESC
            LIMIT $3
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(checkins)
    }

    pub async fn redeemed_coupons(&self, restaurant_id: Uuid, id: Uuid, limit: i64) -> Result<Vec<Coupon>, AppError> {
        let coupons = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT * FROM coupons
            WHERE customer_id = $1 AND restaurant_id = $2 AND status = 'redeemed'
            ORDER BY redeemed_at DESC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(coupons)
    }

    pub async fn survey_responses(&self, restaurant_id: Uuid, id: Uuid, limit: i64) -> Result<Vec<SurveyResponse>, AppError> {
        let responses = sqlx::query_as::<_, SurveyResponse>(
            r#"
            SELECT * FROM survey_responses
            WHERE customer_id = $1 AND restaurant_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(responses)
    }

    pub async fn feedbacks(&self, restaurant_id: Uuid, id: Uuid, limit: i64) -> Result<Vec<Feedback>, AppError> {
        let feedbacks = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT * FROM feedbacks
            WHERE customer_id = $1 AND restaurant_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(feedbacks)
    }
}

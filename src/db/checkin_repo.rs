// src/db/checkin_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::on_unique_violation_as, error::AppError};
use crate::models::{
    checkin::{Checkin, DailyCount, FrequentCustomer},
    customer::CustomerSummary,
};

#[derive(Clone)]
pub struct CheckinRepository {
    pool: PgPool,
}

impl CheckinRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check-ins ativos cujo prazo passou viram `expired`.
    pub async fn expire_overdue<'e, E>(&self, executor: E, restaurant_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE checkins SET status = 'expired', updated_at = NOW()
            WHERE restaurant_id = $1 AND status = 'active' AND expires_at <= NOW()
            "#,
        )
        .bind(restaurant_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_active_for_customer<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Checkin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let checkin = sqlx::query_as::<_, Checkin>(
            r#"
            SELECT * FROM checkins
            WHERE restaurant_id = $1 AND customer_id = $2 AND status = 'active' AND expires_at > NOW()
            ORDER BY checkin_time DESC
            LIMIT 1
            "#,
        )
        .bind(restaurant_id)
        .bind(customer_id)
        .fetch_optional(executor)
        .await?;
        Ok(checkin)
    }

    /// Último check-in do cliente antes deste (para o aviso antifraude).
    pub async fn last_checkin_time<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        customer_id: Uuid,
        exclude_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let time = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT checkin_time FROM checkins
            WHERE restaurant_id = $1 AND customer_id = $2 AND id <> $3
            ORDER BY checkin_time DESC
            LIMIT 1
            "#,
        )
        .bind(restaurant_id)
        .bind(customer_id)
        .bind(exclude_id)
        .fetch_optional(executor)
        .await?;
        Ok(time)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        customer_id: Uuid,
        table_number: Option<&str>,
        coupon_id: Option<Uuid>,
        checkin_time: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Checkin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let checkin = sqlx::query_as::<_, Checkin>(
            r#"
            INSERT INTO checkins (restaurant_id, customer_id, table_number, coupon_id, checkin_time, expires_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(customer_id)
        .bind(table_number)
        .bind(coupon_id)
        .bind(checkin_time)
        .bind(expires_at)
        .fetch_one(executor)
        .await
        // uq_checkins_one_active: outro check-in ativo entrou em paralelo
        .map_err(|e| on_unique_violation_as(e, AppError::BadRequest("checkin.already_active")))?;
        Ok(checkin)
    }

    /// Só fecha check-ins ainda ativos; `None` se não houver (inclusive o segundo checkout).
    pub async fn checkout(&self, restaurant_id: Uuid, checkin_id: Uuid) -> Result<Option<Checkin>, AppError> {
        let checkin = sqlx::query_as::<_, Checkin>(
            r#"
            UPDATE checkins SET status = 'completed', checkout_time = NOW(), updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(checkin_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(checkin)
    }

    pub async fn list_active(&self, restaurant_id: Uuid) -> Result<Vec<(Checkin, CustomerSummary)>, AppError> {
        let checkins = sqlx::query_as::<_, Checkin>(
            r#"
            SELECT * FROM checkins
            WHERE restaurant_id = $1 AND status = 'active'
            ORDER BY checkin_time ASC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = checkins.iter().map(|c| c.customer_id).collect();
        let customers = sqlx::query_as::<_, CustomerSummary>(
            "SELECT id, name, phone, email FROM customers WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(checkins
            .into_iter()
            .filter_map(|c| {
                let customer = customers.iter().find(|cu| cu.id == c.customer_id)?.clone();
                Some((c, customer))
            })
            .collect())
    }

    // ---
    // Analytics (somente check-ins concluídos)
    // ---

    pub async fn count_completed(&self, restaurant_id: Uuid, since: Option<DateTime<Utc>>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM checkins
            WHERE restaurant_id = $1 AND status = 'completed'
              AND ($2::timestamptz IS NULL OR checkin_time >= $2)
            "#,
        )
        .bind(restaurant_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn most_frequent_customers(
        &self,
        restaurant_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<FrequentCustomer>, AppError> {
        let rows = sqlx::query_as::<_, FrequentCustomer>(
            r#"
            SELECT cu.id AS customer_id, cu.name, cu.email, COUNT(c.id) AS checkin_count
            FROM checkins c
            JOIN customers cu ON cu.id = c.customer_id
            WHERE c.restaurant_id = $1 AND c.status = 'completed'
              AND ($2::timestamptz IS NULL OR c.checkin_time >= $2)
            GROUP BY cu.id, cu.name, cu.email
            ORDER BY checkin_count DESC
            LIMIT 10
            "#,
        )
        .bind(restaurant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn average_duration_seconds(&self, restaurant_id: Uuid, since: Option<DateTime<Utc>>) -> Result<f64, AppError> {
        let avg = sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT AVG(EXTRACT(EPOCH FROM (checkout_time - checkin_time)))::float8
            FROM checkins
            WHERE restaurant_id = $1 AND status = 'completed' AND checkout_time IS NOT NULL
              AND ($2::timestamptz IS NULL OR checkin_time >= $2)
            "#,
        )
        .bind(restaurant_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(avg.unwrap_or(0.0))
    }

    pub async fn completed_per_day_last_30(&self, restaurant_id: Uuid) -> Result<Vec<DailyCount>, AppError> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT date_trunc('day', checkin_time) AS date, COUNT(*) AS count
            FROM checkins
            WHERE restaurant_id = $1 AND status = 'completed'
              AND checkin_time >= NOW() - INTERVAL '30 days'
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

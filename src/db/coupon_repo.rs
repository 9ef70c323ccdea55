// src/db/coupon_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::on_unique_violation, error::AppError};
use crate::models::{
    checkin::DailyCount,
    coupon::{Coupon, CouponDetails, CouponStatus, CouponTypeCount},
    reward::RewardType,
};

const DETAILS_SELECT: &str = r#"
    SELECT c.*, r.title AS reward_title, cu.name AS customer_name, cu.email AS customer_email
    FROM coupons c
    JOIN rewards r ON r.id = c.reward_id
    JOIN customers cu ON cu.id = c.customer_id
"#;

// Dados de um cupom novo, já resolvidos pelo serviço de recompensas
#[derive(Debug)]
pub struct NewCoupon<'a> {
    pub restaurant_id: Uuid,
    pub reward_id: Uuid,
    pub customer_id: Uuid,
    pub code: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub reward_type: RewardType,
    pub value: Option<Decimal>,
    pub visit_milestone: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct CouponRepository {
    pool: PgPool,
}

impl CouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert<'e, E>(&self, executor: E, coupon: &NewCoupon<'_>) -> Result<Coupon, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Coupon>(
            r#"
            INSERT INTO coupons
                (restaurant_id, reward_id, customer_id, code, title, description, reward_type, value,
                 status, visit_milestone, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'generated', $9, $10)
            RETURNING *
            "#,
        )
        .bind(coupon.restaurant_id)
        .bind(coupon.reward_id)
        .bind(coupon.customer_id)
        .bind(coupon.code)
        .bind(coupon.title)
        .bind(coupon.description)
        .bind(coupon.reward_type)
        .bind(coupon.value)
        .bind(coupon.visit_milestone)
        .bind(coupon.expires_at)
        .fetch_one(executor)
        .await
        .map_err(|e| on_unique_violation(e, "coupon.code_conflict"))
    }

    /// Quais dos códigos candidatos já pertencem a algum cupom.
    pub async fn taken_codes<'e, E>(&self, executor: E, codes: &[String]) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken = sqlx::query_scalar::<_, String>("SELECT code FROM coupons WHERE code = ANY($1)")
            .bind(codes)
            .fetch_all(executor)
            .await?;
        Ok(taken)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, restaurant_id: Uuid, id: Uuid) -> Result<Option<Coupon>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .fetch_optional(executor)
            .await?;
        Ok(coupon)
    }

    pub async fn find_details_by_code(&self, restaurant_id: Uuid, code: &str) -> Result<Option<CouponDetails>, AppError> {
        let sql = format!("{DETAILS_SELECT} WHERE c.restaurant_id = $1 AND c.code = $2");
        let coupon = sqlx::query_as::<_, CouponDetails>(&sql)
            .bind(restaurant_id)
            .bind(code.to_uppercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(coupon)
    }

    pub async fn list(
        &self,
        restaurant_id: Uuid,
        status: Option<CouponStatus>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CouponDetails>, i64), AppError> {
        let pattern = search.map(|s| format!("%{s}%"));
        let filter = "WHERE c.restaurant_id = $1 AND ($2::coupon_status IS NULL OR c.status = $2) \
                      AND ($3::text IS NULL OR c.code ILIKE $3)";

        let sql = format!("{DETAILS_SELECT} {filter} ORDER BY c.created_at DESC LIMIT $4 OFFSET $5");
        let coupons = sqlx::query_as::<_, CouponDetails>(&sql)
            .bind(restaurant_id)
            .bind(status)
            .bind(pattern.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM coupons c {filter}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(restaurant_id)
            .bind(status)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok((coupons, total))
    }

    /// Cupons do cliente para a recompensa (limite por cliente).
    pub async fn count_for_customer<'e, E>(&self, executor: E, reward_id: Uuid, customer_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM coupons WHERE reward_id = $1 AND customer_id = $2",
        )
        .bind(reward_id)
        .bind(customer_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn exists_for_milestone<'e, E>(
        &self,
        executor: E,
        reward_id: Uuid,
        customer_id: Uuid,
        milestone: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM coupons WHERE reward_id = $1 AND customer_id = $2 AND visit_milestone = $3
            )
            "#,
        )
        .bind(reward_id)
        .bind(customer_id)
        .bind(milestone)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// Marcos de visita já convertidos em cupom para (recompensa, cliente).
    pub async fn claimed_milestones<'e, E>(&self, executor: E, reward_id: Uuid, customer_id: Uuid) -> Result<Vec<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let milestones = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT visit_milestone FROM coupons
            WHERE reward_id = $1 AND customer_id = $2 AND visit_milestone IS NOT NULL
            "#,
        )
        .bind(reward_id)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(milestones)
    }

    /// Resgate condicional: só um UPDATE vence; `None` se já não era resgatável.
    pub async fn redeem<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        id: Uuid,
        order_value: Option<Decimal>,
    ) -> Result<Option<Coupon>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            UPDATE coupons SET status = 'redeemed', redeemed_at = NOW(), order_value = $3, updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
              AND status IN ('generated', 'sent')
              AND (expires_at IS NULL OR expires_at >= NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(order_value)
        .fetch_optional(executor)
        .await?;
        Ok(coupon)
    }

    pub async fn cancel(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<Coupon>, AppError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            UPDATE coupons SET status = 'cancelled', cancelled_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2 AND status IN ('generated', 'sent')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(coupon)
    }

    pub async fn expire_overdue(&self, restaurant_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE coupons SET status = 'expired', updated_at = NOW()
            WHERE restaurant_id = $1 AND status IN ('generated', 'sent')
              AND expires_at IS NOT NULL AND expires_at < NOW()
            "#,
        )
        .bind(restaurant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Analytics
    // ---

    /// (total, resgatados, expirados, expirando em 7 dias)
    pub async fn status_counts(&self, restaurant_id: Uuid) -> Result<(i64, i64, i64, i64), AppError> {
        let row = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'redeemed'),
                COUNT(*) FILTER (WHERE status = 'expired'),
                COUNT(*) FILTER (
                    WHERE status IN ('generated', 'sent')
                      AND expires_at BETWEEN NOW() AND NOW() + INTERVAL '7 days'
                )
            FROM coupons
            WHERE restaurant_id = $1
            "#,
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count_by_type(&self, restaurant_id: Uuid) -> Result<Vec<CouponTypeCount>, AppError> {
        let rows = sqlx::query_as::<_, CouponTypeCount>(
            r#"
            SELECT reward_type, COUNT(*) AS count FROM coupons
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

    pub async fn redeemed_per_day(&self, restaurant_id: Uuid) -> Result<Vec<DailyCount>, AppError> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT date_trunc('day', redeemed_at) AS date, COUNT(*) AS count
            FROM coupons
            WHERE restaurant_id = $1 AND status = 'redeemed'
              AND redeemed_at >= NOW() - INTERVAL '30 days'
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// (gerados, resgatados) de todas as recompensas do restaurante.
    pub async fn generated_and_redeemed(&self, restaurant_id: Uuid) -> Result<(i64, i64), AppError> {
        let row = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'redeemed') FROM coupons WHERE restaurant_id = $1",
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

// src/db/restaurant_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::on_unique_violation, error::AppError};
use crate::models::restaurant::{Restaurant, RestaurantStatus, StaffMember, UserRestaurant};

#[derive(Clone)]
pub struct RestaurantRepository {
    pool: PgPool,
}

// Campos editáveis do restaurante (None = mantém o valor atual)
#[derive(Debug, Default)]
pub struct RestaurantChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub cuisine_type: Option<&'a str>,
    pub address: Option<&'a Value>,
    pub settings: Option<&'a Value>,
    pub subscription_plan: Option<&'a str>,
    pub subscription_expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl RestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, AppError> {
        let restaurant = sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(restaurant)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, AppError> {
        let restaurant = sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(restaurant)
    }

    pub async fn list_all(&self, search: Option<&str>, limit: i64, offset: i64) -> Result<(Vec<Restaurant>, i64), AppError> {
        let pattern = search.map(|s| format!("%{s}%"));

        let restaurants = sqlx::query_as::<_, Restaurant>(
            r#"
            SELECT * FROM restaurants
            WHERE ($1::text IS NULL OR name ILIKE $1 OR slug ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM restaurants WHERE ($1::text IS NULL OR name ILIKE $1 OR slug ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((restaurants, total))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        email: Option<&str>,
        phone: Option<&str>,
        cuisine_type: Option<&str>,
        subscription_plan: &str,
        subscription_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Restaurant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Restaurant>(
            r#"
            INSERT INTO restaurants (name, slug, email, phone, cuisine_type, subscription_plan, subscription_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(email)
        .bind(phone)
        .bind(cuisine_type)
        .bind(subscription_plan)
        .bind(subscription_expires_at)
        .fetch_one(executor)
        .await
        .map_err(|e| on_unique_violation(e, "restaurant.slug_already_exists"))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &RestaurantChanges<'_>,
    ) -> Result<Option<Restaurant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            UPDATE restaurants SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                cuisine_type = COALESCE($6, cuisine_type),
                address = COALESCE($7, address),
                settings = COALESCE($8, settings),
                subscription_plan = COALESCE($9, subscription_plan),
                subscription_expires_at = COALESCE($10, subscription_expires_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.cuisine_type)
        .bind(changes.address)
        .bind(changes.settings)
        .bind(changes.subscription_plan)
        .bind(changes.subscription_expires_at)
        .fetch_optional(executor)
        .await?;
        Ok(restaurant)
    }

    pub async fn update_status(&self, id: Uuid, status: RestaurantStatus) -> Result<Option<Restaurant>, AppError> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            "UPDATE restaurants SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(restaurant)
    }

    // ---
    // Versão das permissões (invalida os snapshots em cache)
    // ---

    pub async fn get_perm_version(&self, id: Uuid) -> Result<Option<i32>, AppError> {
        let version = sqlx::query_scalar::<_, i32>("SELECT perm_version FROM restaurants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version)
    }

    pub async fn bump_perm_version<'e, E>(&self, executor: E, id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let version = sqlx::query_scalar::<_, i32>(
            "UPDATE restaurants SET perm_version = perm_version + 1 WHERE id = $1 RETURNING perm_version",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("restaurant.not_found"))?;
        Ok(version)
    }

    // ---
    // Vínculos usuário <-> restaurante
    // ---

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserRestaurant>, AppError> {
        let rows = sqlx::query_as::<_, UserRestaurant>(
            r#"
            SELECT r.id, r.name, r.slug, r.status, ur.is_owner
            FROM user_restaurants ur
            JOIN restaurants r ON r.id = ur.restaurant_id
            WHERE ur.user_id = $1
            ORDER BY ur.is_owner DESC, ur.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// `Some(is_owner)` se o usuário pertence ao restaurante.
    pub async fn membership(&self, user_id: Uuid, restaurant_id: Uuid) -> Result<Option<bool>, AppError> {
        let is_owner = sqlx::query_scalar::<_, bool>(
            "SELECT is_owner FROM user_restaurants WHERE user_id = $1 AND restaurant_id = $2",
        )
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(is_owner)
    }

    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        restaurant_id: Uuid,
        is_owner: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO user_restaurants (user_id, restaurant_id, is_owner) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(restaurant_id)
        .bind(is_owner)
        .execute(executor)
        .await
        .map_err(|e| on_unique_violation(e, "restaurant.staff_already_exists"))?;
        Ok(())
    }

    pub async fn remove_member<'e, E>(&self, executor: E, user_id: Uuid, restaurant_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM user_restaurants WHERE user_id = $1 AND restaurant_id = $2 AND is_owner = FALSE",
        )
        .bind(user_id)
        .bind(restaurant_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_staff(&self, restaurant_id: Uuid) -> Result<Vec<StaffMember>, AppError> {
        let staff = sqlx::query_as::<_, StaffMember>(
            r#"
            SELECT
                u.id AS user_id, u.name, u.email, u.phone, u.is_active,
                ur.is_owner,
                COALESCE(
                    array_agg(r.key::text ORDER BY r.key) FILTER (WHERE r.key IS NOT NULL),
                    ARRAY[]::text[]
                ) AS roles,
                ur.created_at AS joined_at
            FROM user_restaurants ur
            JOIN users u ON u.id = ur.user_id
            LEFT JOIN user_roles uro ON uro.user_id = u.id AND uro.restaurant_id = ur.restaurant_id
            LEFT JOIN roles r ON r.id = uro.role_id
            WHERE ur.restaurant_id = $1
            GROUP BY u.id, ur.is_owner, ur.created_at
            ORDER BY ur.is_owner DESC, u.name
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn find_staff_member(&self, restaurant_id: Uuid, user_id: Uuid) -> Result<Option<StaffMember>, AppError> {
        let staff = self.list_staff(restaurant_id).await?;
        Ok(staff.into_iter().find(|m| m.user_id == user_id))
    }
}

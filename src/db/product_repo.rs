// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::on_unique_violation, error::AppError};
use crate::models::{
    label::LabelableItem,
    product::{
        Category, CategoryPayload, CreateProductPayload, Ingredient, IngredientPayload, Product,
        ProductFilter, UpdateProductPayload,
    },
    stock::StockableType,
};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // Categorias
    // ---

    pub async fn list_categories(&self, restaurant_id: Uuid) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE restaurant_id = $1 ORDER BY sort_order, name",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn category_exists(&self, restaurant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND restaurant_id = $2)",
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create_category(&self, restaurant_id: Uuid, payload: &CategoryPayload) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (restaurant_id, name, description, is_active, sort_order)
            VALUES ($1, $2, $3, COALESCE($4, TRUE), COALESCE($5, 0))
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(payload.is_active)
        .bind(payload.sort_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, "category.already_exists"))
    }

    pub async fn update_category(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &CategoryPayload,
    ) -> Result<Option<Category>, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = $3,
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                sort_order = COALESCE($6, sort_order),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(payload.is_active)
        .bind(payload.sort_order)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, "category.already_exists"))
    }

    pub async fn delete_category(&self, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products(&self, restaurant_id: Uuid, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let pattern = filter.search.as_deref().map(|s| format!("%{s}%"));

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE restaurant_id = $1
              AND ($2::uuid IS NULL OR category_id = $2)
              AND ($3::text IS NULL OR name ILIKE $3)
            ORDER BY name
            "#,
        )
        .bind(restaurant_id)
        .bind(filter.category_id)
        .bind(pattern.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find_product(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn create_product(&self, restaurant_id: Uuid, payload: &CreateProductPayload) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (restaurant_id, category_id, name, description, price, sku, image_url, unit_of_measure, min_stock_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 'un'), COALESCE($9, 0))
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(payload.category_id)
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(payload.price)
        .bind(payload.sku.as_deref())
        .bind(payload.image_url.as_deref())
        .bind(payload.unit_of_measure.as_deref())
        .bind(payload.min_stock_level)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                category_id = COALESCE($5, category_id),
                price = COALESCE($6, price),
                sku = COALESCE($7, sku),
                image_url = COALESCE($8, image_url),
                unit_of_measure = COALESCE($9, unit_of_measure),
                min_stock_level = COALESCE($10, min_stock_level),
                is_active = COALESCE($11, is_active),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.category_id)
        .bind(payload.price)
        .bind(payload.sku.as_deref())
        .bind(payload.image_url.as_deref())
        .bind(payload.unit_of_measure.as_deref())
        .bind(payload.min_stock_level)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn toggle_product(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    /// Remove também o estoque polimórfico do produto.
    pub async fn delete_product(&self, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stocks WHERE restaurant_id = $1 AND stockable_type = 'Product' AND stockable_id = $2")
            .bind(restaurant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    // ---
    // Ingredientes
    // ---

    pub async fn list_ingredients(&self, restaurant_id: Uuid) -> Result<Vec<Ingredient>, AppError> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT * FROM ingredients WHERE restaurant_id = $1 ORDER BY name",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ingredients)
    }

    pub async fn create_ingredient(&self, restaurant_id: Uuid, payload: &IngredientPayload) -> Result<Ingredient, AppError> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (restaurant_id, name, unit_of_measure, cost_per_unit, supplier, min_stock_level, is_active)
            VALUES ($1, $2, COALESCE($3, 'kg'), COALESCE($4, 0), $5, COALESCE($6, 0), COALESCE($7, TRUE))
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(&payload.name)
        .bind(payload.unit_of_measure.as_deref())
        .bind(payload.cost_per_unit)
        .bind(payload.supplier.as_deref())
        .bind(payload.min_stock_level)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(ingredient)
    }

    pub async fn update_ingredient(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &IngredientPayload,
    ) -> Result<Option<Ingredient>, AppError> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r#"
            UPDATE ingredients SET
                name = $3,
                unit_of_measure = COALESCE($4, unit_of_measure),
                cost_per_unit = COALESCE($5, cost_per_unit),
                supplier = COALESCE($6, supplier),
                min_stock_level = COALESCE($7, min_stock_level),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(&payload.name)
        .bind(payload.unit_of_measure.as_deref())
        .bind(payload.cost_per_unit)
        .bind(payload.supplier.as_deref())
        .bind(payload.min_stock_level)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ingredient)
    }

    pub async fn delete_ingredient(&self, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stocks WHERE restaurant_id = $1 AND stockable_type = 'Ingredient' AND stockable_id = $2")
            .bind(restaurant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    // ---
    // Alvos polimórficos (estoque e etiquetas)
    // ---

    /// Resolve o item (produto ou ingrediente) do restaurante: (nome, unidade, nível mínimo).
    pub async fn find_stockable<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        stockable_type: StockableType,
        stockable_id: Uuid,
    ) -> Result<Option<(String, String, Decimal)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match stockable_type {
            StockableType::Product => {
                "SELECT name, unit_of_measure, min_stock_level FROM products WHERE id = $1 AND restaurant_id = $2"
            }
            StockableType::Ingredient => {
                "SELECT name, unit_of_measure, min_stock_level FROM ingredients WHERE id = $1 AND restaurant_id = $2"
            }
        };

        let row = sqlx::query_as::<_, (String, String, Decimal)>(sql)
            .bind(stockable_id)
            .bind(restaurant_id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_labelable(&self, restaurant_id: Uuid) -> Result<Vec<LabelableItem>, AppError> {
        let items = sqlx::query_as::<_, LabelableItem>(
            r#"
            SELECT id, name, 'Product'::stockable_type AS item_type, unit_of_measure
            FROM products WHERE restaurant_id = $1 AND is_active
            UNION ALL
            SELECT id, name, 'Ingredient'::stockable_type AS item_type, unit_of_measure
            FROM ingredients WHERE restaurant_id = $1 AND is_active
            ORDER BY name
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}

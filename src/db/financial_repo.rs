// src/db/financial_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::financial::{
    CashFlowTotals, CreateCategoryPayload, CreateTransactionPayload, FinancialCategory,
    FinancialTransaction, PaymentMethod, PaymentMethodFilter, PaymentMethodPayload, TransactionFilter,
    TransactionType,
};

#[derive(Clone)]
pub struct FinancialRepository {
    pool: PgPool,
}

impl FinancialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Transações
    // ---

    pub async fn create_transaction(
        &self,
        restaurant_id: Uuid,
        user_id: Uuid,
        payload: &CreateTransactionPayload,
    ) -> Result<FinancialTransaction, AppError> {
        let transaction = sqlx::query_as::<_, FinancialTransaction>(
            r#"
            INSERT INTO financial_transactions
                (restaurant_id, user_id, category_id, payment_method_id, transaction_type, amount, description, transaction_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, CURRENT_DATE))
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(user_id)
        .bind(payload.category_id)
        .bind(payload.payment_method_id)
        .bind(payload.transaction_type)
        .bind(payload.amount)
        .bind(payload.description.as_deref())
        .bind(payload.transaction_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(transaction)
    }

    pub async fn list_transactions(
        &self,
        restaurant_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<FinancialTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, FinancialTransaction>(
            r#"
            SELECT * FROM financial_transactions
            WHERE restaurant_id = $1
              AND ($2::transaction_type IS NULL OR transaction_type = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::date IS NULL OR transaction_date >= $4)
              AND ($5::date IS NULL OR transaction_date <= $5)
            ORDER BY transaction_date DESC, created_at DESC
            "#,
        )
        .bind(restaurant_id)
        .bind(filter.transaction_type)
        .bind(filter.category_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    // ---
    // Categorias (globais + do restaurante)
    // ---

    /// Categoria visível para o restaurante (global ou própria).
    pub async fn find_category(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<FinancialCategory>, AppError> {
        let category = sqlx::query_as::<_, FinancialCategory>(
            r#"
            SELECT * FROM financial_categories
            WHERE id = $1 AND (restaurant_id IS NULL OR restaurant_id = $2)
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn list_categories(
        &self,
        restaurant_id: Uuid,
        category_type: Option<TransactionType>,
    ) -> Result<Vec<FinancialCategory>, AppError> {
        let categories = sqlx::query_as::<_, FinancialCategory>(
            r#"
            SELECT * FROM financial_categories
            WHERE (restaurant_id IS NULL OR restaurant_id = $1)
              AND ($2::transaction_type IS NULL OR category_type = $2)
            ORDER BY restaurant_id NULLS FIRST, name
            "#,
        )
        .bind(restaurant_id)
        .bind(category_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn create_category(
        &self,
        restaurant_id: Uuid,
        payload: &CreateCategoryPayload,
    ) -> Result<FinancialCategory, AppError> {
        let category = sqlx::query_as::<_, FinancialCategory>(
            r#"
            INSERT INTO financial_categories (restaurant_id, name, category_type, color)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(&payload.name)
        .bind(payload.category_type)
        .bind(payload.color.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    // ---
    // Formas de pagamento
    // ---

    pub async fn list_payment_methods(
        &self,
        restaurant_id: Uuid,
        filter: &PaymentMethodFilter,
    ) -> Result<Vec<PaymentMethod>, AppError> {
        let methods = sqlx::query_as::<_, PaymentMethod>(
            r#"
            SELECT * FROM payment_methods
            WHERE (restaurant_id IS NULL OR restaurant_id = $1)
              AND ($2::text IS NULL OR method_type = $2)
              AND ($3::boolean IS NULL OR is_active = $3)
            ORDER BY restaurant_id NULLS FIRST, name
            "#,
        )
        .bind(restaurant_id)
        .bind(filter.method_type.as_deref())
        .bind(filter.is_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(methods)
    }

    pub async fn create_payment_method(
        &self,
        restaurant_id: Uuid,
        payload: &PaymentMethodPayload,
    ) -> Result<PaymentMethod, AppError> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            r#"
            INSERT INTO payment_methods (restaurant_id, name, method_type, is_active)
            VALUES ($1, $2, COALESCE($3, 'other'), COALESCE($4, TRUE))
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(&payload.name)
        .bind(payload.method_type.as_deref())
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(method)
    }

    /// Só altera formas do próprio restaurante; as globais ficam de fora do WHERE.
    pub async fn update_payment_method(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &PaymentMethodPayload,
    ) -> Result<Option<PaymentMethod>, AppError> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            r#"
            UPDATE payment_methods SET
                name = $3,
                method_type = COALESCE($4, method_type),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .bind(&payload.name)
        .bind(payload.method_type.as_deref())
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(method)
    }

    pub async fn delete_payment_method(&self, restaurant_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Fluxo de caixa
    // ---

    pub async fn cash_flow_totals(
        &self,
        restaurant_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<CashFlowTotals, AppError> {
        let totals = sqlx::query_as::<_, CashFlowTotals>(
            r#"
            SELECT
                COALESCE((
                    SELECT SUM(amount) FROM financial_transactions
                    WHERE restaurant_id = $1 AND transaction_type = 'income'
                      AND transaction_date BETWEEN $2 AND $3
                ), 0) AS income,
                COALESCE((
                    SELECT SUM(amount) FROM financial_transactions
                    WHERE restaurant_id = $1 AND transaction_type = 'expense'
                      AND transaction_date BETWEEN $2 AND $3
                ), 0) AS expense,
                COALESCE((
                    SELECT SUM(amount) FROM cash_register_movements
                    WHERE restaurant_id = $1 AND movement_type = 'reinforcement'
                      AND created_at::date BETWEEN $2 AND $3
                ), 0) AS reinforcements,
                COALESCE((
                    SELECT SUM(amount) FROM cash_register_movements
                    WHERE restaurant_id = $1 AND movement_type = 'withdrawal'
                      AND created_at::date BETWEEN $2 AND $3
                ), 0) AS withdrawals
            "#,
        )
        .bind(restaurant_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }
}

// src/services/product_service.rs

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductRepository,
    models::product::{
        Category, CategoryPayload, CreateProductPayload, Ingredient, IngredientPayload, Product, ProductFilter,
        UpdateProductPayload,
    },
};

/// Preço e estoque mínimo não podem ser negativos.
pub fn check_amounts(price: Option<Decimal>, min_stock_level: Option<Decimal>) -> Result<(), AppError> {
    if price.is_some_and(|p| p.is_sign_negative()) {
        return Err(AppError::BadRequest("product.invalid_price"));
    }
    if min_stock_level.is_some_and(|m| m.is_sign_negative()) {
        return Err(AppError::BadRequest("stock.invalid_min_level"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProductService {
    repo: ProductRepository,
}

impl ProductService {
    pub fn new(repo: ProductRepository) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &ProductRepository {
        &self.repo
    }

    async fn ensure_category(&self, restaurant_id: Uuid, category_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(id) = category_id {
            if !self.repo.category_exists(restaurant_id, id).await? {
                return Err(AppError::NotFound("category.not_found"));
            }
        }
        Ok(())
    }

    // --- Categorias ---

    pub async fn list_categories(&self, restaurant_id: Uuid) -> Result<Vec<Category>, AppError> {
        self.repo.list_categories(restaurant_id).await
    }

    pub async fn create_category(&self, restaurant_id: Uuid, payload: &CategoryPayload) -> Result<Category, AppError> {
        self.repo.create_category(restaurant_id, payload).await
    }

    pub async fn update_category(&self, restaurant_id: Uuid, id: Uuid, payload: &CategoryPayload) -> Result<Category, AppError> {
        self.repo
            .update_category(restaurant_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("category.not_found"))
    }

    pub async fn delete_category(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete_category(restaurant_id, id).await? {
            0 => Err(AppError::NotFound("category.not_found")),
            _ => Ok(()),
        }
    }

    // --- Produtos ---

    pub async fn list_products(&self, restaurant_id: Uuid, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.repo.list_products(restaurant_id, filter).await
    }

    pub async fn get_product(&self, restaurant_id: Uuid, id: Uuid) -> Result<Product, AppError> {
        self.repo
            .find_product(restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("product.not_found"))
    }

    pub async fn create_product(&self, restaurant_id: Uuid, payload: &CreateProductPayload) -> Result<Product, AppError> {
        check_amounts(Some(payload.price), payload.min_stock_level)?;
        self.ensure_category(restaurant_id, payload.category_id).await?;

        let product = self.repo.create_product(restaurant_id, payload).await?;
        tracing::info!(%restaurant_id, product_id = %product.id, "Produto criado");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Product, AppError> {
        check_amounts(payload.price, payload.min_stock_level)?;
        self.ensure_category(restaurant_id, payload.category_id).await?;

        self.repo
            .update_product(restaurant_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("product.not_found"))
    }

    pub async fn toggle_product(&self, restaurant_id: Uuid, id: Uuid) -> Result<Product, AppError> {
        self.repo
            .toggle_product(restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("product.not_found"))
    }

    pub async fn delete_product(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete_product(restaurant_id, id).await? {
            0 => Err(AppError::NotFound("product.not_found")),
            _ => Ok(()),
        }
    }

    // --- Ingredientes ---

    pub async fn list_ingredients(&self, restaurant_id: Uuid) -> Result<Vec<Ingredient>, AppError> {
        self.repo.list_ingredients(restaurant_id).await
    }

    pub async fn create_ingredient(&self, restaurant_id: Uuid, payload: &IngredientPayload) -> Result<Ingredient, AppError> {
        check_amounts(payload.cost_per_unit, payload.min_stock_level)?;
        self.repo.create_ingredient(restaurant_id, payload).await
    }

    pub async fn update_ingredient(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &IngredientPayload,
    ) -> Result<Ingredient, AppError> {
        check_amounts(payload.cost_per_unit, payload.min_stock_level)?;
        self.repo
            .update_ingredient(restaurant_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("ingredient.not_found"))
    }

    pub async fn delete_ingredient(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete_ingredient(restaurant_id, id).await? {
            0 => Err(AppError::NotFound("ingredient.not_found")),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(check_amounts(Some(d("49.90")), Some(d("0"))).is_ok());
        assert!(check_amounts(None, None).is_ok());
        assert!(matches!(
            check_amounts(Some(d("-1.00")), None),
            Err(AppError::BadRequest("product.invalid_price"))
        ));
        assert!(matches!(
            check_amounts(None, Some(d("-0.5"))),
            Err(AppError::BadRequest("stock.invalid_min_level"))
        ));
    }
}

// src/handlers/menu.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{
            PermCategoriesCreate, PermCategoriesDelete, PermCategoriesRead, PermCategoriesUpdate,
            PermIngredientsCreate, PermIngredientsDelete, PermIngredientsRead, PermIngredientsUpdate,
            PermProductsCreate, PermProductsDelete, PermProductsRead, PermProductsUpdate, RequirePermission,
        },
        tenancy::RestaurantContext,
    },
    models::product::{
        Category, CategoryPayload, CreateProductPayload, Ingredient, IngredientPayload, Product, ProductFilter,
        UpdateProductPayload,
    },
};

// =============================================================================
//  PRODUTOS
// =============================================================================

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Cardápio",
    responses(
        (status = 200, description = "Produtos do restaurante", body = Vec<Product>)
    ),
    params(
        ("categoryId" = Option<Uuid>, Query, description = "Filtra pela categoria"),
        ("search" = Option<String>, Query, description = "Busca pelo nome"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermProductsRead>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .product_service
        .list_products(tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Cardápio",
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermProductsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .get_product(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Cardápio",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermProductsCreate>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .create_product(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Cardápio",
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermProductsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .update_product(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// PATCH /api/products/{id}/toggle
#[utoipa::path(
    patch,
    path = "/api/products/{id}/toggle",
    tag = "Cardápio",
    responses(
        (status = 200, description = "Produto ativado/desativado", body = Product)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermProductsUpdate>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .toggle_product(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Cardápio",
    responses(
        (status = 204, description = "Produto removido"),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermProductsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .product_service
        .delete_product(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CATEGORIAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Cardápio",
    responses(
        (status = 200, description = "Categorias do cardápio", body = Vec<Category>)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCategoriesRead>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .product_service
        .list_categories(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Cardápio",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Categoria já existe")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCategoriesCreate>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .product_service
        .create_category(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "Cardápio",
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Categoria atualizada", body = Category),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da categoria"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCategoriesUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .product_service
        .update_category(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Cardápio",
    responses(
        (status = 204, description = "Categoria removida"),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da categoria"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCategoriesDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .product_service
        .delete_category(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  INGREDIENTES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "Cardápio",
    responses(
        (status = 200, description = "Ingredientes do restaurante", body = Vec<Ingredient>)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_ingredients(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIngredientsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let ingredients = app_state
        .product_service
        .list_ingredients(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ingredients))
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    tag = "Cardápio",
    request_body = IngredientPayload,
    responses(
        (status = 201, description = "Ingrediente criado", body = Ingredient)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIngredientsCreate>,
    Json(payload): Json<IngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ingredient = app_state
        .product_service
        .create_ingredient(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[utoipa::path(
    put,
    path = "/api/ingredients/{id}",
    tag = "Cardápio",
    request_body = IngredientPayload,
    responses(
        (status = 200, description = "Ingrediente atualizado", body = Ingredient),
        (status = 404, description = "Ingrediente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do ingrediente"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIngredientsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ingredient = app_state
        .product_service
        .update_ingredient(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ingredient))
}

#[utoipa::path(
    delete,
    path = "/api/ingredients/{id}",
    tag = "Cardápio",
    responses(
        (status = 204, description = "Ingrediente removido")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do ingrediente"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIngredientsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .product_service
        .delete_ingredient(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

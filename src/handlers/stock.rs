// src/handlers/stock.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermStockCreate, PermStockRead, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::stock::{MovementResult, StockDashboard, StockItem, StockMovement, StockMovementPayload, StockableType},
};

// O restaurant_id da rota é consumido pelo RestaurantContext
#[derive(Debug, Deserialize)]
pub struct HistoryPath {
    pub stockable_type: String,
    pub stockable_id: Uuid,
}

// GET /api/stock/restaurant/{restaurant_id}
#[utoipa::path(
    get,
    path = "/api/stock/restaurant/{restaurant_id}",
    tag = "Estoque",
    responses(
        (status = 200, description = "Saldo de cada item com status", body = Vec<StockItem>)
    ),
    params(
        ("restaurant_id" = Uuid, Path, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermStockRead>,
) -> Result<impl IntoResponse, ApiError> {
    let items = app_state
        .stock_service
        .list(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(items))
}

// POST /api/stock/restaurant/{restaurant_id}/move
#[utoipa::path(
    post,
    path = "/api/stock/restaurant/{restaurant_id}/move",
    tag = "Estoque",
    request_body = StockMovementPayload,
    responses(
        (status = 201, description = "Movimentação registrada", body = MovementResult),
        (status = 400, description = "Quantidade inválida ou estoque insuficiente"),
        (status = 404, description = "Item não encontrado")
    ),
    params(
        ("restaurant_id" = Uuid, Path, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermStockCreate>,
    Json(payload): Json<StockMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .stock_service
        .move_stock(&app_state.db_pool, tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

// GET /api/stock/restaurant/{restaurant_id}/history/{stockable_type}/{stockable_id}
#[utoipa::path(
    get,
    path = "/api/stock/restaurant/{restaurant_id}/history/{stockable_type}/{stockable_id}",
    tag = "Estoque",
    responses(
        (status = 200, description = "Movimentações do item, mais recentes primeiro", body = Vec<StockMovement>),
        (status = 400, description = "Tipo de item inválido")
    ),
    params(
        ("restaurant_id" = Uuid, Path, description = "ID do restaurante"),
        ("stockable_type" = String, Path, description = "Product ou Ingredient"),
        ("stockable_id" = Uuid, Path, description = "ID do item")
    ),
    security(("api_jwt" = []))
)]
pub async fn history(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermStockRead>,
    Path(path): Path<HistoryPath>,
) -> Result<impl IntoResponse, ApiError> {
    let stockable_type = StockableType::parse(&path.stockable_type)
        .ok_or_else(|| AppError::BadRequest("stock.invalid_type").to_api_error(&locale, &app_state.i18n_store))?;

    let movements = app_state
        .stock_service
        .history(tenant.0, stockable_type, path.stockable_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}

// GET /api/stock/restaurant/{restaurant_id}/dashboard
#[utoipa::path(
    get,
    path = "/api/stock/restaurant/{restaurant_id}/dashboard",
    tag = "Estoque",
    responses(
        (status = 200, description = "Totais por status, alertas e últimas movimentações", body = StockDashboard)
    ),
    params(
        ("restaurant_id" = Uuid, Path, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermStockRead>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = app_state
        .stock_service
        .dashboard(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(dashboard))
}

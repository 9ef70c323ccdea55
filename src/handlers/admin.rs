// src/handlers/admin.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireSuperadmin},
    models::{
        iam::SetEntitlementsPayload,
        restaurant::{AdminUpdateRestaurantPayload, CreateRestaurantPayload, ListQuery, Restaurant, UpdateStatusPayload},
    },
};

// GET /api/admin/restaurants
#[utoipa::path(
    get,
    path = "/api/admin/restaurants",
    tag = "Admin",
    responses(
        (status = 200, description = "Restaurantes da plataforma (paginado)"),
        (status = 403, description = "Apenas superadmin")
    ),
    params(
        ("search" = Option<String>, Query, description = "Busca por nome, slug ou e-mail"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_restaurants(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireSuperadmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .restaurant_service
        .list_all(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// POST /api/admin/restaurants
#[utoipa::path(
    post,
    path = "/api/admin/restaurants",
    tag = "Admin",
    request_body = CreateRestaurantPayload,
    responses(
        (status = 201, description = "Restaurante provisionado com dono", body = Restaurant),
        (status = 409, description = "Slug ou e-mail já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_restaurant(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireSuperadmin,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateRestaurantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let restaurant = app_state
        .restaurant_service
        .provision(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!(admin_id = %user.id, restaurant_id = %restaurant.id, "Restaurante provisionado");
    Ok((StatusCode::CREATED, Json(restaurant)))
}

// PUT /api/admin/restaurants/{id}
#[utoipa::path(
    put,
    path = "/api/admin/restaurants/{id}",
    tag = "Admin",
    request_body = AdminUpdateRestaurantPayload,
    responses(
        (status = 200, description = "Restaurante atualizado", body = Restaurant),
        (status = 404, description = "Restaurante não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_restaurant(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireSuperadmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdateRestaurantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let restaurant = app_state
        .restaurant_service
        .admin_update(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(restaurant))
}

// PATCH /api/admin/restaurants/{id}/status
#[utoipa::path(
    patch,
    path = "/api/admin/restaurants/{id}/status",
    tag = "Admin",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Restaurant)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireSuperadmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant = app_state
        .restaurant_service
        .update_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(restaurant))
}

// PUT /api/admin/restaurants/{id}/entitlements
#[utoipa::path(
    put,
    path = "/api/admin/restaurants/{id}/entitlements",
    tag = "Admin",
    request_body = SetEntitlementsPayload,
    responses(
        (status = 204, description = "Módulos do plano atualizados")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_entitlements(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireSuperadmin,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetEntitlementsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .iam_service
        .set_entitlements(&app_state.db_pool, id, user.id, &payload.entitlements)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "Usuários da plataforma (paginado)")
    ),
    params(
        ("search" = Option<String>, Query, description = "Busca por nome ou e-mail"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireSuperadmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .restaurant_service
        .list_users(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

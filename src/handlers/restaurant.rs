// src/handlers/restaurant.rs

use axum::{
    extract::{Path, State},
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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{
            PermSettingsRead, PermSettingsUpdate, PermStaffCreate, PermStaffDelete, PermStaffRead, PermStaffUpdate,
            RequirePermission,
        },
        tenancy::RestaurantContext,
    },
    models::restaurant::{
        AddStaffPayload, PublicRestaurant, Restaurant, StaffMember, UpdateRestaurantPayload, UpdateStaffPayload,
    },
};

// GET /api/restaurant
#[utoipa::path(
    get,
    path = "/api/restaurant",
    tag = "Restaurante",
    responses(
        (status = 200, description = "Perfil e configurações do restaurante", body = Restaurant)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_restaurant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSettingsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant = app_state
        .restaurant_service
        .get(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(restaurant))
}

// PUT /api/restaurant
#[utoipa::path(
    put,
    path = "/api/restaurant",
    tag = "Restaurante",
    request_body = UpdateRestaurantPayload,
    responses(
        (status = 200, description = "Restaurante atualizado", body = Restaurant),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_restaurant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSettingsUpdate>,
    Json(payload): Json<UpdateRestaurantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let restaurant = app_state
        .restaurant_service
        .update_profile(&app_state.db_pool, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(restaurant))
}

// GET /api/restaurant/users
#[utoipa::path(
    get,
    path = "/api/restaurant/users",
    tag = "Restaurante",
    responses(
        (status = 200, description = "Equipe do restaurante", body = Vec<StaffMember>)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermStaffRead>,
) -> Result<impl IntoResponse, ApiError> {
    let staff = app_state
        .restaurant_service
        .list_staff(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(staff))
}

// POST /api/restaurant/users
#[utoipa::path(
    post,
    path = "/api/restaurant/users",
    tag = "Restaurante",
    request_body = AddStaffPayload,
    responses(
        (status = 201, description = "Membro vinculado", body = StaffMember),
        (status = 400, description = "Nome e senha obrigatórios para novo usuário"),
        (status = 409, description = "Usuário já vinculado")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermStaffCreate>,
    Json(payload): Json<AddStaffPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let member = app_state
        .restaurant_service
        .add_staff(&app_state.db_pool, tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(member)))
}

// PUT /api/restaurant/users/{user_id}
#[utoipa::path(
    put,
    path = "/api/restaurant/users/{user_id}",
    tag = "Restaurante",
    request_body = UpdateStaffPayload,
    responses(
        (status = 200, description = "Membro atualizado", body = StaffMember),
        (status = 404, description = "Membro não encontrado")
    ),
    params(
        ("user_id" = Uuid, Path, description = "ID do usuário"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermStaffUpdate>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateStaffPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let member = app_state
        .restaurant_service
        .update_staff(tenant.0, user.id, user_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(member))
}

// DELETE /api/restaurant/users/{user_id}
#[utoipa::path(
    delete,
    path = "/api/restaurant/users/{user_id}",
    tag = "Restaurante",
    responses(
        (status = 204, description = "Membro removido"),
        (status = 400, description = "O dono não pode ser removido")
    ),
    params(
        ("user_id" = Uuid, Path, description = "ID do usuário"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermStaffDelete>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .restaurant_service
        .remove_staff(tenant.0, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/public/restaurants/{slug}
#[utoipa::path(
    get,
    path = "/api/public/restaurants/{slug}",
    tag = "Público",
    responses(
        (status = 200, description = "Dados públicos do restaurante", body = PublicRestaurant),
        (status = 404, description = "Restaurante não encontrado ou inativo")
    ),
    params(
        ("slug" = String, Path, description = "Slug do restaurante")
    )
)]
pub async fn public_info(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let info = app_state
        .restaurant_service
        .public_info(&slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(info))
}

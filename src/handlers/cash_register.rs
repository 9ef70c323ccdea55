// src/handlers/cash_register.rs

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
        rbac::{PermCashRegisterCreate, PermCashRegisterRead, PermCashRegisterUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::cash_register::{
        CashMovementPayload, CashRegisterCategory, CashRegisterMovement, CashRegisterSession, CloseSessionPayload,
        CloseSessionResult, CurrentSession, OpenSessionPayload,
    },
};

// POST /api/cash-register/open
#[utoipa::path(
    post,
    path = "/api/cash-register/open",
    tag = "Caixa",
    request_body = OpenSessionPayload,
    responses(
        (status = 201, description = "Caixa aberto", body = CashRegisterSession),
        (status = 400, description = "Já existe caixa aberto para o usuário")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn open_session(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCashRegisterCreate>,
    Json(payload): Json<OpenSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let session = app_state
        .cash_register_service
        .open(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(session)))
}

// GET /api/cash-register/current
#[utoipa::path(
    get,
    path = "/api/cash-register/current",
    tag = "Caixa",
    responses(
        (status = 200, description = "Caixa aberto do usuário com saldo esperado", body = CurrentSession),
        (status = 404, description = "Nenhum caixa aberto")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn current_session(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCashRegisterRead>,
) -> Result<impl IntoResponse, ApiError> {
    let current = app_state
        .cash_register_service
        .current(tenant.0, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(current))
}

// POST /api/cash-register/movements
#[utoipa::path(
    post,
    path = "/api/cash-register/movements",
    tag = "Caixa",
    request_body = CashMovementPayload,
    responses(
        (status = 201, description = "Reforço ou sangria registrado", body = CashRegisterMovement),
        (status = 400, description = "Caixa fechado ou categoria inválida"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_movement(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCashRegisterUpdate>,
    Json(payload): Json<CashMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let movement = app_state
        .cash_register_service
        .add_movement(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movement)))
}

// GET /api/cash-register/sessions/{session_id}/movements
#[utoipa::path(
    get,
    path = "/api/cash-register/sessions/{session_id}/movements",
    tag = "Caixa",
    responses(
        (status = 200, description = "Movimentações da sessão", body = Vec<CashRegisterMovement>)
    ),
    params(
        ("session_id" = Uuid, Path, description = "ID da sessão de caixa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCashRegisterRead>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .cash_register_service
        .list_movements(tenant.0, session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}

// POST /api/cash-register/close
#[utoipa::path(
    post,
    path = "/api/cash-register/close",
    tag = "Caixa",
    request_body = CloseSessionPayload,
    responses(
        (status = 200, description = "Caixa fechado com saldo esperado e diferença", body = CloseSessionResult),
        (status = 404, description = "Nenhum caixa aberto")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_session(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCashRegisterUpdate>,
    Json(payload): Json<CloseSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .cash_register_service
        .close(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// GET /api/cash-register/categories
#[utoipa::path(
    get,
    path = "/api/cash-register/categories",
    tag = "Caixa",
    responses(
        (status = 200, description = "Categorias de reforço e sangria", body = Vec<CashRegisterCategory>)
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
    _guard: RequirePermission<PermCashRegisterRead>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .cash_register_service
        .categories(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

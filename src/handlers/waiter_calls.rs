// src/handlers/waiter_calls.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermWaiterCallsRead, PermWaiterCallsUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::waiter_call::{CreateWaiterCallPayload, UpdateWaiterCallPayload, WaiterCall, WaiterCallFilter},
};

// POST /api/public/restaurants/{slug}/waiter-calls
#[utoipa::path(
    post,
    path = "/api/public/restaurants/{slug}/waiter-calls",
    tag = "Público",
    request_body = CreateWaiterCallPayload,
    responses(
        (status = 201, description = "Garçom chamado", body = WaiterCall),
        (status = 404, description = "Restaurante não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug do restaurante")
    )
)]
pub async fn create_call(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    Json(payload): Json<CreateWaiterCallPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let call = app_state
        .waiter_call_service
        .create_public(&slug, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(call)))
}

// GET /api/waiter-calls
#[utoipa::path(
    get,
    path = "/api/waiter-calls",
    tag = "Chamados",
    responses(
        (status = 200, description = "Chamados do salão", body = Vec<WaiterCall>)
    ),
    params(
        ("status" = Option<String>, Query, description = "pending, attended ou cancelled"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_calls(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermWaiterCallsRead>,
    Query(filter): Query<WaiterCallFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let calls = app_state
        .waiter_call_service
        .list(tenant.0, filter.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(calls))
}

// PATCH /api/waiter-calls/{id}
#[utoipa::path(
    patch,
    path = "/api/waiter-calls/{id}",
    tag = "Chamados",
    request_body = UpdateWaiterCallPayload,
    responses(
        (status = 200, description = "Chamado atualizado", body = WaiterCall),
        (status = 404, description = "Chamado não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do chamado"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_call(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermWaiterCallsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWaiterCallPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let call = app_state
        .waiter_call_service
        .update_status(tenant.0, id, user.id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(call))
}

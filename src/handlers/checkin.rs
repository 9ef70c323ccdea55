// src/handlers/checkin.rs

use axum::{
    extract::{Path, Query, State},
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
        rbac::{PermCheckinsCreate, PermCheckinsRead, PermCheckinsUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::checkin::{
        ActiveCheckin, Checkin, CheckinAnalytics, PublicCheckinPayload, PublicCheckinResponse, RecordCheckinPayload,
    },
};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}

// POST /api/checkin/record
#[utoipa::path(
    post,
    path = "/api/checkin/record",
    tag = "Checkin",
    request_body = RecordCheckinPayload,
    responses(
        (status = 201, description = "Checkin registrado", body = Checkin),
        (status = 400, description = "Cliente já possui checkin ativo"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_checkin(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCheckinsCreate>,
    Json(payload): Json<RecordCheckinPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let checkin = app_state
        .checkin_service
        .record(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(checkin)))
}

// PUT /api/checkin/checkout/{checkin_id}
#[utoipa::path(
    put,
    path = "/api/checkin/checkout/{checkin_id}",
    tag = "Checkin",
    responses(
        (status = 200, description = "Checkout realizado", body = Checkin),
        (status = 404, description = "Checkin ativo não encontrado")
    ),
    params(
        ("checkin_id" = Uuid, Path, description = "ID do checkin"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCheckinsUpdate>,
    Path(checkin_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let checkin = app_state
        .checkin_service
        .checkout(tenant.0, checkin_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(checkin))
}

// GET /api/checkin/active
#[utoipa::path(
    get,
    path = "/api/checkin/active",
    tag = "Checkin",
    responses(
        (status = 200, description = "Checkins ativos com o resumo do cliente", body = Vec<ActiveCheckin>)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_active(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCheckinsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let active = app_state
        .checkin_service
        .list_active(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(active))
}

// GET /api/checkin/analytics/{restaurant_id}
#[utoipa::path(
    get,
    path = "/api/checkin/analytics/{restaurant_id}",
    tag = "Checkin",
    responses(
        (status = 200, description = "Indicadores de visitas no período", body = CheckinAnalytics),
        (status = 400, description = "Período inválido")
    ),
    params(
        ("restaurant_id" = Uuid, Path, description = "ID do restaurante"),
        ("period" = Option<String>, Query, description = "7d, 30d, 90d, 1y ou all")
    ),
    security(("api_jwt" = []))
)]
pub async fn analytics(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCheckinsRead>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let analytics = app_state
        .checkin_service
        .analytics(tenant.0, query.period.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(analytics))
}

// POST /api/public/restaurants/{slug}/checkin
#[utoipa::path(
    post,
    path = "/api/public/restaurants/{slug}/checkin",
    tag = "Público",
    request_body = PublicCheckinPayload,
    responses(
        (status = 201, description = "Checkin via QR code", body = PublicCheckinResponse),
        (status = 400, description = "Identificação ausente ou checkin já ativo"),
        (status = 402, description = "Módulo de checkin não contratado"),
        (status = 404, description = "Restaurante não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug do restaurante")
    )
)]
pub async fn public_checkin(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    Json(payload): Json<PublicCheckinPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .checkin_service
        .public_checkin(&slug, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}

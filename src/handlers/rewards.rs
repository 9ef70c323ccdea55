// src/handlers/rewards.rs

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
        rbac::{PermRewardsCreate, PermRewardsDelete, PermRewardsRead, PermRewardsUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::reward::{CreateRewardPayload, Reward, RewardAnalytics, SpinPayload, SpinResult, UpdateRewardPayload},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardListQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct PublicSpinPath {
    pub slug: String,
    pub reward_id: Uuid,
}

// GET /api/rewards
#[utoipa::path(
    get,
    path = "/api/rewards",
    tag = "Recompensas",
    responses(
        (status = 200, description = "Recompensas do restaurante", body = Vec<Reward>)
    ),
    params(
        ("activeOnly" = Option<bool>, Query, description = "Somente ativas"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_rewards(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermRewardsRead>,
    Query(query): Query<RewardListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rewards = app_state
        .reward_service
        .list(tenant.0, query.active_only)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rewards))
}

// GET /api/rewards/{id}
#[utoipa::path(
    get,
    path = "/api/rewards/{id}",
    tag = "Recompensas",
    responses(
        (status = 200, description = "Recompensa", body = Reward),
        (status = 404, description = "Recompensa não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da recompensa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_reward(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermRewardsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reward = app_state
        .reward_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(reward))
}

// POST /api/rewards
#[utoipa::path(
    post,
    path = "/api/rewards",
    tag = "Recompensas",
    request_body = CreateRewardPayload,
    responses(
        (status = 201, description = "Recompensa criada", body = Reward),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_reward(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermRewardsCreate>,
    Json(payload): Json<CreateRewardPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let reward = app_state
        .reward_service
        .create(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(reward)))
}

// PUT /api/rewards/{id}
#[utoipa::path(
    put,
    path = "/api/rewards/{id}",
    tag = "Recompensas",
    request_body = UpdateRewardPayload,
    responses(
        (status = 200, description = "Recompensa atualizada", body = Reward),
        (status = 404, description = "Recompensa não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da recompensa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_reward(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermRewardsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRewardPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let reward = app_state
        .reward_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(reward))
}

// DELETE /api/rewards/{id}
#[utoipa::path(
    delete,
    path = "/api/rewards/{id}",
    tag = "Recompensas",
    responses(
        (status = 204, description = "Recompensa removida")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da recompensa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_reward(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermRewardsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .reward_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/rewards/{id}/spin
#[utoipa::path(
    post,
    path = "/api/rewards/{id}/spin",
    tag = "Recompensas",
    request_body = SpinPayload,
    responses(
        (status = 201, description = "Roleta girada e cupom gerado", body = SpinResult),
        (status = 400, description = "Recompensa indisponível ou roleta sem itens")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da recompensa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn spin(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermRewardsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SpinPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .reward_service
        .spin(tenant.0, id, payload.customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

// GET /api/rewards/analytics
#[utoipa::path(
    get,
    path = "/api/rewards/analytics",
    tag = "Recompensas",
    responses(
        (status = 200, description = "Indicadores das recompensas", body = RewardAnalytics)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn analytics(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermRewardsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let analytics = app_state
        .reward_service
        .analytics(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(analytics))
}

// POST /api/public/restaurants/{slug}/rewards/{reward_id}/spin
#[utoipa::path(
    post,
    path = "/api/public/restaurants/{slug}/rewards/{reward_id}/spin",
    tag = "Público",
    request_body = SpinPayload,
    responses(
        (status = 201, description = "Roleta girada pelo cliente", body = SpinResult),
        (status = 400, description = "Marco de visitas já girado"),
        (status = 403, description = "Cliente sem giro disponível"),
        (status = 404, description = "Restaurante, cliente ou recompensa não encontrados")
    ),
    params(
        ("slug" = String, Path, description = "Slug do restaurante"),
        ("reward_id" = Uuid, Path, description = "ID da recompensa")
    )
)]
pub async fn public_spin(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(path): Path<PublicSpinPath>,
    Json(payload): Json<SpinPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .reward_service
        .spin_public(&path.slug, path.reward_id, payload.customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

// src/handlers/coupons.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
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
        rbac::{PermCouponsCreate, PermCouponsRead, PermCouponsUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::coupon::{
        Coupon, CouponAnalytics, CouponFilter, CouponValidation, CreateCouponPayload, ExpireResult,
        RedeemCouponPayload,
    },
};

#[derive(Debug, Deserialize)]
pub struct PublicCouponPath {
    pub slug: String,
    pub code: String,
}

// GET /api/coupons
#[utoipa::path(
    get,
    path = "/api/coupons",
    tag = "Cupons",
    responses(
        (status = 200, description = "Cupons com cliente e recompensa (paginado)")
    ),
    params(
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página"),
        ("status" = Option<String>, Query, description = "generated, sent, redeemed, expired ou cancelled"),
        ("search" = Option<String>, Query, description = "Busca pelo código"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_coupons(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCouponsRead>,
    Query(filter): Query<CouponFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .coupon_service
        .list(tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// POST /api/coupons
#[utoipa::path(
    post,
    path = "/api/coupons",
    tag = "Cupons",
    request_body = CreateCouponPayload,
    responses(
        (status = 201, description = "Cupom gerado", body = Coupon),
        (status = 400, description = "Recompensa indisponível para o cliente"),
        (status = 404, description = "Recompensa ou cliente não encontrados")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_coupon(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCouponsCreate>,
    Json(payload): Json<CreateCouponPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let coupon = app_state
        .coupon_service
        .create(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(coupon)))
}

// GET /api/coupons/{id}
#[utoipa::path(
    get,
    path = "/api/coupons/{id}",
    tag = "Cupons",
    responses(
        (status = 200, description = "Cupom", body = Coupon),
        (status = 404, description = "Cupom não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cupom"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_coupon(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCouponsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let coupon = app_state
        .coupon_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(coupon))
}

// POST /api/coupons/{id}/redeem
#[utoipa::path(
    post,
    path = "/api/coupons/{id}/redeem",
    tag = "Cupons",
    request_body(content = RedeemCouponPayload, description = "Valor do pedido (opcional)"),
    responses(
        (status = 200, description = "Cupom resgatado", body = Coupon),
        (status = 400, description = "Cupom já resgatado, cancelado ou expirado"),
        (status = 404, description = "Cupom não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cupom"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn redeem_coupon(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCouponsUpdate>,
    Path(id): Path<Uuid>,
    payload: Option<Json<RedeemCouponPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let coupon = app_state
        .coupon_service
        .redeem(tenant.0, user.id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(coupon))
}

// POST /api/coupons/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/coupons/{id}/cancel",
    tag = "Cupons",
    responses(
        (status = 200, description = "Cupom cancelado", body = Coupon),
        (status = 404, description = "Cupom não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cupom"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_coupon(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCouponsUpdate>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let coupon = app_state
        .coupon_service
        .cancel(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(coupon))
}

// GET /api/coupons/validate/{code}
#[utoipa::path(
    get,
    path = "/api/coupons/validate/{code}",
    tag = "Cupons",
    responses(
        (status = 200, description = "Cupom e se ainda pode ser resgatado", body = CouponValidation),
        (status = 404, description = "Cupom não encontrado")
    ),
    params(
        ("code" = String, Path, description = "Código do cupom"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate_coupon(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCouponsRead>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let validation = app_state
        .coupon_service
        .validate(tenant.0, &code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(validation))
}

// POST /api/coupons/expire
#[utoipa::path(
    post,
    path = "/api/coupons/expire",
    tag = "Cupons",
    responses(
        (status = 200, description = "Cupons vencidos marcados como expirados", body = ExpireResult)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn expire_coupons(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCouponsUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .coupon_service
        .expire_overdue(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// GET /api/coupons/analytics
#[utoipa::path(
    get,
    path = "/api/coupons/analytics",
    tag = "Cupons",
    responses(
        (status = 200, description = "Indicadores dos cupons", body = CouponAnalytics)
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
    _guard: RequirePermission<PermCouponsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let analytics = app_state
        .coupon_service
        .analytics(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(analytics))
}

// GET /api/coupons/{id}/qrcode
#[utoipa::path(
    get,
    path = "/api/coupons/{id}/qrcode",
    tag = "Cupons",
    responses(
        (status = 200, description = "QR code do cupom em SVG", content_type = "image/svg+xml"),
        (status = 404, description = "Cupom não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cupom"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn coupon_qrcode(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCouponsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let svg = app_state
        .coupon_service
        .qrcode(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

// GET /api/public/restaurants/{slug}/coupons/{code}
#[utoipa::path(
    get,
    path = "/api/public/restaurants/{slug}/coupons/{code}",
    tag = "Público",
    responses(
        (status = 200, description = "Cupom e se ainda pode ser resgatado", body = CouponValidation),
        (status = 404, description = "Cupom não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug do restaurante"),
        ("code" = String, Path, description = "Código do cupom")
    )
)]
pub async fn public_validate(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(path): Path<PublicCouponPath>,
) -> Result<impl IntoResponse, ApiError> {
    let validation = app_state
        .coupon_service
        .validate_public(&path.slug, &path.code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(validation))
}

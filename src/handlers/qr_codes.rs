// src/handlers/qr_codes.rs

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
        rbac::{PermQrCodesCreate, PermQrCodesDelete, PermQrCodesRead, PermQrCodesUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::qr_code::{CreateQrCodePayload, QrCode, QrCodeStats, QrCodeType, QrImageQuery, QrScan, UpdateQrCodePayload},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeListQuery {
    pub qr_type: Option<QrCodeType>,
}

// GET /api/qrcodes
#[utoipa::path(
    get,
    path = "/api/qrcodes",
    tag = "QR codes",
    responses(
        (status = 200, description = "QR codes do restaurante", body = Vec<QrCode>)
    ),
    params(
        ("qrType" = Option<String>, Query, description = "feedback, checkin ou menu"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_qr_codes(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermQrCodesRead>,
    Query(query): Query<QrCodeListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let codes = app_state
        .qr_code_service
        .list(tenant.0, query.qr_type)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(codes))
}

// POST /api/qrcodes
#[utoipa::path(
    post,
    path = "/api/qrcodes",
    tag = "QR codes",
    request_body = CreateQrCodePayload,
    responses(
        (status = 201, description = "QR code criado", body = QrCode),
        (status = 400, description = "Mesa obrigatória para o tipo"),
        (status = 409, description = "Já existe QR code deste tipo para a mesa")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_qr_code(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermQrCodesCreate>,
    Json(payload): Json<CreateQrCodePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let code = app_state
        .qr_code_service
        .create(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(code)))
}

// GET /api/qrcodes/{id}
#[utoipa::path(
    get,
    path = "/api/qrcodes/{id}",
    tag = "QR codes",
    responses(
        (status = 200, description = "QR code com leituras e nota média", body = QrCodeStats),
        (status = 404, description = "QR code não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do QR code"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_qr_code(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermQrCodesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .qr_code_service
        .stats(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}

// PUT /api/qrcodes/{id}
#[utoipa::path(
    put,
    path = "/api/qrcodes/{id}",
    tag = "QR codes",
    request_body = UpdateQrCodePayload,
    responses(
        (status = 200, description = "QR code atualizado", body = QrCode),
        (status = 404, description = "QR code não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do QR code"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_qr_code(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermQrCodesUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQrCodePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let code = app_state
        .qr_code_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(code))
}

// DELETE /api/qrcodes/{id}
#[utoipa::path(
    delete,
    path = "/api/qrcodes/{id}",
    tag = "QR codes",
    responses(
        (status = 204, description = "QR code removido"),
        (status = 404, description = "QR code não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do QR code"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_qr_code(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermQrCodesDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .qr_code_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/qrcodes/{id}/image
#[utoipa::path(
    get,
    path = "/api/qrcodes/{id}/image",
    tag = "QR codes",
    responses(
        (status = 200, description = "QR code em SVG para impressão", content_type = "image/svg+xml"),
        (status = 404, description = "QR code não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do QR code"),
        ("size" = Option<u32>, Query, description = "Lado mínimo em pixels (128 a 1024)"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn qr_code_image(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermQrCodesRead>,
    Path(id): Path<Uuid>,
    Query(query): Query<QrImageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let svg = app_state
        .qr_code_service
        .image(tenant.0, id, query.size)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

// GET /api/public/qrcodes/{code}
#[utoipa::path(
    get,
    path = "/api/public/qrcodes/{code}",
    tag = "Público",
    responses(
        (status = 200, description = "Leitura registrada; destino do QR code", body = QrScan),
        (status = 404, description = "QR code inexistente ou desativado")
    ),
    params(
        ("code" = String, Path, description = "Código curto impresso no QR code")
    )
)]
pub async fn scan_qr_code(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let scan = app_state
        .qr_code_service
        .scan(&code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(scan))
}

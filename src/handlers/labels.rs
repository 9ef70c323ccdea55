// src/handlers/labels.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
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
        rbac::{PermLabelsCreate, PermLabelsRead, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::label::{LabelableItem, LossResult, PrintLabelPayload, PrintedLabel, RecordLossPayload},
};

// GET /api/labels/items
#[utoipa::path(
    get,
    path = "/api/labels/items",
    tag = "Etiquetas",
    responses(
        (status = 200, description = "Produtos e ingredientes etiquetáveis", body = Vec<LabelableItem>)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermLabelsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let items = app_state
        .label_service
        .labelable_items(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(items))
}

// GET /api/labels
#[utoipa::path(
    get,
    path = "/api/labels",
    tag = "Etiquetas",
    responses(
        (status = 200, description = "Etiquetas impressas", body = Vec<PrintedLabel>)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_labels(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermLabelsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let labels = app_state
        .label_service
        .list(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(labels))
}

// POST /api/labels/print
#[utoipa::path(
    post,
    path = "/api/labels/print",
    tag = "Etiquetas",
    request_body = PrintLabelPayload,
    responses(
        (status = 201, description = "Etiqueta registrada", body = PrintedLabel),
        (status = 404, description = "Item não encontrado")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn print_label(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermLabelsCreate>,
    Json(payload): Json<PrintLabelPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let label = app_state
        .label_service
        .print(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(label)))
}

// GET /api/labels/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/labels/{id}/pdf",
    tag = "Etiquetas",
    responses(
        (status = 200, description = "Etiqueta em PDF com QR code", content_type = "application/pdf"),
        (status = 404, description = "Etiqueta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da etiqueta"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn label_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermLabelsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = app_state
        .label_service
        .pdf(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"etiqueta-{id}.pdf\"")),
    ];

    Ok((headers, bytes))
}

// POST /api/labels/loss
#[utoipa::path(
    post,
    path = "/api/labels/loss",
    tag = "Etiquetas",
    request_body = RecordLossPayload,
    responses(
        (status = 201, description = "Perda registrada com baixa no estoque", body = LossResult),
        (status = 400, description = "Estoque insuficiente")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_loss(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermLabelsCreate>,
    Json(payload): Json<RecordLossPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .label_service
        .record_loss(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

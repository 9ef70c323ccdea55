// src/handlers/feedbacks.rs

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
        rbac::{PermFeedbacksDelete, PermFeedbacksRead, PermFeedbacksUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::feedback::{
        Feedback, FeedbackDetails, FeedbackFilter, PublicFeedbackPayload, PublicFeedbackResponse,
        RespondFeedbackPayload, UpdateFeedbackPayload,
    },
};

// POST /api/public/restaurants/{slug}/feedback
#[utoipa::path(
    post,
    path = "/api/public/restaurants/{slug}/feedback",
    tag = "Público",
    request_body = PublicFeedbackPayload,
    responses(
        (status = 201, description = "Avaliação registrada", body = PublicFeedbackResponse),
        (status = 400, description = "Nota ou NPS fora da faixa"),
        (status = 404, description = "Restaurante, cliente ou QR code não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug do restaurante")
    )
)]
pub async fn submit_public_feedback(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    Json(payload): Json<PublicFeedbackPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .feedback_service
        .submit_public(&slug, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}

// GET /api/feedbacks
#[utoipa::path(
    get,
    path = "/api/feedbacks",
    tag = "Avaliações",
    responses(
        (status = 200, description = "Avaliações do restaurante (paginado)")
    ),
    params(
        ("status" = Option<String>, Query, description = "pending, reviewed, responded, resolved ou archived"),
        ("priority" = Option<String>, Query, description = "low, medium, high ou urgent"),
        ("source" = Option<String>, Query, description = "qrcode, web ou manual"),
        ("rating" = Option<i32>, Query, description = "Nota exata (1 a 5)"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_feedbacks(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermFeedbacksRead>,
    Query(filter): Query<FeedbackFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .feedback_service
        .list(tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/feedbacks/{id}
#[utoipa::path(
    get,
    path = "/api/feedbacks/{id}",
    tag = "Avaliações",
    responses(
        (status = 200, description = "Avaliação", body = FeedbackDetails),
        (status = 404, description = "Avaliação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da avaliação"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_feedback(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermFeedbacksRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let feedback = app_state
        .feedback_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(feedback))
}

// PATCH /api/feedbacks/{id}
#[utoipa::path(
    patch,
    path = "/api/feedbacks/{id}",
    tag = "Avaliações",
    request_body = UpdateFeedbackPayload,
    responses(
        (status = 200, description = "Avaliação atualizada", body = Feedback),
        (status = 404, description = "Avaliação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da avaliação"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_feedback(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermFeedbacksUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFeedbackPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let feedback = app_state
        .feedback_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(feedback))
}

// POST /api/feedbacks/{id}/respond
#[utoipa::path(
    post,
    path = "/api/feedbacks/{id}/respond",
    tag = "Avaliações",
    request_body = RespondFeedbackPayload,
    responses(
        (status = 200, description = "Resposta registrada", body = Feedback),
        (status = 404, description = "Avaliação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da avaliação"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn respond_feedback(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermFeedbacksUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondFeedbackPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let feedback = app_state
        .feedback_service
        .respond(tenant.0, id, &payload.response_text, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(feedback))
}

// DELETE /api/feedbacks/{id}
#[utoipa::path(
    delete,
    path = "/api/feedbacks/{id}",
    tag = "Avaliações",
    responses(
        (status = 204, description = "Avaliação removida"),
        (status = 404, description = "Avaliação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da avaliação"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_feedback(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermFeedbacksDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .feedback_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// src/handlers/surveys.rs

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
        rbac::{PermSurveysCreate, PermSurveysDelete, PermSurveysRead, PermSurveysUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::survey::{
        CreateSurveyPayload, QuestionDistribution, SubmitSurveyPayload, Survey, SurveyAnalytics, SurveyResponse,
        SurveyStatus, SurveyWithQuestions, UpdateSurveyPayload,
    },
};

#[derive(Debug, Deserialize)]
pub struct SurveyFilter {
    pub status: Option<SurveyStatus>,
}

#[derive(Debug, Deserialize)]
pub struct DistributionPath {
    pub id: Uuid,
    pub question_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PublicSurveyPath {
    pub slug: String,
    pub survey_id: Uuid,
}

// GET /api/surveys
#[utoipa::path(
    get,
    path = "/api/surveys",
    tag = "Pesquisas",
    responses(
        (status = 200, description = "Pesquisas do restaurante", body = Vec<Survey>)
    ),
    params(
        ("status" = Option<String>, Query, description = "draft, active, inactive ou archived"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_surveys(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSurveysRead>,
    Query(filter): Query<SurveyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let surveys = app_state
        .survey_service
        .list(tenant.0, filter.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(surveys))
}

// GET /api/surveys/{id}
#[utoipa::path(
    get,
    path = "/api/surveys/{id}",
    tag = "Pesquisas",
    responses(
        (status = 200, description = "Pesquisa com perguntas ordenadas", body = SurveyWithQuestions),
        (status = 404, description = "Pesquisa não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da pesquisa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSurveysRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(survey))
}

// POST /api/surveys
#[utoipa::path(
    post,
    path = "/api/surveys",
    tag = "Pesquisas",
    request_body = CreateSurveyPayload,
    responses(
        (status = 201, description = "Pesquisa criada", body = SurveyWithQuestions),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSurveysCreate>,
    Json(payload): Json<CreateSurveyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let survey = app_state
        .survey_service
        .create(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(survey)))
}

// PUT /api/surveys/{id}
#[utoipa::path(
    put,
    path = "/api/surveys/{id}",
    tag = "Pesquisas",
    request_body = UpdateSurveyPayload,
    responses(
        (status = 200, description = "Pesquisa atualizada", body = SurveyWithQuestions),
        (status = 404, description = "Pesquisa não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da pesquisa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSurveysUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSurveyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let survey = app_state
        .survey_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(survey))
}

// DELETE /api/surveys/{id}
#[utoipa::path(
    delete,
    path = "/api/surveys/{id}",
    tag = "Pesquisas",
    responses(
        (status = 204, description = "Pesquisa removida")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da pesquisa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSurveysDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .survey_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/surveys/{id}/analytics
#[utoipa::path(
    get,
    path = "/api/surveys/{id}/analytics",
    tag = "Pesquisas",
    responses(
        (status = 200, description = "Respostas, respostas por tipo e NPS", body = SurveyAnalytics)
    ),
    params(
        ("id" = Uuid, Path, description = "ID da pesquisa"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn analytics(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSurveysRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let analytics = app_state
        .survey_service
        .analytics(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(analytics))
}

// GET /api/surveys/{id}/questions/{question_id}/distribution
#[utoipa::path(
    get,
    path = "/api/surveys/{id}/questions/{question_id}/distribution",
    tag = "Pesquisas",
    responses(
        (status = 200, description = "Distribuição das respostas da pergunta", body = QuestionDistribution),
        (status = 404, description = "Pergunta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da pesquisa"),
        ("question_id" = Uuid, Path, description = "ID da pergunta"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn distribution(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermSurveysRead>,
    Path(path): Path<DistributionPath>,
) -> Result<impl IntoResponse, ApiError> {
    let distribution = app_state
        .survey_service
        .distribution(tenant.0, path.id, path.question_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(distribution))
}

// GET /api/public/restaurants/{slug}/surveys/{survey_id}
#[utoipa::path(
    get,
    path = "/api/public/restaurants/{slug}/surveys/{survey_id}",
    tag = "Público",
    responses(
        (status = 200, description = "Pesquisa ativa com perguntas", body = SurveyWithQuestions),
        (status = 404, description = "Pesquisa não encontrada ou inativa")
    ),
    params(
        ("slug" = String, Path, description = "Slug do restaurante"),
        ("survey_id" = Uuid, Path, description = "ID da pesquisa")
    )
)]
pub async fn public_get(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(path): Path<PublicSurveyPath>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .get_public(&path.slug, path.survey_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(survey))
}

// POST /api/public/restaurants/{slug}/surveys/{survey_id}/responses
#[utoipa::path(
    post,
    path = "/api/public/restaurants/{slug}/surveys/{survey_id}/responses",
    tag = "Público",
    request_body = SubmitSurveyPayload,
    responses(
        (status = 201, description = "Respostas registradas", body = SurveyResponse),
        (status = 400, description = "Resposta obrigatória ausente ou valor inválido")
    ),
    params(
        ("slug" = String, Path, description = "Slug do restaurante"),
        ("survey_id" = Uuid, Path, description = "ID da pesquisa")
    )
)]
pub async fn public_submit(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(path): Path<PublicSurveyPath>,
    Json(payload): Json<SubmitSurveyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .survey_service
        .submit_public(&path.slug, path.survey_id, payload.customer_id, &payload.answers)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}

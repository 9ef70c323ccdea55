// src/handlers/iam.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::{PageRequest, DEFAULT_PAGE_SIZE},
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermIamManage, PermIamRead, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::{
        iam::{
            AssignRolesPayload, CheckPermissionPayload, CreateRolePayload, IamCatalog, PermissionDecision,
            PermissionSnapshot, RoleResponse, SetOverridesPayload,
        },
        restaurant::ListQuery,
    },
};

// GET /api/iam/snapshot
#[utoipa::path(
    get,
    path = "/api/iam/snapshot",
    tag = "IAM",
    responses(
        (status = 200, description = "Árvore de permissões efetivas do usuário", body = PermissionSnapshot)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_snapshot(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = app_state
        .iam_service
        .get_snapshot(tenant.0, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json((*snapshot).clone()))
}

// POST /api/iam/check
#[utoipa::path(
    post,
    path = "/api/iam/check",
    tag = "IAM",
    request_body = CheckPermissionPayload,
    responses(
        (status = 200, description = "Decisão sobre a ação", body = PermissionDecision)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn check_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    Json(payload): Json<CheckPermissionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let decision = app_state
        .iam_service
        .check_permission(tenant.0, &user, &payload.feature_key, &payload.action_key)
        .await;

    Ok(Json(decision))
}

// GET /api/iam/catalog
#[utoipa::path(
    get,
    path = "/api/iam/catalog",
    tag = "IAM",
    responses(
        (status = 200, description = "Catálogo de módulos, funcionalidades e ações", body = IamCatalog)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_catalog(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let catalog = app_state
        .iam_service
        .catalog()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(catalog))
}

// GET /api/iam/roles
#[utoipa::path(
    get,
    path = "/api/iam/roles",
    tag = "IAM",
    responses(
        (status = 200, description = "Papéis do restaurante", body = Vec<RoleResponse>)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIamRead>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .iam_service
        .list_roles(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(roles))
}

// POST /api/iam/roles
#[utoipa::path(
    post,
    path = "/api/iam/roles",
    tag = "IAM",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Papel criado", body = RoleResponse),
        (status = 409, description = "Chave de papel já existe")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIamManage>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let role = app_state
        .iam_service
        .create_role(&app_state.db_pool, tenant.0, user.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(role)))
}

// PUT /api/iam/users/{user_id}/roles
#[utoipa::path(
    put,
    path = "/api/iam/users/{user_id}/roles",
    tag = "IAM",
    request_body = AssignRolesPayload,
    responses(
        (status = 204, description = "Papéis atribuídos"),
        (status = 404, description = "Usuário não pertence ao restaurante")
    ),
    params(
        ("user_id" = Uuid, Path, description = "ID do usuário"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIamManage>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignRolesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .iam_service
        .assign_roles(&app_state.db_pool, tenant.0, user.id, user_id, &payload.role_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/iam/users/{user_id}/overrides
#[utoipa::path(
    put,
    path = "/api/iam/users/{user_id}/overrides",
    tag = "IAM",
    request_body = SetOverridesPayload,
    responses(
        (status = 204, description = "Exceções individuais gravadas")
    ),
    params(
        ("user_id" = Uuid, Path, description = "ID do usuário"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_overrides(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIamManage>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetOverridesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .iam_service
        .set_overrides(&app_state.db_pool, tenant.0, user.id, user_id, &payload.overrides)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/audit-logs
#[utoipa::path(
    get,
    path = "/api/audit-logs",
    tag = "IAM",
    responses(
        (status = 200, description = "Trilha de auditoria paginada")
    ),
    params(
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_audit_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermIamRead>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let logs = app_state
        .audit_service
        .list(tenant.0, page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(logs))
}

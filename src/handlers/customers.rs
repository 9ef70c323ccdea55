// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermCustomersCreate, PermCustomersDelete, PermCustomersRead, PermCustomersUpdate, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::{
        customer::{CreateCustomerPayload, Customer, CustomerDetails, UpdateCustomerPayload},
        restaurant::ListQuery,
    },
};

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Clientes",
    responses(
        (status = 200, description = "Clientes do restaurante (paginado)")
    ),
    params(
        ("search" = Option<String>, Query, description = "Busca por nome, e-mail, telefone ou CPF"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersRead>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .customer_service
        .list(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Clientes",
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .get(&app_state.db_pool, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Clientes",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente cadastrado", body = Customer),
        (status = 409, description = "Telefone, e-mail ou CPF já cadastrado")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersCreate>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .customer_service
        .create(&app_state.db_pool, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Clientes",
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .customer_service
        .update(&app_state.db_pool, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Clientes",
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .customer_service
        .delete(tenant.0, id, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/customers/{id}/details
#[utoipa::path(
    get,
    path = "/api/customers/{id}/details",
    tag = "Clientes",
    responses(
        (status = 200, description = "Ficha do cliente com o histórico recente", body = CustomerDetails),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn customer_details(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = app_state
        .customer_service
        .details(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(details))
}

// GET /api/customers/birthdays
#[utoipa::path(
    get,
    path = "/api/customers/birthdays",
    tag = "Clientes",
    responses(
        (status = 200, description = "Aniversariantes do dia", body = Vec<Customer>)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn birthday_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersRead>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .customer_service
        .birthdays(tenant.0, Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customers))
}

// POST /api/customers/{id}/reset-visits
#[utoipa::path(
    post,
    path = "/api/customers/{id}/reset-visits",
    tag = "Clientes",
    responses(
        (status = 200, description = "Contador de visitas zerado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_customer_visits(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersUpdate>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .reset_visits(tenant.0, id, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// DELETE /api/customers/{id}/checkins
#[utoipa::path(
    delete,
    path = "/api/customers/{id}/checkins",
    tag = "Clientes",
    responses(
        (status = 200, description = "Check-ins removidos ({ removed })"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn clear_customer_checkins(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermCustomersDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = app_state
        .customer_service
        .clear_checkins(tenant.0, id, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(json!({ "removed": removed })))
}

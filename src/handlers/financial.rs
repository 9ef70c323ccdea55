// src/handlers/financial.rs

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
        rbac::{
            PermPaymentMethodsCreate, PermPaymentMethodsDelete, PermPaymentMethodsRead, PermPaymentMethodsUpdate,
            PermReportsRead, PermTransactionsCreate, PermTransactionsRead, RequirePermission,
        },
        tenancy::RestaurantContext,
    },
    models::financial::{
        CashFlowQuery, CashFlowReport, CategoryFilter, CreateCategoryPayload, CreateTransactionPayload,
        FinancialCategory, FinancialTransaction, PaymentMethod, PaymentMethodFilter, PaymentMethodPayload,
        TransactionFilter,
    },
};

// =============================================================================
//  LANÇAMENTOS
// =============================================================================

// POST /api/financial/transactions
#[utoipa::path(
    post,
    path = "/api/financial/transactions",
    tag = "Financeiro",
    request_body = CreateTransactionPayload,
    responses(
        (status = 201, description = "Lançamento registrado", body = FinancialTransaction),
        (status = 400, description = "Valor inválido ou categoria de outro tipo")
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermTransactionsCreate>,
    Json(payload): Json<CreateTransactionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let transaction = app_state
        .financial_service
        .create_transaction(tenant.0, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

// GET /api/financial/transactions
#[utoipa::path(
    get,
    path = "/api/financial/transactions",
    tag = "Financeiro",
    responses(
        (status = 200, description = "Lançamentos filtrados", body = Vec<FinancialTransaction>)
    ),
    params(
        ("type" = Option<String>, Query, description = "income ou expense"),
        ("categoryId" = Option<Uuid>, Query, description = "Categoria"),
        ("startDate" = Option<String>, Query, description = "Data inicial (YYYY-MM-DD)"),
        ("endDate" = Option<String>, Query, description = "Data final (YYYY-MM-DD)"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermTransactionsRead>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = app_state
        .financial_service
        .list_transactions(tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(transactions))
}

// =============================================================================
//  CATEGORIAS
// =============================================================================

// GET /api/financial/categories
#[utoipa::path(
    get,
    path = "/api/financial/categories",
    tag = "Financeiro",
    responses(
        (status = 200, description = "Categorias do restaurante e globais", body = Vec<FinancialCategory>)
    ),
    params(
        ("type" = Option<String>, Query, description = "income ou expense"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermTransactionsRead>,
    Query(filter): Query<CategoryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .financial_service
        .list_categories(tenant.0, filter.category_type)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

// POST /api/financial/categories
#[utoipa::path(
    post,
    path = "/api/financial/categories",
    tag = "Financeiro",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = FinancialCategory)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermTransactionsCreate>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .financial_service
        .create_category(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// =============================================================================
//  FORMAS DE PAGAMENTO
// =============================================================================

// GET /api/financial/payment-methods
#[utoipa::path(
    get,
    path = "/api/financial/payment-methods",
    tag = "Financeiro",
    responses(
        (status = 200, description = "Formas de pagamento do restaurante e globais", body = Vec<PaymentMethod>)
    ),
    params(
        ("type" = Option<String>, Query, description = "Tipo da forma de pagamento"),
        ("isActive" = Option<bool>, Query, description = "Somente ativas/inativas"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payment_methods(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermPaymentMethodsRead>,
    Query(filter): Query<PaymentMethodFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let methods = app_state
        .financial_service
        .list_payment_methods(tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(methods))
}

// POST /api/financial/payment-methods
#[utoipa::path(
    post,
    path = "/api/financial/payment-methods",
    tag = "Financeiro",
    request_body = PaymentMethodPayload,
    responses(
        (status = 201, description = "Forma de pagamento criada", body = PaymentMethod)
    ),
    params(
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermPaymentMethodsCreate>,
    Json(payload): Json<PaymentMethodPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let method = app_state
        .financial_service
        .create_payment_method(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(method)))
}

// PUT /api/financial/payment-methods/{id}
#[utoipa::path(
    put,
    path = "/api/financial/payment-methods/{id}",
    tag = "Financeiro",
    request_body = PaymentMethodPayload,
    responses(
        (status = 200, description = "Forma de pagamento atualizada", body = PaymentMethod),
        (status = 404, description = "Não encontrada ou global")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da forma de pagamento"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermPaymentMethodsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentMethodPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let method = app_state
        .financial_service
        .update_payment_method(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(method))
}

// DELETE /api/financial/payment-methods/{id}
#[utoipa::path(
    delete,
    path = "/api/financial/payment-methods/{id}",
    tag = "Financeiro",
    responses(
        (status = 204, description = "Forma de pagamento removida"),
        (status = 404, description = "Não encontrada ou global")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da forma de pagamento"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermPaymentMethodsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .financial_service
        .delete_payment_method(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/financial/cash-flow
#[utoipa::path(
    get,
    path = "/api/financial/cash-flow",
    tag = "Financeiro",
    responses(
        (status = 200, description = "Entradas, saídas, reforços, sangrias e saldo do período", body = CashFlowReport),
        (status = 400, description = "Período obrigatório ou inválido")
    ),
    params(
        ("startDate" = String, Query, description = "Data inicial (YYYY-MM-DD)"),
        ("endDate" = String, Query, description = "Data final (YYYY-MM-DD)"),
        ("x-restaurant-id" = Uuid, Header, description = "ID do restaurante")
    ),
    security(("api_jwt" = []))
)]
pub async fn cash_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: RestaurantContext,
    _guard: RequirePermission<PermReportsRead>,
    Query(query): Query<CashFlowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .financial_service
        .cash_flow(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

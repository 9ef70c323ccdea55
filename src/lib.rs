// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, rate_limit::rate_limit};

/// Monta o router completo da API (sem CORS/Trace, que ficam no binário).
pub fn app(app_state: AppState) -> Router {
    let limiter = axum_middleware::from_fn_with_state(app_state.rate_limiter.clone(), rate_limit);
    let guard = axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Rotas públicas de autenticação (limitadas por IP)
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route_layer(limiter.clone());

    // Rotas do QR code do salão, sem login
    let public_routes = Router::new()
        .route("/api/public/restaurants/{slug}", get(handlers::restaurant::public_info))
        .route("/api/public/restaurants/{slug}/checkin", post(handlers::checkin::public_checkin))
        .route("/api/public/restaurants/{slug}/waiter-calls", post(handlers::waiter_calls::create_call))
        .route("/api/public/restaurants/{slug}/coupons/{code}", get(handlers::coupons::public_validate))
        .route(
            "/api/public/restaurants/{slug}/rewards/{reward_id}/spin",
            post(handlers::rewards::public_spin),
        )
        .route(
            "/api/public/restaurants/{slug}/surveys/{survey_id}",
            get(handlers::surveys::public_get),
        )
        .route(
            "/api/public/restaurants/{slug}/surveys/{survey_id}/responses",
            post(handlers::surveys::public_submit),
        )
        .route(
            "/api/public/restaurants/{slug}/feedback",
            post(handlers::feedbacks::submit_public_feedback),
        )
        .route("/api/public/qrcodes/{code}", get(handlers::qr_codes::scan_qr_code))
        .route_layer(limiter.clone());

    // Rotas autenticadas: o guard roda antes do limitador, que então usa o ID do usuário
    let protected_routes = Router::new()
        // Conta
        .route("/api/auth/me", get(handlers::auth::get_me))
        .route("/api/auth/profile", put(handlers::auth::update_profile))
        .route("/api/auth/password", put(handlers::auth::change_password))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // IAM
        .route("/api/iam/snapshot", get(handlers::iam::get_snapshot))
        .route("/api/iam/check", post(handlers::iam::check_permission))
        .route("/api/iam/catalog", get(handlers::iam::get_catalog))
        .route(
            "/api/iam/roles",
            get(handlers::iam::list_roles).post(handlers::iam::create_role),
        )
        .route("/api/iam/users/{user_id}/roles", put(handlers::iam::assign_roles))
        .route("/api/iam/users/{user_id}/overrides", put(handlers::iam::set_overrides))
        .route("/api/audit-logs", get(handlers::iam::list_audit_logs))
        // Restaurante
        .route(
            "/api/restaurant",
            get(handlers::restaurant::get_restaurant).put(handlers::restaurant::update_restaurant),
        )
        .route(
            "/api/restaurant/users",
            get(handlers::restaurant::list_staff).post(handlers::restaurant::add_staff),
        )
        .route(
            "/api/restaurant/users/{user_id}",
            put(handlers::restaurant::update_staff).delete(handlers::restaurant::remove_staff),
        )
        // Plataforma
        .route(
            "/api/admin/restaurants",
            get(handlers::admin::list_restaurants).post(handlers::admin::create_restaurant),
        )
        .route("/api/admin/restaurants/{id}", put(handlers::admin::update_restaurant))
        .route("/api/admin/restaurants/{id}/status", patch(handlers::admin::update_status))
        .route("/api/admin/restaurants/{id}/entitlements", put(handlers::admin::set_entitlements))
        .route("/api/admin/users", get(handlers::admin::list_users))
        // Clientes
        .route(
            "/api/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route("/api/customers/birthdays", get(handlers::customers::birthday_customers))
        .route(
            "/api/customers/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route("/api/customers/{id}/details", get(handlers::customers::customer_details))
        .route("/api/customers/{id}/reset-visits", post(handlers::customers::reset_customer_visits))
        .route("/api/customers/{id}/checkins", delete(handlers::customers::clear_customer_checkins))
        // Check-in
        .route("/api/checkin/record", post(handlers::checkin::record_checkin))
        .route("/api/checkin/checkout/{checkin_id}", put(handlers::checkin::checkout))
        .route("/api/checkin/active", get(handlers::checkin::list_active))
        .route("/api/checkin/analytics/{restaurant_id}", get(handlers::checkin::analytics))
        // Cardápio
        .route(
            "/api/products",
            get(handlers::menu::list_products).post(handlers::menu::create_product),
        )
        .route(
            "/api/products/{id}",
            get(handlers::menu::get_product)
                .put(handlers::menu::update_product)
                .delete(handlers::menu::delete_product),
        )
        .route("/api/products/{id}/toggle", patch(handlers::menu::toggle_product))
        .route(
            "/api/categories",
            get(handlers::menu::list_categories).post(handlers::menu::create_category),
        )
        .route(
            "/api/categories/{id}",
            put(handlers::menu::update_category).delete(handlers::menu::delete_category),
        )
        .route(
            "/api/ingredients",
            get(handlers::menu::list_ingredients).post(handlers::menu::create_ingredient),
        )
        .route(
            "/api/ingredients/{id}",
            put(handlers::menu::update_ingredient).delete(handlers::menu::delete_ingredient),
        )
        // Estoque
        .route("/api/stock/restaurant/{restaurant_id}", get(handlers::stock::list_stock))
        .route("/api/stock/restaurant/{restaurant_id}/move", post(handlers::stock::move_stock))
        .route(
            "/api/stock/restaurant/{restaurant_id}/history/{stockable_type}/{stockable_id}",
            get(handlers::stock::history),
        )
        .route("/api/stock/restaurant/{restaurant_id}/dashboard", get(handlers::stock::dashboard))
        // Etiquetas
        .route("/api/labels", get(handlers::labels::list_labels))
        .route("/api/labels/items", get(handlers::labels::list_items))
        .route("/api/labels/print", post(handlers::labels::print_label))
        .route("/api/labels/loss", post(handlers::labels::record_loss))
        .route("/api/labels/{id}/pdf", get(handlers::labels::label_pdf))
        // Recompensas
        .route(
            "/api/rewards",
            get(handlers::rewards::list_rewards).post(handlers::rewards::create_reward),
        )
        .route("/api/rewards/analytics", get(handlers::rewards::analytics))
        .route(
            "/api/rewards/{id}",
            get(handlers::rewards::get_reward)
                .put(handlers::rewards::update_reward)
                .delete(handlers::rewards::delete_reward),
        )
        .route("/api/rewards/{id}/spin", post(handlers::rewards::spin))
        // Cupons
        .route(
            "/api/coupons",
            get(handlers::coupons::list_coupons).post(handlers::coupons::create_coupon),
        )
        .route("/api/coupons/analytics", get(handlers::coupons::analytics))
        .route("/api/coupons/expire", post(handlers::coupons::expire_coupons))
        .route("/api/coupons/validate/{code}", get(handlers::coupons::validate_coupon))
        .route("/api/coupons/{id}", get(handlers::coupons::get_coupon))
        .route("/api/coupons/{id}/redeem", post(handlers::coupons::redeem_coupon))
        .route("/api/coupons/{id}/cancel", post(handlers::coupons::cancel_coupon))
        .route("/api/coupons/{id}/qrcode", get(handlers::coupons::coupon_qrcode))
        // Pesquisas
        .route(
            "/api/surveys",
            get(handlers::surveys::list_surveys).post(handlers::surveys::create_survey),
        )
        .route(
            "/api/surveys/{id}",
            get(handlers::surveys::get_survey)
                .put(handlers::surveys::update_survey)
                .delete(handlers::surveys::delete_survey),
        )
        .route("/api/surveys/{id}/analytics", get(handlers::surveys::analytics))
        .route(
            "/api/surveys/{id}/questions/{question_id}/distribution",
            get(handlers::surveys::distribution),
        )
        // Financeiro
        .route(
            "/api/financial/transactions",
            get(handlers::financial::list_transactions).post(handlers::financial::create_transaction),
        )
        .route(
            "/api/financial/categories",
            get(handlers::financial::list_categories).post(handlers::financial::create_category),
        )
        .route(
            "/api/financial/payment-methods",
            get(handlers::financial::list_payment_methods).post(handlers::financial::create_payment_method),
        )
        .route(
            "/api/financial/payment-methods/{id}",
            put(handlers::financial::update_payment_method).delete(handlers::financial::delete_payment_method),
        )
        .route("/api/financial/cash-flow", get(handlers::financial::cash_flow))
        // Caixa
        .route("/api/cash-register/open", post(handlers::cash_register::open_session))
        .route("/api/cash-register/current", get(handlers::cash_register::current_session))
        .route("/api/cash-register/movements", post(handlers::cash_register::add_movement))
        .route(
            "/api/cash-register/sessions/{session_id}/movements",
            get(handlers::cash_register::list_movements),
        )
        .route("/api/cash-register/close", post(handlers::cash_register::close_session))
        .route("/api/cash-register/categories", get(handlers::cash_register::list_categories))
        // Avaliações
        .route("/api/feedbacks", get(handlers::feedbacks::list_feedbacks))
        .route(
            "/api/feedbacks/{id}",
            get(handlers::feedbacks::get_feedback)
                .patch(handlers::feedbacks::update_feedback)
                .delete(handlers::feedbacks::delete_feedback),
        )
        .route("/api/feedbacks/{id}/respond", post(handlers::feedbacks::respond_feedback))
        // QR codes de mesa
        .route(
            "/api/qrcodes",
            get(handlers::qr_codes::list_qr_codes).post(handlers::qr_codes::create_qr_code),
        )
        .route(
            "/api/qrcodes/{id}",
            get(handlers::qr_codes::get_qr_code)
                .put(handlers::qr_codes::update_qr_code)
                .delete(handlers::qr_codes::delete_qr_code),
        )
        .route("/api/qrcodes/{id}/image", get(handlers::qr_codes::qr_code_image))
        // Chamados
        .route("/api/waiter-calls", get(handlers::waiter_calls::list_calls))
        .route("/api/waiter-calls/{id}", patch(handlers::waiter_calls::update_call))
        .route_layer(limiter)
        .route_layer(guard);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(auth_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}

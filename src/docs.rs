// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::common;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::update_profile,
        handlers::auth::change_password,
        handlers::auth::logout,

        // --- IAM ---
        handlers::iam::get_snapshot,
        handlers::iam::check_permission,
        handlers::iam::get_catalog,
        handlers::iam::list_roles,
        handlers::iam::create_role,
        handlers::iam::assign_roles,
        handlers::iam::set_overrides,
        handlers::iam::list_audit_logs,

        // --- Restaurante ---
        handlers::restaurant::get_restaurant,
        handlers::restaurant::update_restaurant,
        handlers::restaurant::list_staff,
        handlers::restaurant::add_staff,
        handlers::restaurant::update_staff,
        handlers::restaurant::remove_staff,

        // --- Admin ---
        handlers::admin::list_restaurants,
        handlers::admin::create_restaurant,
        handlers::admin::update_restaurant,
        handlers::admin::update_status,
        handlers::admin::set_entitlements,
        handlers::admin::list_users,

        // --- Clientes ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::customers::customer_details,
        handlers::customers::birthday_customers,
        handlers::customers::reset_customer_visits,
        handlers::customers::clear_customer_checkins,

        // --- Checkin ---
        handlers::checkin::record_checkin,
        handlers::checkin::checkout,
        handlers::checkin::list_active,
        handlers::checkin::analytics,

        // --- Cardápio ---
        handlers::menu::list_products,
        handlers::menu::get_product,
        handlers::menu::create_product,
        handlers::menu::update_product,
        handlers::menu::toggle_product,
        handlers::menu::delete_product,
        handlers::menu::list_categories,
        handlers::menu::create_category,
        handlers::menu::update_category,
        handlers::menu::delete_category,
        handlers::menu::list_ingredients,
        handlers::menu::create_ingredient,
        handlers::menu::update_ingredient,
        handlers::menu::delete_ingredient,

        // --- Estoque ---
        handlers::stock::list_stock,
        handlers::stock::move_stock,
        handlers::stock::history,
        handlers::stock::dashboard,

        // --- Etiquetas ---
        handlers::labels::list_items,
        handlers::labels::list_labels,
        handlers::labels::print_label,
        handlers::labels::label_pdf,
        handlers::labels::record_loss,

        // --- Recompensas ---
        handlers::rewards::list_rewards,
        handlers::rewards::get_reward,
        handlers::rewards::create_reward,
        handlers::rewards::update_reward,
        handlers::rewards::delete_reward,
        handlers::rewards::spin,
        handlers::rewards::analytics,

        // --- Cupons ---
        handlers::coupons::list_coupons,
        handlers::coupons::create_coupon,
        handlers::coupons::get_coupon,
        handlers::coupons::redeem_coupon,
        handlers::coupons::cancel_coupon,
        handlers::coupons::validate_coupon,
        handlers::coupons::expire_coupons,
        handlers::coupons::analytics,
        handlers::coupons::coupon_qrcode,

        // --- Pesquisas ---
        handlers::surveys::list_surveys,
        handlers::surveys::get_survey,
        handlers::surveys::create_survey,
        handlers::surveys::update_survey,
        handlers::surveys::delete_survey,
        handlers::surveys::analytics,
        handlers::surveys::distribution,

        // --- Financeiro ---
        handlers::financial::create_transaction,
        handlers::financial::list_transactions,
        handlers::financial::list_categories,
        handlers::financial::create_category,
        handlers::financial::list_payment_methods,
        handlers::financial::create_payment_method,
        handlers::financial::update_payment_method,
        handlers::financial::delete_payment_method,
        handlers::financial::cash_flow,

        // --- Caixa ---
        handlers::cash_register::open_session,
        handlers::cash_register::current_session,
        handlers::cash_register::add_movement,
        handlers::cash_register::list_movements,
        handlers::cash_register::close_session,
        handlers::cash_register::list_categories,

        // --- Avaliações ---
        handlers::feedbacks::list_feedbacks,
        handlers::feedbacks::get_feedback,
        handlers::feedbacks::update_feedback,
        handlers::feedbacks::respond_feedback,
        handlers::feedbacks::delete_feedback,

        // --- QR codes ---
        handlers::qr_codes::list_qr_codes,
        handlers::qr_codes::create_qr_code,
        handlers::qr_codes::get_qr_code,
        handlers::qr_codes::update_qr_code,
        handlers::qr_codes::delete_qr_code,
        handlers::qr_codes::qr_code_image,

        // --- Chamados ---
        handlers::waiter_calls::list_calls,
        handlers::waiter_calls::update_call,

        // --- Público ---
        handlers::restaurant::public_info,
        handlers::checkin::public_checkin,
        handlers::waiter_calls::create_call,
        handlers::coupons::public_validate,
        handlers::rewards::public_spin,
        handlers::surveys::public_get,
        handlers::surveys::public_submit,
        handlers::feedbacks::submit_public_feedback,
        handlers::qr_codes::scan_qr_code,
    ),
    components(
        schemas(
            // --- Comum ---
            common::db_utils::Pagination,

            // --- Auth ---
            models::auth::User,
            models::restaurant::UserRestaurant,

            // --- Enums ---
            models::restaurant::RestaurantStatus,
            models::iam::EntitlementEntityType,
            models::iam::EntitlementStatus,
            models::iam::PermissionReason,
            models::checkin::CheckinStatus,
            models::stock::StockableType,
            models::stock::MovementType,
            models::stock::StockStatus,
            models::reward::RewardType,
            models::coupon::CouponStatus,
            models::survey::SurveyStatus,
            models::survey::QuestionType,
            models::financial::TransactionType,
            models::cash_register::CashMovementType,
            models::cash_register::CashSessionStatus,
            models::waiter_call::WaiterCallStatus,
            models::feedback::FeedbackType,
            models::feedback::FeedbackSource,
            models::feedback::FeedbackStatus,
            models::feedback::FeedbackPriority,
            models::qr_code::QrCodeType,

            // --- Respostas paginadas ---
            models::customer::Customer,
            models::coupon::CouponDetails,
            models::audit::AuditLog,
            models::feedback::FeedbackDetails,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, perfil e sessão"),
        (name = "IAM", description = "Cargos, permissões, exceções e auditoria"),
        (name = "Restaurante", description = "Perfil, configurações e equipe do restaurante"),
        (name = "Admin", description = "Gestão da plataforma (superadmin)"),
        (name = "Clientes", description = "Cadastro de clientes"),
        (name = "Checkin", description = "Visitas no salão e indicadores"),
        (name = "Cardápio", description = "Produtos, categorias e ingredientes"),
        (name = "Estoque", description = "Saldos e movimentações de produtos e ingredientes"),
        (name = "Etiquetas", description = "Impressão de etiquetas e registro de perdas"),
        (name = "Recompensas", description = "Programa de fidelidade e roleta"),
        (name = "Cupons", description = "Cupons gerados, resgates e validação"),
        (name = "Pesquisas", description = "Pesquisas de satisfação e NPS"),
        (name = "Financeiro", description = "Lançamentos, categorias, formas de pagamento e fluxo de caixa"),
        (name = "Caixa", description = "Abertura, reforços, sangrias e fechamento"),
        (name = "Avaliações", description = "Avaliações rápidas dos clientes e respostas"),
        (name = "QR codes", description = "QR codes de mesa, leituras e impressão"),
        (name = "Chamados", description = "Chamados de garçom"),
        (name = "Público", description = "Rotas do QR code, sem autenticação")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

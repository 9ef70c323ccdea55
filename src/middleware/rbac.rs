// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::json;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::RestaurantContext},
    models::iam::PermissionDecision,
};

/// 1. O Trait que define o que é uma Permissão: (funcionalidade, ação) do catálogo IAM
pub trait PermissionDef: Send + Sync + 'static {
    const FEATURE: &'static str;
    const ACTION: &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

/// Negação por plano vira 402; as demais, 403.
pub fn decision_to_error(decision: PermissionDecision) -> Option<AppError> {
    if decision.allowed {
        None
    } else if decision.locked() {
        Some(AppError::PaymentRequired("permission.feature_locked"))
    } else {
        Some(AppError::Forbidden("permission.denied"))
    }
}

// 3. Implementação do FromRequestParts
impl<T> FromRequestParts<AppState> for RequirePermission<T>
where
    T: PermissionDef,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_parts(parts);

        // A. Extrai Usuário
        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &state.i18n_store))?;

        // B. Extrai o restaurante (reaproveita o que já foi resolvido)
        let RestaurantContext(restaurant_id) = RestaurantContext::from_request_parts(parts, state).await?;

        // C. Avalia sobre o snapshot
        let decision = state
            .iam_service
            .check_permission(restaurant_id, &user, T::FEATURE, T::ACTION)
            .await;

        if let Some(err) = decision_to_error(decision) {
            tracing::debug!(
                user_id = %user.id,
                %restaurant_id,
                feature = T::FEATURE,
                action = T::ACTION,
                reason = ?decision.reason,
                "Permissão negada"
            );

            let mut api_error = err.to_api_error(&locale, &state.i18n_store);
            api_error.details = Some(json!({
                "feature": T::FEATURE,
                "action": T::ACTION,
                "reason": decision.reason,
            }));
            return Err(api_error);
        }

        Ok(RequirePermission(PhantomData))
    }
}

/// Rotas da plataforma (/api/admin): apenas superadmins.
pub struct RequireSuperadmin;

impl<S> FromRequestParts<S> for RequireSuperadmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        if !user.0.is_superadmin {
            return Err(AppError::Forbidden("restaurant.superadmin_required"));
        }

        Ok(RequireSuperadmin)
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $feature:literal, $action:literal) => {
        pub struct $name;
        impl PermissionDef for $name {
            const FEATURE: &'static str = $feature;
            const ACTION: &'static str = $action;
        }
    };
}

// Fidelidade
permission!(PermCheckinsCreate, "checkins", "create");
permission!(PermCheckinsRead, "checkins", "read");
permission!(PermCheckinsUpdate, "checkins", "update");
permission!(PermWaiterCallsRead, "waiter_calls", "read");
permission!(PermWaiterCallsUpdate, "waiter_calls", "update");
permission!(PermCouponsCreate, "coupons", "create");
permission!(PermCouponsRead, "coupons", "read");
permission!(PermCouponsUpdate, "coupons", "update");
permission!(PermRewardsCreate, "rewards", "create");
permission!(PermRewardsRead, "rewards", "read");
permission!(PermRewardsUpdate, "rewards", "update");
permission!(PermRewardsDelete, "rewards", "delete");
permission!(PermSurveysCreate, "surveys", "create");
permission!(PermSurveysRead, "surveys", "read");
permission!(PermSurveysUpdate, "surveys", "update");
permission!(PermSurveysDelete, "surveys", "delete");
permission!(PermCustomersCreate, "customers", "create");
permission!(PermCustomersRead, "customers", "read");
permission!(PermCustomersUpdate, "customers", "update");
permission!(PermCustomersDelete, "customers", "delete");
permission!(PermFeedbacksRead, "feedbacks", "read");
permission!(PermFeedbacksUpdate, "feedbacks", "update");
permission!(PermFeedbacksDelete, "feedbacks", "delete");
permission!(PermQrCodesCreate, "qrcodes", "create");
permission!(PermQrCodesRead, "qrcodes", "read");
permission!(PermQrCodesUpdate, "qrcodes", "update");
permission!(PermQrCodesDelete, "qrcodes", "delete");

// Estoque
permission!(PermStockRead, "stock", "read");
permission!(PermStockCreate, "stock", "create");
permission!(PermLabelsRead, "labels", "read");
permission!(PermLabelsCreate, "labels", "create");

// Cardápio
permission!(PermProductsCreate, "products", "create");
permission!(PermProductsRead, "products", "read");
permission!(PermProductsUpdate, "products", "update");
permission!(PermProductsDelete, "products", "delete");
permission!(PermCategoriesCreate, "categories", "create");
permission!(PermCategoriesRead, "categories", "read");
permission!(PermCategoriesUpdate, "categories", "update");
permission!(PermCategoriesDelete, "categories", "delete");
permission!(PermIngredientsCreate, "ingredients", "create");
permission!(PermIngredientsRead, "ingredients", "read");
permission!(PermIngredientsUpdate, "ingredients", "update");
permission!(PermIngredientsDelete, "ingredients", "delete");

// Financeiro
permission!(PermTransactionsCreate, "financial_transactions", "create");
permission!(PermTransactionsRead, "financial_transactions", "read");
permission!(PermReportsRead, "financial_reports", "read");
permission!(PermPaymentMethodsCreate, "payment_methods", "create");
permission!(PermPaymentMethodsRead, "payment_methods", "read");
permission!(PermPaymentMethodsUpdate, "payment_methods", "update");
permission!(PermPaymentMethodsDelete, "payment_methods", "delete");
permission!(PermCashRegisterCreate, "cash_register", "create");
permission!(PermCashRegisterRead, "cash_register", "read");
permission!(PermCashRegisterUpdate, "cash_register", "update");

// Configurações
permission!(PermSettingsRead, "restaurant_settings", "read");
permission!(PermSettingsUpdate, "restaurant_settings", "update");
permission!(PermStaffCreate, "restaurant_users", "create");
permission!(PermStaffRead, "restaurant_users", "read");
permission!(PermStaffUpdate, "restaurant_users", "update");
permission!(PermStaffDelete, "restaurant_users", "delete");
permission!(PermIamRead, "iam", "read");
permission!(PermIamManage, "iam", "manage");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::iam::PermissionReason;
    use axum::http::StatusCode;

    #[test]
    fn allowed_decision_passes() {
        assert!(decision_to_error(PermissionDecision::allow(PermissionReason::RoleAllow)).is_none());
        assert!(decision_to_error(PermissionDecision::allow(PermissionReason::Owner)).is_none());
    }

    #[test]
    fn locked_decision_is_payment_required() {
        for reason in [PermissionReason::FeatureLocked, PermissionReason::EntitlementLocked] {
            let err = decision_to_error(PermissionDecision::deny(reason)).unwrap();
            assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
        }
    }

    #[test]
    fn other_denials_are_forbidden() {
        for reason in [
            PermissionReason::DefaultDeny,
            PermissionReason::RoleDeny,
            PermissionReason::UserDeny,
            PermissionReason::PermissionNotFound,
            PermissionReason::SnapshotError,
        ] {
            let err = decision_to_error(PermissionDecision::deny(reason)).unwrap();
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn permission_types_carry_catalog_keys() {
        assert_eq!(PermCheckinsCreate::FEATURE, "checkins");
        assert_eq!(PermCheckinsCreate::ACTION, "create");
        assert_eq!(PermIamManage::ACTION, "manage");
    }
}

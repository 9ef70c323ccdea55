// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::request::Parts,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::restaurant::{Restaurant, RestaurantStatus},
    services::auth::primary_restaurant,
};

// O nome do nosso cabeçalho HTTP customizado
const RESTAURANT_ID_HEADER: &str = "x-restaurant-id";
const RESTAURANT_ID_PARAM: &str = "restaurant_id";

// O restaurante ativo da requisição, já validado para o usuário.
#[derive(Debug, Clone, Copy)]
pub struct RestaurantContext(pub Uuid);

/// Restaurante pedido explicitamente: o parâmetro de rota vence o cabeçalho.
/// `None` significa cair no restaurante principal do usuário.
pub fn explicit_restaurant(path_param: Option<&str>, header: Option<&str>) -> Result<Option<Uuid>, AppError> {
    match path_param.or(header) {
        Some(value) => Uuid::parse_str(value.trim())
            .map(Some)
            .map_err(|_| AppError::BadRequest("restaurant.context_required")),
        None => Ok(None),
    }
}

/// Regras de acesso ao restaurante resolvido, na ordem: vínculo, status, assinatura.
/// Superadmin não precisa de vínculo nem de assinatura em dia.
pub fn check_access(
    restaurant: &Restaurant,
    is_superadmin: bool,
    is_member: bool,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if is_superadmin {
        return Ok(());
    }
    if !is_member {
        return Err(AppError::Forbidden("restaurant.access_denied"));
    }
    if restaurant.status != RestaurantStatus::Active {
        return Err(AppError::Forbidden("restaurant.inactive"));
    }
    if restaurant.subscription_expired(now) {
        return Err(AppError::PaymentRequired("restaurant.subscription_expired"));
    }
    Ok(())
}

async fn requested_restaurant(parts: &mut Parts, state: &AppState, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
    let path_param = match RawPathParams::from_request_parts(parts, state).await {
        Ok(params) => params
            .iter()
            .find(|(name, _)| *name == RESTAURANT_ID_PARAM)
            .map(|(_, value)| value.to_owned()),
        Err(_) => None,
    };
    // Cabeçalho com bytes inválidos vira string vazia e falha no parse
    let header = parts
        .headers
        .get(RESTAURANT_ID_HEADER)
        .map(|value| value.to_str().unwrap_or_default());

    if let Some(id) = explicit_restaurant(path_param.as_deref(), header)? {
        return Ok(Some(id));
    }

    let restaurants = state.restaurant_service.list_for_user(user_id).await?;
    Ok(primary_restaurant(&restaurants).map(|r| r.id))
}

async fn resolve(parts: &mut Parts, state: &AppState) -> Result<RestaurantContext, AppError> {
    let AuthenticatedUser(user) = parts
        .extensions
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or(AppError::InvalidToken)?;

    let restaurant_id = requested_restaurant(parts, state, user.id)
        .await?
        .ok_or(AppError::BadRequest("restaurant.context_required"))?;

    let restaurant = state
        .restaurant_service
        .find_by_id(restaurant_id)
        .await?
        .ok_or(AppError::NotFound("restaurant.not_found"))?;

    let is_member = user.is_superadmin
        || state
            .restaurant_service
            .membership(user.id, restaurant.id)
            .await?
            .is_some();

    check_access(&restaurant, user.is_superadmin, is_member, Utc::now())?;
    Ok(RestaurantContext(restaurant.id))
}

impl FromRequestParts<AppState> for RestaurantContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Já resolvido por outro extrator nesta requisição
        if let Some(ctx) = parts.extensions.get::<RestaurantContext>() {
            return Ok(*ctx);
        }

        let ctx = resolve(parts, state).await.map_err(|e| {
            let locale = Locale::from_parts(parts);
            e.to_api_error(&locale, &state.i18n_store)
        })?;

        parts.extensions.insert(ctx);
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn restaurant(status: RestaurantStatus, expires_at: Option<DateTime<Utc>>) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            name: "Cantina".into(),
            slug: "cantina".into(),
            description: None,
            email: None,
            phone: None,
            cuisine_type: None,
            address: json!({}),
            status,
            subscription_plan: "basic".into(),
            subscription_expires_at: expires_at,
            settings: json!({}),
            perm_version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn path_parameter_wins_over_header() {
        let from_path = Uuid::new_v4();
        let from_header = Uuid::new_v4();

        let picked = explicit_restaurant(Some(&from_path.to_string()), Some(&from_header.to_string())).unwrap();
        assert_eq!(picked, Some(from_path));

        let picked = explicit_restaurant(None, Some(&format!(" {from_header} "))).unwrap();
        assert_eq!(picked, Some(from_header));

        assert_eq!(explicit_restaurant(None, None).unwrap(), None);
    }

    #[test]
    fn malformed_identifiers_are_bad_requests() {
        assert!(matches!(
            explicit_restaurant(Some("nao-e-uuid"), None),
            Err(AppError::BadRequest("restaurant.context_required"))
        ));
        // Um cabeçalho inválido não cai no restaurante principal
        assert!(matches!(
            explicit_restaurant(None, Some("")),
            Err(AppError::BadRequest("restaurant.context_required"))
        ));
    }

    #[test]
    fn members_of_an_active_paid_restaurant_get_in() {
        let now = Utc::now();
        let r = restaurant(RestaurantStatus::Active, Some(now + Duration::days(10)));
        assert!(check_access(&r, false, true, now).is_ok());

        let r = restaurant(RestaurantStatus::Active, None);
        assert!(check_access(&r, false, true, now).is_ok());
    }

    #[test]
    fn non_members_are_forbidden() {
        let r = restaurant(RestaurantStatus::Active, None);
        assert!(matches!(
            check_access(&r, false, false, Utc::now()),
            Err(AppError::Forbidden("restaurant.access_denied"))
        ));
    }

    #[test]
    fn inactive_restaurant_is_forbidden_before_subscription_check() {
        let now = Utc::now();
        for status in [RestaurantStatus::Inactive, RestaurantStatus::Suspended] {
            let r = restaurant(status, Some(now - Duration::days(1)));
            assert!(matches!(
                check_access(&r, false, true, now),
                Err(AppError::Forbidden("restaurant.inactive"))
            ));
        }
    }

    #[test]
    fn expired_subscription_requires_payment() {
        let now = Utc::now();
        let r = restaurant(RestaurantStatus::Active, Some(now - Duration::minutes(1)));
        assert!(matches!(
            check_access(&r, false, true, now),
            Err(AppError::PaymentRequired("restaurant.subscription_expired"))
        ));
    }

    #[test]
    fn superadmin_bypasses_membership_status_and_subscription() {
        let now = Utc::now();
        let r = restaurant(RestaurantStatus::Suspended, Some(now - Duration::days(30)));
        assert!(check_access(&r, true, false, now).is_ok());
    }
}

// src/models/restaurant.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "restaurant_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RestaurantStatus {
    Active,
    Inactive,
    Suspended,
}

// O Tenant da plataforma
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "Cantina da Nonna")]
    pub name: String,

    #[schema(example = "cantina-da-nonna")]
    pub slug: String,

    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    #[schema(example = "italiana")]
    pub cuisine_type: Option<String>,

    #[schema(value_type = Object)]
    pub address: Value,

    pub status: RestaurantStatus,

    #[schema(example = "basic")]
    pub subscription_plan: String,

    pub subscription_expires_at: Option<DateTime<Utc>>,

    // JSON livre; `checkinProgramSettings` é lido por CheckinProgramSettings
    #[schema(value_type = Object)]
    pub settings: Value,

    #[schema(ignore)]
    #[serde(skip_serializing)]
    pub perm_version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn subscription_expired(&self, now: DateTime<Utc>) -> bool {
        self.subscription_expires_at.is_some_and(|expires| expires < now)
    }

    /// Rotas públicas (QR code, slug) só atendem restaurantes ativos.
    pub fn is_public(&self) -> bool {
        self.status == RestaurantStatus::Active
    }
}

// Restaurante visto a partir do vínculo do usuário
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRestaurant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: RestaurantStatus,
    pub is_owner: bool,
}

// Dados públicos (página de check-in / QR code)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicRestaurant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub identification_method: String,
    pub require_coupon_for_checkin: bool,
}

// Membro da equipe
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_owner: bool,
    pub roles: Vec<String>,
    pub joined_at: DateTime<Utc>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantPayload {
    #[validate(length(min = 2, max = 150, message = "O nome deve ter entre 2 e 150 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cuisine_type: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub address: Option<Value>,
    #[validate(custom(function = "crate::models::checkin::validate_restaurant_settings"))]
    #[schema(value_type = Option<Object>)]
    pub settings: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPayload {
    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Provisionamento de um restaurante pela plataforma
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantPayload {
    #[validate(length(min = 2, max = 150, message = "O nome deve ter entre 2 e 150 caracteres."))]
    #[schema(example = "Cantina da Nonna")]
    pub name: String,

    #[validate(length(min = 2, max = 80, message = "O slug deve ter entre 2 e 80 caracteres."))]
    #[schema(example = "cantina-da-nonna")]
    pub slug: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cuisine_type: Option<String>,

    #[schema(example = "basic")]
    pub subscription_plan: Option<String>,
    pub subscription_expires_at: Option<DateTime<Utc>>,

    #[validate(nested)]
    pub owner: OwnerPayload,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateRestaurantPayload {
    #[validate(nested)]
    #[serde(flatten)]
    pub profile: UpdateRestaurantPayload,
    pub subscription_plan: Option<String>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    pub status: RestaurantStatus,
}

// Adiciona um membro: vincula o usuário existente ou cria um novo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddStaffPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "garcom@restaurante.com")]
    pub email: String,

    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    pub name: Option<String>,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,

    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffPayload {
    pub role_ids: Option<Vec<Uuid>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn restaurant(status: RestaurantStatus) -> Restaurant {
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
            subscription_expires_at: None,
            settings: json!({}),
            perm_version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_active_restaurants_are_public() {
        assert!(restaurant(RestaurantStatus::Active).is_public());
        assert!(!restaurant(RestaurantStatus::Inactive).is_public());
        assert!(!restaurant(RestaurantStatus::Suspended).is_public());

        let found = Some(restaurant(RestaurantStatus::Suspended));
        assert!(found.filter(Restaurant::is_public).is_none());
    }
}

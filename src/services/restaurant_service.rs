// src/services/restaurant_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{PageRequest, Paginated, Pagination, DEFAULT_PAGE_SIZE},
        error::AppError,
    },
    db::{restaurant_repo::RestaurantChanges, IamRepository, RestaurantRepository, UserRepository},
    models::{
        auth::User,
        checkin::CheckinProgramSettings,
        restaurant::{
            AddStaffPayload, AdminUpdateRestaurantPayload, CreateRestaurantPayload, ListQuery,
            PublicRestaurant, Restaurant, RestaurantStatus, StaffMember, UpdateRestaurantPayload,
            UpdateStaffPayload, UserRestaurant,
        },
    },
    services::{auth::hash_password, iam_service::IamService},
};

const DEFAULT_PLAN: &str = "basic";

#[derive(Clone)]
pub struct RestaurantService {
    repo: RestaurantRepository,
    user_repo: UserRepository,
    iam_repo: IamRepository,
    iam_service: IamService,
}

fn profile_changes(payload: &UpdateRestaurantPayload) -> RestaurantChanges<'_> {
    RestaurantChanges {
        name: payload.name.as_deref(),
        description: payload.description.as_deref(),
        email: payload.email.as_deref(),
        phone: payload.phone.as_deref(),
        cuisine_type: payload.cuisine_type.as_deref(),
        address: payload.address.as_ref(),
        settings: payload.settings.as_ref(),
        ..RestaurantChanges::default()
    }
}

/// Recorte público do restaurante, com as regras de check-in que o QR code precisa.
pub fn public_view(restaurant: &Restaurant) -> PublicRestaurant {
    let settings = CheckinProgramSettings::from_restaurant_settings(&restaurant.settings);
    PublicRestaurant {
        id: restaurant.id,
        name: restaurant.name.clone(),
        slug: restaurant.slug.clone(),
        description: restaurant.description.clone(),
        identification_method: settings.identification_method.as_str().to_string(),
        require_coupon_for_checkin: settings.require_coupon_for_checkin,
    }
}

impl RestaurantService {
    pub fn new(
        repo: RestaurantRepository,
        user_repo: UserRepository,
        iam_repo: IamRepository,
        iam_service: IamService,
    ) -> Self {
        Self {
            repo,
            user_repo,
            iam_repo,
            iam_service,
        }
    }

    // ---
    // Contexto (usado pelo middleware de tenancy)
    // ---

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserRestaurant>, AppError> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, AppError> {
        self.repo.find_by_id(id).await
    }

    pub async fn membership(&self, user_id: Uuid, restaurant_id: Uuid) -> Result<Option<bool>, AppError> {
        self.repo.membership(user_id, restaurant_id).await
    }

    /// Restaurante ativo pelo slug (rotas públicas).
    pub async fn find_active_by_slug(&self, slug: &str) -> Result<Restaurant, AppError> {
        let restaurant = self
            .repo
            .find_by_slug(slug)
            .await?
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        if restaurant.status != RestaurantStatus::Active {
            return Err(AppError::NotFound("restaurant.not_found"));
        }
        Ok(restaurant)
    }

    pub async fn public_info(&self, slug: &str) -> Result<PublicRestaurant, AppError> {
        let restaurant = self.find_active_by_slug(slug).await?;
        Ok(public_view(&restaurant))
    }

    // ---
    // Perfil e configurações
    // ---

    pub async fn get(&self, restaurant_id: Uuid) -> Result<Restaurant, AppError> {
        self.repo
            .find_by_id(restaurant_id)
            .await?
            .ok_or(AppError::NotFound("restaurant.not_found"))
    }

    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        payload: &UpdateRestaurantPayload,
    ) -> Result<Restaurant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update(executor, restaurant_id, &profile_changes(payload))
            .await?
            .ok_or(AppError::NotFound("restaurant.not_found"))
    }

    // ---
    // Equipe
    // ---

    pub async fn list_staff(&self, restaurant_id: Uuid) -> Result<Vec<StaffMember>, AppError> {
        self.repo.list_staff(restaurant_id).await
    }

    /// Vincula um usuário existente pelo e-mail ou cria a conta (nome e senha obrigatórios).
    pub async fn add_staff<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        actor_id: Uuid,
        payload: &AddStaffPayload,
    ) -> Result<StaffMember, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let existing = self.user_repo.find_by_email(&payload.email).await?;

        let user_id = {
            let mut tx = executor.begin().await?;

            let user_id = match existing {
                Some(user) => user.id,
                None => {
                    let (Some(name), Some(password)) = (payload.name.as_deref(), payload.password.as_deref()) else {
                        return Err(AppError::BadRequest("restaurant.staff_data_required"));
                    };
                    let hashed = hash_password(password).await?;
                    self.user_repo
                        .create_user(&mut *tx, name, &payload.email, &hashed, None)
                        .await?
                        .id
                }
            };

            self.repo.add_member(&mut *tx, user_id, restaurant_id, false).await?;
            tx.commit().await?;
            user_id
        };

        if !payload.role_ids.is_empty() {
            self.iam_service
                .assign_roles(self.user_repo.pool(), restaurant_id, actor_id, user_id, &payload.role_ids)
                .await?;
        }

        tracing::info!(%restaurant_id, %user_id, "Membro adicionado à equipe");

        self.repo
            .find_staff_member(restaurant_id, user_id)
            .await?
            .ok_or(AppError::NotFound("restaurant.staff_not_found"))
    }

    pub async fn update_staff(
        &self,
        restaurant_id: Uuid,
        actor_id: Uuid,
        user_id: Uuid,
        payload: &UpdateStaffPayload,
    ) -> Result<StaffMember, AppError> {
        let member = self
            .repo
            .find_staff_member(restaurant_id, user_id)
            .await?
            .ok_or(AppError::NotFound("restaurant.staff_not_found"))?;

        if let Some(role_ids) = &payload.role_ids {
            self.iam_service
                .assign_roles(self.user_repo.pool(), restaurant_id, actor_id, user_id, role_ids)
                .await?;
        }

        if let Some(is_active) = payload.is_active {
            if member.is_owner && !is_active {
                return Err(AppError::BadRequest("restaurant.owner_cannot_be_removed"));
            }
            self.user_repo.set_active(user_id, is_active).await?;
        }

        self.repo
            .find_staff_member(restaurant_id, user_id)
            .await?
            .ok_or(AppError::NotFound("restaurant.staff_not_found"))
    }

    /// Desvincula o membro; o dono nunca é removido.
    pub async fn remove_staff(&self, restaurant_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let member = self
            .repo
            .find_staff_member(restaurant_id, user_id)
            .await?
            .ok_or(AppError::NotFound("restaurant.staff_not_found"))?;

        if member.is_owner {
            return Err(AppError::BadRequest("restaurant.owner_cannot_be_removed"));
        }

        let mut tx = self.user_repo.pool().begin().await?;
        self.iam_repo.clear_user_roles(&mut *tx, restaurant_id, user_id).await?;
        self.repo.remove_member(&mut *tx, user_id, restaurant_id).await?;
        self.iam_service.bump_perm_version(&mut *tx, restaurant_id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Plataforma (superadmin)
    // ---

    /// Cria restaurante, dono e libera todos os módulos numa única transação.
    pub async fn provision<'e, E>(&self, executor: E, payload: &CreateRestaurantPayload) -> Result<Restaurant, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let hashed = hash_password(&payload.owner.password).await?;

        let mut tx = executor.begin().await?;

        let restaurant = self
            .repo
            .create(
                &mut *tx,
                &payload.name,
                &payload.slug,
                payload.email.as_deref(),
                payload.phone.as_deref(),
                payload.cuisine_type.as_deref(),
                payload.subscription_plan.as_deref().unwrap_or(DEFAULT_PLAN),
                payload.subscription_expires_at,
            )
            .await?;

        let owner = self
            .user_repo
            .create_user(&mut *tx, &payload.owner.name, &payload.owner.email, &hashed, None)
            .await?;

        self.repo.add_member(&mut *tx, owner.id, restaurant.id, true).await?;
        self.iam_repo.grant_all_modules(&mut *tx, restaurant.id).await?;

        tx.commit().await?;

        tracing::info!(restaurant_id = %restaurant.id, owner_id = %owner.id, "Restaurante provisionado");
        Ok(restaurant)
    }

    pub async fn list_all(&self, query: &ListQuery) -> Result<Paginated<Restaurant>, AppError> {
        let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
        let (items, total) = self
            .repo
            .list_all(query.search.as_deref(), page.limit, page.offset())
            .await?;
        Ok(Paginated {
            items,
            pagination: Pagination::from_total(page, total),
        })
    }

    pub async fn admin_update<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        payload: &AdminUpdateRestaurantPayload,
    ) -> Result<Restaurant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let changes = RestaurantChanges {
            subscription_plan: payload.subscription_plan.as_deref(),
            subscription_expires_at: payload.subscription_expires_at,
            ..profile_changes(&payload.profile)
        };

        self.repo
            .update(executor, restaurant_id, &changes)
            .await?
            .ok_or(AppError::NotFound("restaurant.not_found"))
    }

    pub async fn update_status(&self, restaurant_id: Uuid, status: RestaurantStatus) -> Result<Restaurant, AppError> {
        let restaurant = self
            .repo
            .update_status(restaurant_id, status)
            .await?
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        tracing::info!(%restaurant_id, ?status, "Status do restaurante alterado");
        Ok(restaurant)
    }

    pub async fn list_users(&self, query: &ListQuery) -> Result<Paginated<User>, AppError> {
        let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
        let (items, total) = self
            .user_repo
            .list_all(query.search.as_deref(), page.limit, page.offset())
            .await?;
        Ok(Paginated {
            items,
            pagination: Pagination::from_total(page, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn restaurant(settings: serde_json::Value) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            name: "Cantina da Nonna".into(),
            slug: "cantina-da-nonna".into(),
            description: Some("Massas artesanais".into()),
            email: None,
            phone: None,
            cuisine_type: None,
            address: json!({}),
            status: RestaurantStatus::Active,
            subscription_plan: "basic".into(),
            subscription_expires_at: None,
            settings,
            perm_version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn public_view_defaults_to_phone_identification() {
        let view = public_view(&restaurant(json!({})));
        assert_eq!(view.identification_method, "phone");
        assert!(!view.require_coupon_for_checkin);
        assert_eq!(view.slug, "cantina-da-nonna");
    }

    #[test]
    fn public_view_reads_checkin_settings() {
        let view = public_view(&restaurant(json!({
            "checkinProgramSettings": { "identificationMethod": "cpf", "requireCouponForCheckin": true }
        })));
        assert_eq!(view.identification_method, "cpf");
        assert!(view.require_coupon_for_checkin);
    }

    #[test]
    fn admin_changes_keep_profile_fields() {
        let payload = AdminUpdateRestaurantPayload {
            profile: UpdateRestaurantPayload {
                name: Some("Nova Cantina".into()),
                description: None,
                email: None,
                phone: None,
                cuisine_type: None,
                address: None,
                settings: None,
            },
            subscription_plan: Some("pro".into()),
            subscription_expires_at: None,
        };
        let changes = RestaurantChanges {
            subscription_plan: payload.subscription_plan.as_deref(),
            ..profile_changes(&payload.profile)
        };
        assert_eq!(changes.name, Some("Nova Cantina"));
        assert_eq!(changes.subscription_plan, Some("pro"));
    }

    #[test]
    fn profile_update_rejects_out_of_range_checkin_duration() {
        use validator::Validate;

        let payload: UpdateRestaurantPayload = serde_json::from_value(json!({
            "settings": { "checkinProgramSettings": { "checkinDurationMinutes": 1_000_000_000_000_i64 } }
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("settings"));

        let payload: UpdateRestaurantPayload = serde_json::from_value(json!({
            "settings": { "checkinProgramSettings": { "checkinDurationMinutes": 90 } }
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
    }
}

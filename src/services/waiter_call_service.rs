// src/services/waiter_call_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RestaurantRepository, WaiterCallRepository},
    models::{
        restaurant::Restaurant,
        waiter_call::{CreateWaiterCallPayload, WaiterCall, WaiterCallStatus},
    },
};

const DEFAULT_CALL_TYPE: &str = "waiter";

#[derive(Clone)]
pub struct WaiterCallService {
    repo: WaiterCallRepository,
    restaurant_repo: RestaurantRepository,
}

impl WaiterCallService {
    pub fn new(repo: WaiterCallRepository, restaurant_repo: RestaurantRepository) -> Self {
        Self { repo, restaurant_repo }
    }

    /// Chamado aberto pela mesa via QR code.
    pub async fn create_public(&self, slug: &str, payload: &CreateWaiterCallPayload) -> Result<WaiterCall, AppError> {
        let restaurant = self
            .restaurant_repo
            .find_by_slug(slug)
            .await?
            .filter(Restaurant::is_public)
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        let call_type = payload
            .call_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_CALL_TYPE);

        let call = self
            .repo
            .create(restaurant.id, payload.table_number.trim(), call_type)
            .await?;

        tracing::info!(restaurant_id = %restaurant.id, table = %call.table_number, call_type, "Garçom chamado");
        Ok(call)
    }

    pub async fn list(&self, restaurant_id: Uuid, status: Option<WaiterCallStatus>) -> Result<Vec<WaiterCall>, AppError> {
        self.repo.list(restaurant_id, status).await
    }

    pub async fn update_status(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        actor_id: Uuid,
        status: WaiterCallStatus,
    ) -> Result<WaiterCall, AppError> {
        let attended_by = (status == WaiterCallStatus::Attended).then_some(actor_id);
        self.repo
            .update_status(restaurant_id, id, status, attended_by)
            .await?
            .ok_or(AppError::NotFound("waiter_call.not_found"))
    }
}

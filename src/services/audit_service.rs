// src/services/audit_service.rs

use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{PageRequest, Paginated, Pagination},
        error::AppError,
    },
    db::AuditRepository,
    models::audit::AuditLog,
};

#[derive(Clone)]
pub struct AuditService {
    repo: AuditRepository,
}

impl AuditService {
    pub fn new(repo: AuditRepository) -> Self {
        Self { repo }
    }

    /// Grava a trilha de auditoria. Falhas só são logadas: nunca derrubam a requisição.
    pub async fn record(
        &self,
        actor_user_id: Option<Uuid>,
        restaurant_id: Option<Uuid>,
        action: &str,
        resource: &str,
        payload: Value,
    ) {
        if let Err(e) = self
            .repo
            .insert(self.repo.pool(), actor_user_id, restaurant_id, action, resource, &payload)
            .await
        {
            tracing::warn!(error = %e, action, resource, "Falha ao gravar log de auditoria");
        }
    }

    pub async fn list(&self, restaurant_id: Uuid, page: PageRequest) -> Result<Paginated<AuditLog>, AppError> {
        let (items, total) = self
            .repo
            .list_for_restaurant(restaurant_id, page.limit, page.offset())
            .await?;

        Ok(Paginated {
            items,
            pagination: Pagination::from_total(page, total),
        })
    }
}

// src/services/customer_service.rs

use chrono::{Datelike, NaiveDate};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{PageRequest, Paginated, Pagination, DEFAULT_PAGE_SIZE},
        error::AppError,
    },
    db::CustomerRepository,
    models::{
        customer::{
            has_birthday_on, CreateCustomerPayload, Customer, CustomerDetails, UpdateCustomerPayload, HISTORY_LIMIT,
        },
        restaurant::ListQuery,
    },
    services::audit_service::AuditService,
};

// Origem dos clientes cadastrados pelo painel
const MANUAL_SOURCE: &str = "manual";

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    audit: AuditService,
}

/// Aniversariantes do dia entre os nascidos no mês.
pub fn birthdays_on(customers: Vec<Customer>, today: NaiveDate) -> Vec<Customer> {
    customers
        .into_iter()
        .filter(|c| c.birth_date.is_some_and(|born| has_birthday_on(born, today)))
        .collect()
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    pub async fn list(&self, restaurant_id: Uuid, query: &ListQuery) -> Result<Paginated<Customer>, AppError> {
        let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let (items, total) = self
            .repo
            .list(restaurant_id, search, page.limit, page.offset())
            .await?;

        Ok(Paginated {
            items,
            pagination: Pagination::from_total(page, total),
        })
    }

    pub async fn get(&self, pool: &sqlx::PgPool, restaurant_id: Uuid, id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .find_by_id(pool, restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("customer.not_found"))
    }

    pub async fn create(
        &self,
        pool: &sqlx::PgPool,
        restaurant_id: Uuid,
        payload: &CreateCustomerPayload,
    ) -> Result<Customer, AppError> {
        let customer = self.repo.create(pool, restaurant_id, payload, MANUAL_SOURCE).await?;
        tracing::info!(%restaurant_id, customer_id = %customer.id, "Cliente cadastrado");
        Ok(customer)
    }

    pub async fn update(
        &self,
        pool: &sqlx::PgPool,
        restaurant_id: Uuid,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Customer, AppError> {
        self.repo
            .update(pool, restaurant_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("customer.not_found"))
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.repo.pool().begin().await?;

        let customer = self
            .repo
            .lock(&mut *tx, restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("customer.not_found"))?;
        self.repo.delete(&mut *tx, restaurant_id, id).await?;

        tx.commit().await?;

        tracing::info!(%restaurant_id, customer_id = %id, "Cliente removido");
        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "customer.delete",
                "customers",
                json!({ "customerId": id, "name": customer.name }),
            )
            .await;
        Ok(())
    }

    pub async fn details(&self, restaurant_id: Uuid, id: Uuid) -> Result<CustomerDetails, AppError> {
        let customer = self.get(self.repo.pool(), restaurant_id, id).await?;

        let (recent_checkins, redeemed_coupons, survey_responses, feedbacks) = tokio::try_join!(
            self.repo.recent_checkins(restaurant_id, id, HISTORY_LIMIT),
            self.repo.redeemed_coupons(restaurant_id, id, HISTORY_LIMIT),
            self.repo.survey_responses(restaurant_id, id, HISTORY_LIMIT),
            self.repo.feedbacks(restaurant_id, id, HISTORY_LIMIT),
        )?;

        Ok(CustomerDetails {
            customer,
            recent_checkins,
            redeemed_coupons,
            survey_responses,
            feedbacks,
        })
    }

    pub async fn birthdays(&self, restaurant_id: Uuid, today: NaiveDate) -> Result<Vec<Customer>, AppError> {
        let candidates = self.repo.born_in_month(restaurant_id, today.month() as i32).await?;
        Ok(birthdays_on(candidates, today))
    }

    /// Zera o contador de visitas; os marcos de recompensa recomeçam do zero.
    pub async fn reset_visits(&self, restaurant_id: Uuid, id: Uuid, actor_id: Uuid) -> Result<Customer, AppError> {
        let customer = self
            .repo
            .reset_visits(self.repo.pool(), restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("customer.not_found"))?;

        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "customer.reset_visits",
                "customers",
                json!({ "customerId": id }),
            )
            .await;
        Ok(customer)
    }

    /// Apaga o histórico de check-ins do cliente e devolve quantos saíram.
    pub async fn clear_checkins(&self, restaurant_id: Uuid, id: Uuid, actor_id: Uuid) -> Result<u64, AppError> {
        let mut tx = self.repo.pool().begin().await?;

        self.repo
            .lock(&mut *tx, restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("customer.not_found"))?;
        let removed = self.repo.clear_checkins(&mut *tx, restaurant_id, id).await?;

        tx.commit().await?;

        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "customer.clear_checkins",
                "checkins",
                json!({ "customerId": id, "removed": removed }),
            )
            .await;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(name: &str, birth_date: Option<NaiveDate>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            phone: None,
            whatsapp: None,
            cpf: None,
            birth_date,
            source: MANUAL_SOURCE.into(),
            total_visits: 0,
            loyalty_points: 0,
            survey_responses_count: 0,
            last_visit: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_todays_birthdays_are_kept() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let list = vec![
            customer("Ana", NaiveDate::from_ymd_opt(1991, 3, 10)),
            customer("Bruno", NaiveDate::from_ymd_opt(1985, 3, 11)),
            customer("Carla", None),
        ];

        let names: Vec<String> = birthdays_on(list, today).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Ana".to_string()]);
    }
}

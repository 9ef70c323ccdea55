// src/services/checkin_service.rs

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CheckinRepository, CouponRepository, CustomerRepository, RestaurantRepository, RewardRepository},
    models::{
        checkin::{
            ActiveCheckin, AnalyticsPeriod, Checkin, CheckinAnalytics, CheckinProgramSettings,
            IdentificationMethod, PublicCheckinPayload, PublicCheckinResponse, RecordCheckinPayload,
            RewardEarned, VisitReward,
        },
        customer::{CreateCustomerPayload, Customer, ANONYMOUS_CUSTOMER_NAME},
        restaurant::Restaurant,
        reward::RewardType,
    },
    services::{
        audit_service::AuditService,
        iam_service::IamService,
        reward_service::{CouponOptions, RewardService},
    },
};

// Origem dos clientes criados pelo QR code da mesa
const QRCODE_SOURCE: &str = "checkin_qrcode";
const CHECKIN_FEATURE: &str = "checkins";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Identificador exigido pelo método configurado (telefone ou CPF).
pub fn identifier<'a>(method: IdentificationMethod, payload: &'a PublicCheckinPayload) -> Result<&'a str, AppError> {
    match method {
        IdentificationMethod::Phone => {
            non_empty(payload.phone_number.as_deref()).ok_or(AppError::BadRequest("checkin.phone_required"))
        }
        IdentificationMethod::Cpf => non_empty(payload.cpf.as_deref()).ok_or(AppError::BadRequest("checkin.cpf_required")),
    }
}

/// Cliente novo do QR code; pelo telefone também preenche o WhatsApp.
pub fn qrcode_customer(method: IdentificationMethod, identifier: &str, name: Option<&str>) -> CreateCustomerPayload {
    let (phone, whatsapp, cpf) = match method {
        IdentificationMethod::Phone => (Some(identifier.to_string()), Some(identifier.to_string()), None),
        IdentificationMethod::Cpf => (None, None, Some(identifier.to_string())),
    };

    CreateCustomerPayload {
        name: non_empty(name).unwrap_or(ANONYMOUS_CUSTOMER_NAME).to_string(),
        email: None,
        phone,
        whatsapp,
        cpf,
        birth_date: None,
    }
}

#[derive(Clone)]
pub struct CheckinService {
    repo: CheckinRepository,
    customer_repo: CustomerRepository,
    restaurant_repo: RestaurantRepository,
    coupon_repo: CouponRepository,
    reward_repo: RewardRepository,
    reward_service: RewardService,
    iam_service: IamService,
    audit: AuditService,
}

impl CheckinService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: CheckinRepository,
        customer_repo: CustomerRepository,
        restaurant_repo: RestaurantRepository,
        coupon_repo: CouponRepository,
        reward_repo: RewardRepository,
        reward_service: RewardService,
        iam_service: IamService,
        audit: AuditService,
    ) -> Self {
        Self {
            repo,
            customer_repo,
            restaurant_repo,
            coupon_repo,
            reward_repo,
            reward_service,
            iam_service,
            audit,
        }
    }

    async fn settings_for(&self, restaurant_id: Uuid) -> Result<CheckinProgramSettings, AppError> {
        let restaurant = self
            .restaurant_repo
            .find_by_id(restaurant_id)
            .await?
            .ok_or(AppError::NotFound("restaurant.not_found"))?;
        Ok(CheckinProgramSettings::from_restaurant_settings(&restaurant.settings))
    }

    /// Check-in feito pela equipe para um cliente já cadastrado.
    pub async fn record(&self, restaurant_id: Uuid, actor_id: Uuid, payload: &RecordCheckinPayload) -> Result<Checkin, AppError> {
        let settings = self.settings_for(restaurant_id).await?;

        let mut tx = self.repo.pool().begin().await?;

        let customer = self
            .customer_repo
            .lock(&mut *tx, restaurant_id, payload.customer_id)
            .await?
            .ok_or(AppError::NotFound("customer.not_found"))?;

        self.repo.expire_overdue(&mut *tx, restaurant_id).await?;
        if self
            .repo
            .find_active_for_customer(&mut *tx, restaurant_id, customer.id)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("checkin.already_active"));
        }

        let now = Utc::now();
        let checkin = self
            .repo
            .create(
                &mut *tx,
                restaurant_id,
                customer.id,
                payload.table_number.as_deref(),
                None,
                now,
                settings.expires_at(now),
            )
            .await?;

        self.customer_repo.register_visit(&mut *tx, customer.id).await?;
        tx.commit().await?;

        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "checkin.create",
                "checkins",
                json!({ "checkinId": checkin.id, "customerId": customer.id }),
            )
            .await;

        Ok(checkin)
    }

    pub async fn checkout(&self, restaurant_id: Uuid, checkin_id: Uuid) -> Result<Checkin, AppError> {
        self.repo
            .checkout(restaurant_id, checkin_id)
            .await?
            .ok_or(AppError::NotFound("checkin.not_found"))
    }

    pub async fn list_active(&self, restaurant_id: Uuid) -> Result<Vec<ActiveCheckin>, AppError> {
        self.repo.expire_overdue(self.repo.pool(), restaurant_id).await?;

        let rows = self.repo.list_active(restaurant_id).await?;
        Ok(rows
            .into_iter()
            .map(|(checkin, customer)| ActiveCheckin { checkin, customer })
            .collect())
    }

    pub async fn analytics(&self, restaurant_id: Uuid, period: Option<&str>) -> Result<CheckinAnalytics, AppError> {
        let period = AnalyticsPeriod::parse(period).ok_or(AppError::BadRequest("checkin.invalid_period"))?;
        let since = period.start_date(Utc::now());

        Ok(CheckinAnalytics {
            total_checkins: self.repo.count_completed(restaurant_id, since).await?,
            most_frequent_customers: self.repo.most_frequent_customers(restaurant_id, since).await?,
            average_visit_duration_seconds: self.repo.average_duration_seconds(restaurant_id, since).await?,
            checkins_by_day: self.repo.completed_per_day_last_30(restaurant_id).await?,
        })
    }

    // ---
    // Check-in público (QR code da mesa)
    // ---

    pub async fn public_checkin(&self, slug: &str, payload: &PublicCheckinPayload) -> Result<PublicCheckinResponse, AppError> {
        let restaurant = self
            .restaurant_repo
            .find_by_slug(slug)
            .await?
            .filter(Restaurant::is_public)
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        if !self.iam_service.is_feature_enabled(restaurant.id, CHECKIN_FEATURE).await? {
            return Err(AppError::PaymentRequired("permission.feature_locked"));
        }

        let settings = CheckinProgramSettings::from_restaurant_settings(&restaurant.settings);
        let identifier = identifier(settings.identification_method, payload)?;

        let mut tx = self.repo.pool().begin().await?;

        let existing = match settings.identification_method {
            IdentificationMethod::Phone => self.customer_repo.find_by_phone(&mut *tx, restaurant.id, identifier).await?,
            IdentificationMethod::Cpf => self.customer_repo.find_by_cpf(&mut *tx, restaurant.id, identifier).await?,
        };

        let customer: Customer = match existing {
            Some(customer) => {
                // O nome real substitui o anônimo quando chega
                if let Some(name) = non_empty(payload.customer_name.as_deref()) {
                    if customer.name == ANONYMOUS_CUSTOMER_NAME {
                        self.customer_repo.rename(&mut *tx, customer.id, name).await?;
                    }
                }
                customer
            }
            None => {
                let new_customer =
                    qrcode_customer(settings.identification_method, identifier, payload.customer_name.as_deref());
                self.customer_repo
                    .create(&mut *tx, restaurant.id, &new_customer, QRCODE_SOURCE)
                    .await?
            }
        };

        // Duas leituras do mesmo QR em paralelo esperam aqui uma pela outra
        self.customer_repo.lock(&mut *tx, restaurant.id, customer.id).await?;

        self.repo.expire_overdue(&mut *tx, restaurant.id).await?;
        if self
            .repo
            .find_active_for_customer(&mut *tx, restaurant.id, customer.id)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("checkin.already_active"));
        }

        let now = Utc::now();

        let coupon_id = match payload.coupon_id {
            Some(coupon_id) => {
                let coupon = self
                    .coupon_repo
                    .find_by_id(&mut *tx, restaurant.id, coupon_id)
                    .await?
                    .ok_or(AppError::NotFound("coupon.not_found"))?;
                if !coupon.is_redeemable_at(now) {
                    return Err(AppError::BadRequest("coupon.not_redeemable"));
                }
                Some(coupon.id)
            }
            None if settings.require_coupon_for_checkin => {
                return Err(AppError::BadRequest("checkin.coupon_required"));
            }
            None => None,
        };

        // Antifraude: só registra o aviso, o check-in segue
        if let Some(min_interval) = settings.checkin_time_restriction.min_interval() {
            if let Some(last) = self
                .repo
                .last_checkin_time(&mut *tx, restaurant.id, customer.id, Uuid::nil())
                .await?
            {
                if now - last < min_interval {
                    tracing::warn!(
                        restaurant_id = %restaurant.id,
                        customer_id = %customer.id,
                        last_checkin = %last,
                        restriction = ?settings.checkin_time_restriction,
                        "Check-in antes do intervalo mínimo configurado"
                    );
                }
            }
        }

        let checkin = self
            .repo
            .create(
                &mut *tx,
                restaurant.id,
                customer.id,
                non_empty(payload.table_number.as_deref()),
                coupon_id,
                now,
                settings.expires_at(now),
            )
            .await?;

        let total_visits = self.customer_repo.register_visit(&mut *tx, customer.id).await?;
        if settings.points_per_checkin > 0 {
            self.customer_repo
                .add_loyalty_points(&mut *tx, customer.id, settings.points_per_checkin)
                .await?;
        }

        tx.commit().await?;

        let mut reward_earned = None;
        for milestone in settings.milestones_for(total_visits) {
            match self.milestone_reward(restaurant.id, customer.id, milestone).await {
                Ok(Some(earned)) => {
                    reward_earned = Some(earned);
                    break;
                }
                Ok(None) => {}
                Err(e) => tracing::error!(
                    error = %e,
                    restaurant_id = %restaurant.id,
                    customer_id = %customer.id,
                    reward_id = %milestone.reward_id,
                    "Falha ao conceder recompensa do marco de visitas"
                ),
            }
        }

        self.audit
            .record(
                None,
                Some(restaurant.id),
                "checkin.public",
                "checkins",
                json!({
                    "checkinId": checkin.id,
                    "customerId": customer.id,
                    "totalVisits": total_visits,
                    "rewardId": reward_earned.as_ref().map(|r| r.reward_id),
                }),
            )
            .await;

        Ok(PublicCheckinResponse {
            checkin,
            customer_total_visits: total_visits,
            reward_earned,
        })
    }

    /// Recompensa do marco: cupom gerado, ou a roleta para o cliente girar.
    async fn milestone_reward(
        &self,
        restaurant_id: Uuid,
        customer_id: Uuid,
        milestone: &VisitReward,
    ) -> Result<Option<RewardEarned>, AppError> {
        let pool = self.repo.pool();

        let Some(reward) = self.reward_repo.find_by_id(pool, restaurant_id, milestone.reward_id).await? else {
            tracing::warn!(%restaurant_id, reward_id = %milestone.reward_id, "Recompensa do marco não encontrada");
            return Ok(None);
        };

        if self
            .coupon_repo
            .exists_for_milestone(pool, reward.id, customer_id, milestone.visit_count)
            .await?
        {
            return Ok(None);
        }

        if reward.reward_type == RewardType::SpinTheWheel {
            return Ok(Some(RewardEarned {
                reward_id: reward.id,
                reward_title: reward.title,
                reward_type: reward.reward_type.as_str().to_string(),
                visit_count: milestone.visit_count,
                description: reward.description,
                coupon_code: None,
                value: reward.value,
                wheel_config: reward.wheel_config,
            }));
        }

        let coupon = self
            .reward_service
            .generate_coupon(
                pool,
                restaurant_id,
                reward.id,
                customer_id,
                CouponOptions {
                    visit_milestone: Some(milestone.visit_count),
                    ..CouponOptions::default()
                },
            )
            .await?;

        Ok(Some(RewardEarned {
            reward_id: reward.id,
            reward_title: reward.title,
            reward_type: reward.reward_type.as_str().to_string(),
            visit_count: milestone.visit_count,
            description: coupon.description,
            coupon_code: Some(coupon.code),
            value: coupon.value,
            wheel_config: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(phone: Option<&str>, cpf: Option<&str>, name: Option<&str>) -> PublicCheckinPayload {
        PublicCheckinPayload {
            phone_number: phone.map(Into::into),
            cpf: cpf.map(Into::into),
            customer_name: name.map(Into::into),
            table_number: None,
            coupon_id: None,
        }
    }

    #[test]
    fn identifier_follows_configured_method() {
        let p = payload(Some(" 11999990000 "), Some("123.456.789-00"), None);
        assert_eq!(identifier(IdentificationMethod::Phone, &p).unwrap(), "11999990000");
        assert_eq!(identifier(IdentificationMethod::Cpf, &p).unwrap(), "123.456.789-00");
    }

    #[test]
    fn missing_identifier_is_bad_request() {
        let p = payload(None, Some("123.456.789-00"), None);
        assert!(matches!(
            identifier(IdentificationMethod::Phone, &p),
            Err(AppError::BadRequest("checkin.phone_required"))
        ));

        let p = payload(Some("11999990000"), Some("   "), None);
        assert!(matches!(
            identifier(IdentificationMethod::Cpf, &p),
            Err(AppError::BadRequest("checkin.cpf_required"))
        ));
    }

    #[test]
    fn qrcode_customer_by_phone_fills_whatsapp() {
        let c = qrcode_customer(IdentificationMethod::Phone, "11999990000", None);
        assert_eq!(c.name, ANONYMOUS_CUSTOMER_NAME);
        assert_eq!(c.phone.as_deref(), Some("11999990000"));
        assert_eq!(c.whatsapp.as_deref(), Some("11999990000"));
        assert!(c.cpf.is_none());
    }

    #[test]
    fn qrcode_customer_by_cpf_keeps_given_name() {
        let c = qrcode_customer(IdentificationMethod::Cpf, "123.456.789-00", Some("Maria"));
        assert_eq!(c.name, "Maria");
        assert_eq!(c.cpf.as_deref(), Some("123.456.789-00"));
        assert!(c.phone.is_none());
    }
}

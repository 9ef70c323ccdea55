// src/services/reward_service.rs

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::WeightedIndex, prelude::Distribution, Rng};
use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{coupon_repo::NewCoupon, CouponRepository, CustomerRepository, RestaurantRepository, RewardRepository},
    models::{
        checkin::CheckinProgramSettings,
        coupon::Coupon,
        restaurant::Restaurant,
        reward::{
            analytics_after_generation, CreateRewardPayload, MAX_VALIDITY_DAYS, Reward, RewardAnalytics, RewardType,
            SpinResult, UpdateRewardPayload, WheelConfig, WheelItem,
        },
    },
};

// Tentativas de gerar um código ainda não usado
const CODE_ATTEMPTS: usize = 5;
const CODE_PREFIX_LEN: usize = 5;
const FALLBACK_PREFIX: &str = "CUPOM";

/// Código do cupom: 5 primeiros alfanuméricos do nome em maiúsculas + 4 dígitos.
pub fn coupon_code<R: Rng + ?Sized>(customer_name: &str, rng: &mut R) -> String {
    let prefix: String = customer_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(CODE_PREFIX_LEN)
        .collect::<String>()
        .to_uppercase();

    let prefix = if prefix.is_empty() { FALLBACK_PREFIX.to_string() } else { prefix };
    format!("{}{}", prefix, rng.gen_range(1000..=9999))
}

/// Sorteio ponderado pela `probability` de cada item (padrão 1).
pub fn pick_wheel_item<R: Rng + ?Sized>(items: &[WheelItem], rng: &mut R) -> Option<usize> {
    let dist = WeightedIndex::new(items.iter().map(WheelItem::weight)).ok()?;
    Some(dist.sample(rng))
}

/// `daysValid` sem `validUntil` define o fim da validade a partir do início.
pub fn derive_valid_until(
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    days_valid: Option<i32>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    match (valid_until, days_valid) {
        (Some(until), _) => Ok(Some(until)),
        (None, Some(days)) if days > 0 => {
            if days > MAX_VALIDITY_DAYS {
                return Err(AppError::BadRequest("reward.validity_out_of_range"));
            }
            valid_from
                .unwrap_or(now)
                .checked_add_signed(Duration::days(i64::from(days)))
                .map(Some)
                .ok_or(AppError::BadRequest("reward.validity_out_of_range"))
        }
        _ => Ok(None),
    }
}

/// Regras de elegibilidade do cliente para gerar um cupom da recompensa.
pub fn check_eligibility(
    reward: &Reward,
    customer_id: Uuid,
    customer_coupons: i64,
    from_milestone: bool,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if !reward.is_valid_at(now) {
        return Err(AppError::BadRequest("reward.invalid"));
    }

    if reward.customer_id.is_some_and(|owner| owner != customer_id) {
        return Err(AppError::BadRequest("reward.not_eligible"));
    }

    // Marcos de visita ignoram o limite por cliente
    if !from_milestone {
        if let Some(max) = reward.max_uses_per_customer {
            if customer_coupons >= i64::from(max) {
                return Err(AppError::BadRequest("reward.customer_limit_reached"));
            }
        }
    }
    Ok(())
}

/// Marco de roleta que o cliente já atingiu e ainda não girou (o mais antigo primeiro).
pub fn pending_wheel_milestone(
    settings: &CheckinProgramSettings,
    reward_id: Uuid,
    total_visits: i32,
    claimed: &[i32],
) -> Option<i32> {
    settings
        .rewards_per_visit
        .iter()
        .filter(|m| m.reward_id == reward_id && m.visit_count <= total_visits)
        .map(|m| m.visit_count)
        .filter(|visit_count| !claimed.contains(visit_count))
        .min()
}

fn new_codes(customer_name: &str) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..CODE_ATTEMPTS).map(|_| coupon_code(customer_name, &mut rng)).collect()
}

/// Primeiro candidato que não está em uso nem repetido entre os próprios candidatos.
pub fn first_free_code(candidates: Vec<String>, taken: &[String]) -> Option<String> {
    candidates.into_iter().find(|c| !taken.contains(c))
}

// Opções de geração (manual, marco de visita ou roleta)
#[derive(Debug, Default)]
pub struct CouponOptions {
    pub validity_days: Option<i32>,
    pub visit_milestone: Option<i32>,
    pub wheel_item: Option<WheelItem>,
}

#[derive(Clone)]
pub struct RewardService {
    repo: RewardRepository,
    coupon_repo: CouponRepository,
    customer_repo: CustomerRepository,
    restaurant_repo: RestaurantRepository,
}

impl RewardService {
    pub fn new(
        repo: RewardRepository,
        coupon_repo: CouponRepository,
        customer_repo: CustomerRepository,
        restaurant_repo: RestaurantRepository,
    ) -> Self {
        Self {
            repo,
            coupon_repo,
            customer_repo,
            restaurant_repo,
        }
    }

    fn pool(&self) -> &PgPool {
        self.repo.pool()
    }

    // ---
    // CRUD
    // ---

    pub async fn list(&self, restaurant_id: Uuid, active_only: bool) -> Result<Vec<Reward>, AppError> {
        self.repo.list(restaurant_id, active_only).await
    }

    pub async fn get(&self, restaurant_id: Uuid, id: Uuid) -> Result<Reward, AppError> {
        self.repo
            .find_by_id(self.pool(), restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("reward.not_found"))
    }

    pub async fn create(&self, restaurant_id: Uuid, actor_id: Uuid, payload: &CreateRewardPayload) -> Result<Reward, AppError> {
        if payload.reward_type == RewardType::SpinTheWheel
            && WheelConfig::from_value(payload.wheel_config.as_ref()).items.is_empty()
        {
            return Err(AppError::BadRequest("reward.wheel_empty"));
        }

        if let Some(customer_id) = payload.customer_id {
            self.customer_repo
                .find_by_id(self.pool(), restaurant_id, customer_id)
                .await?
                .ok_or(AppError::NotFound("customer.not_found"))?;
        }

        let valid_until = derive_valid_until(payload.valid_from, payload.valid_until, payload.days_valid, Utc::now())?;
        let reward = self.repo.create(restaurant_id, actor_id, payload, valid_until).await?;

        tracing::info!(%restaurant_id, reward_id = %reward.id, reward_type = reward.reward_type.as_str(), "Recompensa criada");
        Ok(reward)
    }

    pub async fn update(&self, restaurant_id: Uuid, id: Uuid, payload: &UpdateRewardPayload) -> Result<Reward, AppError> {
        let current = self.get(restaurant_id, id).await?;

        let valid_until = match (payload.valid_until, payload.days_valid) {
            (None, Some(_)) => derive_valid_until(
                payload.valid_from.or(current.valid_from),
                None,
                payload.days_valid,
                Utc::now(),
            )?,
            (until, _) => until,
        };

        self.repo
            .update(restaurant_id, id, payload, valid_until)
            .await?
            .ok_or(AppError::NotFound("reward.not_found"))
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete(restaurant_id, id).await? == 0 {
            return Err(AppError::NotFound("reward.not_found"));
        }
        Ok(())
    }

    // ---
    // Cupons
    // ---

    /// Gera o cupom numa transação: trava a recompensa, valida, grava e contabiliza o uso.
    pub async fn generate_coupon<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        reward_id: Uuid,
        customer_id: Uuid,
        options: CouponOptions,
    ) -> Result<Coupon, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let reward = self
            .repo
            .lock(&mut *tx, restaurant_id, reward_id)
            .await?
            .ok_or(AppError::NotFound("reward.not_found"))?;

        let customer = self
            .customer_repo
            .find_by_id(&mut *tx, restaurant_id, customer_id)
            .await?
            .ok_or(AppError::NotFound("customer.not_found"))?;

        let customer_coupons = self
            .coupon_repo
            .count_for_customer(&mut *tx, reward.id, customer.id)
            .await?;

        let now = Utc::now();
        check_eligibility(&reward, customer.id, customer_coupons, options.visit_milestone.is_some(), now)?;

        // Com a recompensa travada, o mesmo marco não vira dois cupons
        if let Some(milestone) = options.visit_milestone {
            if self
                .coupon_repo
                .exists_for_milestone(&mut *tx, reward.id, customer.id, milestone)
                .await?
            {
                return Err(AppError::BadRequest("reward.milestone_already_claimed"));
            }
        }

        let candidates = new_codes(&customer.name);
        let taken = self.coupon_repo.taken_codes(&mut *tx, &candidates).await?;
        let code = first_free_code(candidates, &taken).ok_or(AppError::Conflict("coupon.code_conflict"))?;

        // Na roleta, o cupom leva os dados do item sorteado
        let (title, description, value, reward_type) = match &options.wheel_item {
            Some(item) => (
                item.title.clone(),
                item.description.clone().or_else(|| Some(item.title.clone())),
                Some(item.value.unwrap_or_default()),
                item.reward_type.unwrap_or(RewardType::FreeItem),
            ),
            None => (reward.title.clone(), reward.description.clone(), reward.value, reward.reward_type),
        };

        let coupon = self
            .coupon_repo
            .insert(
                &mut *tx,
                &NewCoupon {
                    restaurant_id,
                    reward_id: reward.id,
                    customer_id: customer.id,
                    code: &code,
                    title: &title,
                    description: description.as_deref(),
                    reward_type,
                    value,
                    visit_milestone: options.visit_milestone,
                    expires_at: reward.coupon_expiry(now, options.validity_days),
                },
            )
            .await?;

        self.repo
            .increment_uses(&mut *tx, reward.id, &analytics_after_generation(&reward.analytics))
            .await?;

        tx.commit().await?;

        tracing::info!(%restaurant_id, reward_id = %reward.id, coupon_id = %coupon.id, "Cupom gerado");
        Ok(coupon)
    }

    /// Gira a roleta e gera o cupom do item sorteado.
    pub async fn spin(&self, restaurant_id: Uuid, reward_id: Uuid, customer_id: Uuid) -> Result<SpinResult, AppError> {
        self.spin_for(restaurant_id, reward_id, customer_id, None).await
    }

    async fn spin_for(
        &self,
        restaurant_id: Uuid,
        reward_id: Uuid,
        customer_id: Uuid,
        visit_milestone: Option<i32>,
    ) -> Result<SpinResult, AppError> {
        let reward = self.get(restaurant_id, reward_id).await?;

        if reward.reward_type != RewardType::SpinTheWheel {
            return Err(AppError::BadRequest("reward.not_wheel"));
        }

        let config = WheelConfig::from_value(reward.wheel_config.as_ref());
        let winning_index = pick_wheel_item(&config.items, &mut rand::thread_rng())
            .ok_or(AppError::BadRequest("reward.wheel_empty"))?;
        let won_item = config.items[winning_index].clone();

        let coupon = self
            .generate_coupon(
                self.pool(),
                restaurant_id,
                reward.id,
                customer_id,
                CouponOptions {
                    visit_milestone,
                    wheel_item: Some(won_item.clone()),
                    ..CouponOptions::default()
                },
            )
            .await?;

        Ok(SpinResult {
            message: format!("Parabéns! Você ganhou: {}", won_item.title),
            won_item,
            winning_index,
            coupon,
        })
    }

    /// Giro pelo QR code: só vale para um marco de visitas atingido e ainda não girado.
    pub async fn spin_public(&self, slug: &str, reward_id: Uuid, customer_id: Uuid) -> Result<SpinResult, AppError> {
        let restaurant = self
            .restaurant_repo
            .find_by_slug(slug)
            .await?
            .filter(Restaurant::is_public)
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        let customer = self
            .customer_repo
            .find_by_id(self.pool(), restaurant.id, customer_id)
            .await?
            .ok_or(AppError::NotFound("customer.not_found"))?;

        let settings = CheckinProgramSettings::from_restaurant_settings(&restaurant.settings);
        let claimed = self
            .coupon_repo
            .claimed_milestones(self.pool(), reward_id, customer.id)
            .await?;

        let milestone = pending_wheel_milestone(&settings, reward_id, customer.total_visits, &claimed).ok_or_else(|| {
            tracing::warn!(restaurant_id = %restaurant.id, %reward_id, customer_id = %customer.id, "Giro público sem marco pendente");
            AppError::Forbidden("reward.spin_not_earned")
        })?;

        self.spin_for(restaurant.id, reward_id, customer.id, Some(milestone)).await
    }

    pub async fn analytics(&self, restaurant_id: Uuid) -> Result<RewardAnalytics, AppError> {
        let (total_rewards, active_rewards) = self.repo.counts(restaurant_id).await?;
        let rewards_by_type = self.repo.count_by_type(restaurant_id).await?;
        let (generated, redeemed) = self.coupon_repo.generated_and_redeemed(restaurant_id).await?;

        let redemption_rate = if generated > 0 {
            redeemed as f64 / generated as f64 * 100.0
        } else {
            0.0
        };

        Ok(RewardAnalytics {
            total_rewards,
            active_rewards,
            rewards_by_type,
            total_coupons_generated: generated,
            total_coupons_redeemed: redeemed,
            redemption_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    #[test]
    fn every_candidate_code_is_checked_before_giving_up() {
        let candidates: Vec<String> = ["MARIA1001", "MARIA1002", "MARIA1003"].map(String::from).into();

        let taken: Vec<String> = ["MARIA1001", "MARIA1002"].map(String::from).into();
        assert_eq!(first_free_code(candidates.clone(), &taken).as_deref(), Some("MARIA1003"));

        let all_taken = candidates.clone();
        assert_eq!(first_free_code(candidates.clone(), &all_taken), None);

        assert_eq!(first_free_code(candidates, &[]).as_deref(), Some("MARIA1001"));
    }

    #[test]
    fn a_full_batch_of_candidates_is_drawn() {
        let codes = new_codes("Maria");
        assert_eq!(codes.len(), CODE_ATTEMPTS);
        assert!(codes.iter().all(|c| c.starts_with("MARIA") && c.len() == 9));
    }

    fn reward() -> Reward {
        Reward {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            customer_id: None,
            created_by: None,
            title: "Café".into(),
            description: None,
            reward_type: RewardType::FreeItem,
            value: None,
            is_active: true,
            valid_from: None,
            valid_until: None,
            days_valid: None,
            coupon_validity_days: None,
            total_uses_limit: None,
            current_uses: 0,
            max_uses_per_customer: Some(1),
            trigger_conditions: json!({}),
            wheel_config: None,
            analytics: json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(title: &str, probability: Option<f64>) -> WheelItem {
        WheelItem {
            id: None,
            title: title.into(),
            description: None,
            value: None,
            reward_type: None,
            probability,
            color: None,
        }
    }

    #[test]
    fn code_uses_first_alphanumerics_of_name() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = coupon_code("José d'Ávila", &mut rng);
        assert!(code.starts_with("JOSDV"), "{code}");
        assert_eq!(code.len(), 9);
        let digits: u32 = code[5..].parse().unwrap();
        assert!((1000..=9999).contains(&digits));
    }

    #[test]
    fn code_falls_back_when_name_has_no_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(coupon_code("***", &mut rng).starts_with("CUPOM"));
        assert!(coupon_code("Ana", &mut rng).starts_with("ANA"));
    }

    #[test]
    fn wheel_respects_weights() {
        let items = vec![item("Nada", Some(0.000001)), item("Sobremesa", Some(1000.0))];
        let mut rng = StdRng::seed_from_u64(42);
        let hits = (0..200)
            .filter(|_| pick_wheel_item(&items, &mut rng) == Some(1))
            .count();
        assert!(hits >= 195, "{hits}");
    }

    #[test]
    fn empty_wheel_has_no_winner() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(pick_wheel_item(&[], &mut rng), None);
    }

    #[test]
    fn days_valid_derives_end_of_validity() {
        let now = Utc::now();
        let from = now + Duration::days(2);
        assert_eq!(derive_valid_until(Some(from), None, Some(10), now).unwrap(), Some(from + Duration::days(10)));
        assert_eq!(derive_valid_until(None, None, Some(5), now).unwrap(), Some(now + Duration::days(5)));
        assert_eq!(derive_valid_until(None, Some(from), Some(5), now).unwrap(), Some(from));
        assert_eq!(derive_valid_until(None, None, None, now).unwrap(), None);
    }

    #[test]
    fn days_valid_out_of_range_is_bad_request() {
        let now = Utc::now();
        assert!(matches!(
            derive_valid_until(None, None, Some(i32::MAX), now),
            Err(AppError::BadRequest("reward.validity_out_of_range"))
        ));

        // Início no limite do calendário não pode estourar a soma
        assert!(matches!(
            derive_valid_until(Some(DateTime::<Utc>::MAX_UTC), None, Some(30), now),
            Err(AppError::BadRequest("reward.validity_out_of_range"))
        ));
    }

    fn settings_with(milestones: &[(i32, Uuid)]) -> CheckinProgramSettings {
        let rewards: Vec<_> = milestones
            .iter()
            .map(|(visit_count, reward_id)| json!({ "visitCount": visit_count, "rewardId": reward_id }))
            .collect();
        CheckinProgramSettings::from_restaurant_settings(&json!({
            "checkinProgramSettings": { "rewardsPerVisit": rewards }
        }))
    }

    #[test]
    fn public_spin_requires_a_reached_and_unclaimed_milestone() {
        let wheel = Uuid::new_v4();
        let other = Uuid::new_v4();
        let settings = settings_with(&[(5, wheel), (10, wheel), (3, other)]);

        // Ainda não chegou ao marco
        assert_eq!(pending_wheel_milestone(&settings, wheel, 4, &[]), None);
        assert_eq!(pending_wheel_milestone(&settings, wheel, 5, &[]), Some(5));

        // Marco já girado não se repete
        assert_eq!(pending_wheel_milestone(&settings, wheel, 7, &[5]), None);
        assert_eq!(pending_wheel_milestone(&settings, wheel, 12, &[5]), Some(10));
        assert_eq!(pending_wheel_milestone(&settings, wheel, 12, &[5, 10]), None);

        // Marcos de outra recompensa não liberam esta roleta
        assert_eq!(pending_wheel_milestone(&settings, Uuid::new_v4(), 50, &[]), None);
    }

    #[test]
    fn eligibility_rules() {
        let now = Utc::now();
        let customer = Uuid::new_v4();
        let r = reward();

        assert!(check_eligibility(&r, customer, 0, false, now).is_ok());
        assert!(matches!(
            check_eligibility(&r, customer, 1, false, now),
            Err(AppError::BadRequest("reward.customer_limit_reached"))
        ));
        // Marco de visita ignora o limite por cliente
        assert!(check_eligibility(&r, customer, 1, true, now).is_ok());

        let mut exclusive = reward();
        exclusive.customer_id = Some(Uuid::new_v4());
        assert!(matches!(
            check_eligibility(&exclusive, customer, 0, false, now),
            Err(AppError::BadRequest("reward.not_eligible"))
        ));

        let mut inactive = reward();
        inactive.is_active = false;
        assert!(matches!(
            check_eligibility(&inactive, customer, 0, false, now),
            Err(AppError::BadRequest("reward.invalid"))
        ));
    }
}

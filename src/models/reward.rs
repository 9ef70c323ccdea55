// src/models/reward.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Teto de dias de validade aceito para recompensas e cupons (10 anos).
pub const MAX_VALIDITY_DAYS: i32 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reward_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    DiscountPercentage,
    DiscountFixed,
    FreeItem,
    Cashback,
    Points,
    SpinTheWheel,
}

impl RewardType {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardType::DiscountPercentage => "discount_percentage",
            RewardType::DiscountFixed => "discount_fixed",
            RewardType::FreeItem => "free_item",
            RewardType::Cashback => "cashback",
            RewardType::Points => "points",
            RewardType::SpinTheWheel => "spin_the_wheel",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    // Recompensa exclusiva de um cliente
    pub customer_id: Option<Uuid>,
    pub created_by: Option<Uuid>,

    #[schema(example = "10% de desconto")]
    pub title: String,

    pub description: Option<String>,
    pub reward_type: RewardType,

    #[schema(value_type = Option<f64>, example = 10.0)]
    pub value: Option<Decimal>,

    pub is_active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub days_valid: Option<i32>,
    pub coupon_validity_days: Option<i32>,
    pub total_uses_limit: Option<i32>,
    pub current_uses: i32,
    pub max_uses_per_customer: Option<i32>,

    #[schema(value_type = Object)]
    pub trigger_conditions: Value,

    #[schema(value_type = Option<Object>)]
    pub wheel_config: Option<Value>,

    #[schema(value_type = Object)]
    pub analytics: Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    /// Ativa, dentro do período de validade e com usos disponíveis.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if self.valid_from.is_some_and(|from| now < from) {
            return false;
        }
        if self.valid_until.is_some_and(|until| now > until) {
            return false;
        }
        if self.total_uses_limit.is_some_and(|limit| self.current_uses >= limit) {
            return false;
        }
        true
    }

    /// Prazo do cupom: dias extras > dias do cupom > dias da recompensa; senão o fim da validade.
    pub fn coupon_expiry(&self, now: DateTime<Utc>, extra_validity_days: Option<i32>) -> Option<DateTime<Utc>> {
        let days = extra_validity_days
            .or(self.coupon_validity_days)
            .or(self.days_valid)
            .filter(|d| *d > 0)
            .map(|d| d.min(MAX_VALIDITY_DAYS));

        match days {
            Some(d) => now.checked_add_signed(Duration::days(i64::from(d))).or(self.valid_until),
            None => self.valid_until,
        }
    }
}

// --- Contadores em `rewards.analytics` ---

fn counter(analytics: &Value, key: &str) -> i64 {
    analytics.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Mais um cupom gerado a partir da recompensa.
pub fn analytics_after_generation(analytics: &Value) -> Value {
    let mut next = match analytics {
        Value::Object(_) => analytics.clone(),
        _ => Value::Object(Default::default()),
    };
    next["total_generated"] = Value::from(counter(analytics, "total_generated") + 1);
    next
}

/// Resgate: total, ticket médio (só com valor de pedido) e taxa de resgate em %.
pub fn analytics_after_redemption(analytics: &Value, order_value: Option<f64>) -> Value {
    let mut next = match analytics {
        Value::Object(_) => analytics.clone(),
        _ => Value::Object(Default::default()),
    };

    let redeemed = counter(analytics, "total_redeemed") + 1;
    let generated = counter(analytics, "total_generated");
    next["total_redeemed"] = Value::from(redeemed);

    if let Some(value) = order_value.filter(|v| *v > 0.0) {
        let previous = analytics.get("average_order_value").and_then(Value::as_f64).unwrap_or(0.0);
        let average = (previous * (redeemed - 1) as f64 + value) / redeemed as f64;
        next["average_order_value"] = Value::from(average);
    }

    if generated > 0 {
        next["redemption_rate"] = Value::from(redeemed as f64 / generated as f64 * 100.0);
    }
    next
}

// --- Roleta ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WheelItem {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub value: Option<Decimal>,
    #[serde(alias = "reward_type")]
    pub reward_type: Option<RewardType>,
    pub probability: Option<f64>,
    pub color: Option<String>,
}

impl WheelItem {
    pub fn weight(&self) -> f64 {
        self.probability.filter(|p| p.is_finite() && *p > 0.0).unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WheelConfig {
    #[serde(default)]
    pub items: Vec<WheelItem>,
}

impl WheelConfig {
    pub fn from_value(value: Option<&Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpinResult {
    pub message: String,
    pub won_item: WheelItem,
    pub winning_index: usize,
    pub coupon: crate::models::coupon::Coupon,
}

// --- Analytics ---

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    pub reward_type: RewardType,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardAnalytics {
    pub total_rewards: i64,
    pub active_rewards: i64,
    pub rewards_by_type: Vec<TypeCount>,
    pub total_coupons_generated: i64,
    pub total_coupons_redeemed: i64,
    pub redemption_rate: f64,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRewardPayload {
    #[validate(length(min = 2, max = 150, message = "O título deve ter entre 2 e 150 caracteres."))]
    #[schema(example = "10% de desconto")]
    pub title: String,

    pub description: Option<String>,
    pub reward_type: RewardType,

    #[schema(value_type = Option<f64>)]
    pub value: Option<Decimal>,

    pub customer_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 3650, message = "Dias de validade deve estar entre 1 e 3650."))]
    pub days_valid: Option<i32>,

    #[validate(range(min = 1, max = 3650, message = "Dias de validade do cupom deve estar entre 1 e 3650."))]
    pub coupon_validity_days: Option<i32>,

    #[validate(range(min = 1, message = "O limite de usos deve ser positivo."))]
    pub total_uses_limit: Option<i32>,

    #[validate(range(min = 1, message = "O limite por cliente deve ser positivo."))]
    pub max_uses_per_customer: Option<i32>,

    #[schema(value_type = Option<Object>)]
    pub trigger_conditions: Option<Value>,

    #[schema(value_type = Option<Object>)]
    pub wheel_config: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRewardPayload {
    #[validate(length(min = 2, max = 150, message = "O título deve ter entre 2 e 150 caracteres."))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub value: Option<Decimal>,
    pub is_active: Option<bool>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 3650, message = "Dias de validade deve estar entre 1 e 3650."))]
    pub days_valid: Option<i32>,
    #[validate(range(min = 1, max = 3650, message = "Dias de validade do cupom deve estar entre 1 e 3650."))]
    pub coupon_validity_days: Option<i32>,
    #[validate(range(min = 1, message = "O limite de usos deve ser positivo."))]
    pub total_uses_limit: Option<i32>,
    #[validate(range(min = 1, message = "O limite por cliente deve ser positivo."))]
    pub max_uses_per_customer: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub trigger_conditions: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub wheel_config: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpinPayload {
    pub customer_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reward() -> Reward {
        Reward {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            customer_id: None,
            created_by: None,
            title: "Sobremesa grátis".into(),
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
            max_uses_per_customer: None,
            trigger_conditions: json!({}),
            wheel_config: None,
            analytics: json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn validity_window_and_limits() {
        let now = Utc::now();
        let mut r = reward();
        assert!(r.is_valid_at(now));

        r.valid_from = Some(now + Duration::days(1));
        assert!(!r.is_valid_at(now));

        r.valid_from = None;
        r.valid_until = Some(now - Duration::seconds(1));
        assert!(!r.is_valid_at(now));

        r.valid_until = None;
        r.total_uses_limit = Some(3);
        r.current_uses = 3;
        assert!(!r.is_valid_at(now));

        r.current_uses = 2;
        r.is_active = false;
        assert!(!r.is_valid_at(now));
    }

    #[test]
    fn coupon_expiry_precedence() {
        let now = Utc::now();
        let until = now + Duration::days(90);
        let mut r = reward();
        r.days_valid = Some(30);
        r.coupon_validity_days = Some(7);
        r.valid_until = Some(until);

        assert_eq!(r.coupon_expiry(now, Some(2)), Some(now + Duration::days(2)));
        assert_eq!(r.coupon_expiry(now, None), Some(now + Duration::days(7)));

        r.coupon_validity_days = None;
        assert_eq!(r.coupon_expiry(now, None), Some(now + Duration::days(30)));

        r.days_valid = None;
        assert_eq!(r.coupon_expiry(now, None), Some(until));

        r.valid_until = None;
        assert_eq!(r.coupon_expiry(now, None), None);
    }

    #[test]
    fn coupon_expiry_is_capped_for_huge_day_counts() {
        let now = Utc::now();
        let mut r = reward();
        r.coupon_validity_days = Some(i32::MAX);

        let cap = now + Duration::days(i64::from(MAX_VALIDITY_DAYS));
        assert_eq!(r.coupon_expiry(now, None), Some(cap));
        assert_eq!(r.coupon_expiry(now, Some(i32::MAX)), Some(cap));
    }

    #[test]
    fn payload_rejects_day_counts_above_cap() {
        let payload: CreateRewardPayload = serde_json::from_value(json!({
            "title": "Café grátis",
            "rewardType": "free_item",
            "daysValid": i32::MAX
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("days_valid"));

        let payload: UpdateRewardPayload = serde_json::from_value(json!({ "couponValidityDays": 3651 })).unwrap();
        assert!(payload.validate().is_err());

        let payload: UpdateRewardPayload = serde_json::from_value(json!({ "couponValidityDays": 3650 })).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn wheel_config_parsing_and_weights() {
        let cfg = WheelConfig::from_value(Some(&json!({
            "items": [
                { "title": "Café", "probability": 3 },
                { "title": "Brinde", "probability": -1 },
                { "title": "Nada" }
            ]
        })));
        let weights: Vec<f64> = cfg.items.iter().map(WheelItem::weight).collect();
        assert_eq!(weights, vec![3.0, 1.0, 1.0]);

        assert!(WheelConfig::from_value(None).items.is_empty());
        assert!(WheelConfig::from_value(Some(&json!("lixo"))).items.is_empty());
    }

    #[test]
    fn analytics_counters_and_running_average() {
        let a = analytics_after_generation(&json!({}));
        let a = analytics_after_generation(&a);
        assert_eq!(a["total_generated"], 2);

        let a = analytics_after_redemption(&a, Some(100.0));
        assert_eq!(a["total_redeemed"], 1);
        assert_eq!(a["average_order_value"], 100.0);
        assert_eq!(a["redemption_rate"], 50.0);

        let a = analytics_after_redemption(&a, Some(50.0));
        assert_eq!(a["average_order_value"], 75.0);
        assert_eq!(a["redemption_rate"], 100.0);

        // Sem valor de pedido o ticket médio não muda
        let a = analytics_after_redemption(&a, None);
        assert_eq!(a["average_order_value"], 75.0);
        assert_eq!(a["total_redeemed"], 3);
    }
}

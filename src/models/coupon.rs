// src/models/coupon.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{checkin::DailyCount, reward::RewardType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "coupon_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Generated,
    Sent,
    Redeemed,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    pub reward_id: Uuid,
    pub customer_id: Uuid,

    #[schema(example = "JOAOD4821")]
    pub code: String,

    pub title: String,
    pub description: Option<String>,
    pub reward_type: RewardType,

    #[schema(value_type = Option<f64>)]
    pub value: Option<Decimal>,

    pub status: CouponStatus,
    pub visit_milestone: Option<i32>,

    #[schema(value_type = Option<f64>)]
    pub order_value: Option<Decimal>,

    pub generated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires < now)
    }

    /// Resgatável: gerado ou enviado, e ainda dentro do prazo.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, CouponStatus::Generated | CouponStatus::Sent) && !self.is_expired_at(now)
    }

    // Conteúdo do QR code impresso/enviado ao cliente
    pub fn qr_payload(&self) -> Value {
        json!({
            "type": "coupon",
            "code": self.code,
            "restaurantId": self.restaurant_id,
            "expiresAt": self.expires_at,
            "generatedAt": self.generated_at,
        })
    }
}

// Cupom com o resumo da recompensa e do cliente (listagens)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub coupon: Coupon,
    pub reward_title: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    #[serde(flatten)]
    pub coupon: CouponDetails,
    pub is_valid: bool,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponTypeCount {
    pub reward_type: RewardType,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponAnalytics {
    pub total_coupons: i64,
    pub redeemed_coupons: i64,
    pub expired_coupons: i64,
    pub expiring_soon_coupons: i64,
    pub coupons_by_type: Vec<CouponTypeCount>,
    pub redeemed_by_day: Vec<DailyCount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponFilter {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<CouponStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponPayload {
    pub reward_id: Uuid,
    pub customer_id: Uuid,

    #[validate(range(min = 1, max = 3650, message = "Dias de validade deve estar entre 1 e 3650."))]
    pub validity_days: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemCouponPayload {
    #[schema(value_type = Option<f64>, example = 120.50)]
    pub order_value: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpireResult {
    pub expired_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(status: CouponStatus, expires_at: Option<DateTime<Utc>>) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            reward_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            code: "MARIA1234".into(),
            title: "Café grátis".into(),
            description: None,
            reward_type: RewardType::FreeItem,
            value: None,
            status,
            visit_milestone: None,
            order_value: None,
            generated_at: now,
            expires_at,
            redeemed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn redeemable_only_when_open_and_in_date() {
        let now = Utc::now();
        let tomorrow = Some(now + Duration::days(1));
        let yesterday = Some(now - Duration::days(1));

        assert!(coupon(CouponStatus::Generated, None).is_redeemable_at(now));
        assert!(coupon(CouponStatus::Sent, tomorrow).is_redeemable_at(now));
        assert!(!coupon(CouponStatus::Generated, yesterday).is_redeemable_at(now));
        assert!(!coupon(CouponStatus::Redeemed, tomorrow).is_redeemable_at(now));
        assert!(!coupon(CouponStatus::Cancelled, None).is_redeemable_at(now));
        assert!(!coupon(CouponStatus::Expired, None).is_redeemable_at(now));
    }

    #[test]
    fn qr_payload_carries_code_and_restaurant() {
        let c = coupon(CouponStatus::Generated, None);
        let payload = c.qr_payload();
        assert_eq!(payload["type"], "coupon");
        assert_eq!(payload["code"], "MARIA1234");
        assert_eq!(payload["restaurantId"], c.restaurant_id.to_string());
    }
}

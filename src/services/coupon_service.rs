// src/services/coupon_service.rs

use chrono::Utc;
use qrcode::{render::svg, QrCode};
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{PageRequest, Paginated, Pagination, DEFAULT_PAGE_SIZE},
        error::AppError,
    },
    db::{CouponRepository, RestaurantRepository, RewardRepository},
    models::{
        coupon::{
            Coupon, CouponAnalytics, CouponDetails, CouponFilter, CouponValidation, CreateCouponPayload,
            ExpireResult, RedeemCouponPayload,
        },
        restaurant::Restaurant,
        reward::analytics_after_redemption,
    },
    services::{
        audit_service::AuditService,
        reward_service::{CouponOptions, RewardService},
    },
};

const QR_MIN_SIZE: u32 = 256;

/// SVG do QR code com o conteúdo do cupom.
pub fn coupon_qr_svg(coupon: &Coupon) -> Result<String, AppError> {
    let code = QrCode::new(coupon.qr_payload().to_string().as_bytes())
        .map_err(|e| anyhow::anyhow!("Falha ao gerar QR code: {e}"))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .build())
}

#[derive(Clone)]
pub struct CouponService {
    repo: CouponRepository,
    reward_repo: RewardRepository,
    restaurant_repo: RestaurantRepository,
    reward_service: RewardService,
    audit: AuditService,
}

impl CouponService {
    pub fn new(
        repo: CouponRepository,
        reward_repo: RewardRepository,
        restaurant_repo: RestaurantRepository,
        reward_service: RewardService,
        audit: AuditService,
    ) -> Self {
        Self {
            repo,
            reward_repo,
            restaurant_repo,
            reward_service,
            audit,
        }
    }

    pub async fn list(&self, restaurant_id: Uuid, filter: &CouponFilter) -> Result<Paginated<CouponDetails>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit, DEFAULT_PAGE_SIZE);
        let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let (items, total) = self
            .repo
            .list(restaurant_id, filter.status, search, page.limit, page.offset())
            .await?;

        Ok(Paginated {
            items,
            pagination: Pagination::from_total(page, total),
        })
    }

    pub async fn create(&self, restaurant_id: Uuid, payload: &CreateCouponPayload) -> Result<Coupon, AppError> {
        self.reward_service
            .generate_coupon(
                self.repo.pool(),
                restaurant_id,
                payload.reward_id,
                payload.customer_id,
                CouponOptions {
                    validity_days: payload.validity_days,
                    ..CouponOptions::default()
                },
            )
            .await
    }

    pub async fn get(&self, restaurant_id: Uuid, id: Uuid) -> Result<Coupon, AppError> {
        self.repo
            .find_by_id(self.repo.pool(), restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("coupon.not_found"))
    }

    /// Resgate único: o UPDATE condicional decide; analytics da recompensa na mesma transação.
    pub async fn redeem(
        &self,
        restaurant_id: Uuid,
        actor_id: Uuid,
        id: Uuid,
        payload: &RedeemCouponPayload,
    ) -> Result<Coupon, AppError> {
        let mut tx = self.repo.pool().begin().await?;

        self.repo
            .find_by_id(&mut *tx, restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("coupon.not_found"))?;

        let coupon = self
            .repo
            .redeem(&mut *tx, restaurant_id, id, payload.order_value)
            .await?
            .ok_or(AppError::BadRequest("coupon.not_redeemable"))?;

        if let Some(reward) = self.reward_repo.lock(&mut *tx, restaurant_id, coupon.reward_id).await? {
            let order_value = payload.order_value.and_then(|v| v.to_f64());
            self.reward_repo
                .set_analytics(&mut *tx, reward.id, &analytics_after_redemption(&reward.analytics, order_value))
                .await?;
        }

        tx.commit().await?;

        self.audit
            .record(
                Some(actor_id),
                Some(restaurant_id),
                "coupon.redeem",
                "coupons",
                json!({ "couponId": coupon.id, "code": coupon.code, "orderValue": payload.order_value }),
            )
            .await;

        Ok(coupon)
    }

    pub async fn cancel(&self, restaurant_id: Uuid, id: Uuid) -> Result<Coupon, AppError> {
        self.get(restaurant_id, id).await?;
        self.repo
            .cancel(restaurant_id, id)
            .await?
            .ok_or(AppError::BadRequest("coupon.not_cancellable"))
    }

    pub async fn validate(&self, restaurant_id: Uuid, code: &str) -> Result<CouponValidation, AppError> {
        let coupon = self
            .repo
            .find_details_by_code(restaurant_id, code.trim())
            .await?
            .ok_or(AppError::NotFound("coupon.not_found"))?;

        let is_valid = coupon.coupon.is_redeemable_at(Utc::now());
        Ok(CouponValidation { coupon, is_valid })
    }

    pub async fn validate_public(&self, slug: &str, code: &str) -> Result<CouponValidation, AppError> {
        let restaurant = self
            .restaurant_repo
            .find_by_slug(slug)
            .await?
            .filter(Restaurant::is_public)
            .ok_or(AppError::NotFound("restaurant.not_found"))?;
        self.validate(restaurant.id, code).await
    }

    pub async fn expire_overdue(&self, restaurant_id: Uuid) -> Result<ExpireResult, AppError> {
        let expired_count = self.repo.expire_overdue(restaurant_id).await?;
        if expired_count > 0 {
            tracing::info!(%restaurant_id, expired_count, "Cupons vencidos marcados como expirados");
        }
        Ok(ExpireResult { expired_count })
    }

    pub async fn analytics(&self, restaurant_id: Uuid) -> Result<CouponAnalytics, AppError> {
        let (total_coupons, redeemed_coupons, expired_coupons, expiring_soon_coupons) =
            self.repo.status_counts(restaurant_id).await?;

        Ok(CouponAnalytics {
            total_coupons,
            redeemed_coupons,
            expired_coupons,
            expiring_soon_coupons,
            coupons_by_type: self.repo.count_by_type(restaurant_id).await?,
            redeemed_by_day: self.repo.redeemed_per_day(restaurant_id).await?,
        })
    }

    pub async fn qrcode(&self, restaurant_id: Uuid, id: Uuid) -> Result<String, AppError> {
        let coupon = self.get(restaurant_id, id).await?;
        coupon_qr_svg(&coupon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{coupon::CouponStatus, reward::RewardType};

    #[test]
    fn qr_code_is_svg() {
        let now = Utc::now();
        let coupon = Coupon {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            reward_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            code: "ANA1234".into(),
            title: "Café".into(),
            description: None,
            reward_type: RewardType::FreeItem,
            value: None,
            status: CouponStatus::Generated,
            visit_milestone: None,
            order_value: None,
            generated_at: now,
            expires_at: None,
            redeemed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        let svg = coupon_qr_svg(&coupon).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }
}

// src/services/feedback_service.rs

use uuid::Uuid;

use crate::{
    common::{
        db_utils::{PageRequest, Paginated, Pagination, DEFAULT_PAGE_SIZE},
        error::AppError,
    },
    db::{
        feedback_repo::{FeedbackQuery, NewFeedback},
        CustomerRepository, FeedbackRepository, QrCodeRepository, RestaurantRepository,
    },
    models::{
        feedback::{
            Feedback, FeedbackDetails, FeedbackFilter, FeedbackPriority, FeedbackSource, FeedbackType,
            PublicFeedbackPayload, PublicFeedbackResponse, UpdateFeedbackPayload,
        },
        qr_code::QrCode,
        restaurant::Restaurant,
    },
};

// Pontos de fidelidade por avaliação identificada
pub const POINTS_PER_FEEDBACK: i32 = 10;

/// Origem e mesa da avaliação: o QR code lido prevalece sobre a mesa informada.
pub fn feedback_origin(qr_code: Option<&QrCode>, informed_table: Option<i32>) -> (FeedbackSource, Option<i32>) {
    match qr_code {
        Some(qr) => (FeedbackSource::Qrcode, qr.table_number.or(informed_table)),
        None => (FeedbackSource::Web, informed_table),
    }
}

fn clean_comment(comment: Option<&str>) -> Option<&str> {
    comment.map(str::trim).filter(|c| !c.is_empty())
}

#[derive(Clone)]
pub struct FeedbackService {
    repo: FeedbackRepository,
    customer_repo: CustomerRepository,
    restaurant_repo: RestaurantRepository,
    qr_code_repo: QrCodeRepository,
}

impl FeedbackService {
    pub fn new(
        repo: FeedbackRepository,
        customer_repo: CustomerRepository,
        restaurant_repo: RestaurantRepository,
        qr_code_repo: QrCodeRepository,
    ) -> Self {
        Self {
            repo,
            customer_repo,
            restaurant_repo,
            qr_code_repo,
        }
    }

    /// Avaliação enviada pela página pública do restaurante.
    pub async fn submit_public(&self, slug: &str, payload: &PublicFeedbackPayload) -> Result<PublicFeedbackResponse, AppError> {
        let restaurant = self
            .restaurant_repo
            .find_by_slug(slug)
            .await?
            .filter(Restaurant::is_public)
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        let mut tx = self.repo.pool().begin().await?;

        let customer = match payload.customer_id {
            Some(id) => Some(
                self.customer_repo
                    .lock(&mut *tx, restaurant.id, id)
                    .await?
                    .ok_or(AppError::NotFound("customer.not_found"))?,
            ),
            None => None,
        };

        let qr_code = match payload.qr_code_id {
            Some(id) => Some(
                self.qr_code_repo
                    .find_by_id(&mut *tx, restaurant.id, id)
                    .await?
                    .filter(|qr| qr.is_active)
                    .ok_or(AppError::NotFound("qrcode.not_found"))?,
            ),
            None => None,
        };

        let feedback_type = payload.feedback_type.unwrap_or(FeedbackType::General);
        let (source, table_number) = feedback_origin(qr_code.as_ref(), payload.table_number);
        let priority = FeedbackPriority::for_rating(payload.rating, feedback_type);

        let feedback = self
            .repo
            .insert(
                &mut *tx,
                &NewFeedback {
                    restaurant_id: restaurant.id,
                    customer_id: customer.as_ref().map(|c| c.id),
                    qr_code_id: qr_code.as_ref().map(|qr| qr.id),
                    rating: payload.rating,
                    nps_score: payload.nps_score,
                    comment: clean_comment(payload.comment.as_deref()),
                    feedback_type,
                    source,
                    table_number,
                    priority,
                },
            )
            .await?;

        if let Some(qr) = &qr_code {
            self.qr_code_repo.record_feedback(&mut *tx, qr.id).await?;
        }

        let points_earned = match &customer {
            Some(c) => {
                self.customer_repo.add_loyalty_points(&mut *tx, c.id, POINTS_PER_FEEDBACK).await?;
                POINTS_PER_FEEDBACK
            }
            None => 0,
        };

        tx.commit().await?;

        if priority >= FeedbackPriority::High {
            tracing::warn!(restaurant_id = %restaurant.id, feedback_id = %feedback.id, rating = feedback.rating, ?priority, "Avaliação negativa recebida");
        } else {
            tracing::info!(restaurant_id = %restaurant.id, feedback_id = %feedback.id, rating = feedback.rating, "Avaliação recebida");
        }

        Ok(PublicFeedbackResponse { feedback, points_earned })
    }

    pub async fn list(&self, restaurant_id: Uuid, filter: &FeedbackFilter) -> Result<Paginated<FeedbackDetails>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit, DEFAULT_PAGE_SIZE);
        let query = FeedbackQuery {
            status: filter.status,
            priority: filter.priority,
            source: filter.source,
            rating: filter.rating,
        };

        let (items, total) = self.repo.list(restaurant_id, &query, page.limit, page.offset()).await?;
        Ok(Paginated {
            items,
            pagination: Pagination::from_total(page, total),
        })
    }

    pub async fn get(&self, restaurant_id: Uuid, id: Uuid) -> Result<FeedbackDetails, AppError> {
        self.repo
            .find_details(restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("feedback.not_found"))
    }

    pub async fn update(&self, restaurant_id: Uuid, id: Uuid, payload: &UpdateFeedbackPayload) -> Result<Feedback, AppError> {
        self.repo
            .update(
                restaurant_id,
                id,
                payload.status,
                payload.priority,
                payload.internal_notes.as_deref(),
            )
            .await?
            .ok_or(AppError::NotFound("feedback.not_found"))
    }

    pub async fn respond(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        response_text: &str,
        actor_id: Uuid,
    ) -> Result<Feedback, AppError> {
        let feedback = self
            .repo
            .respond(restaurant_id, id, response_text.trim(), actor_id)
            .await?
            .ok_or(AppError::NotFound("feedback.not_found"))?;

        tracing::info!(%restaurant_id, feedback_id = %id, "Avaliação respondida");
        Ok(feedback)
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete(restaurant_id, id).await? {
            0 => Err(AppError::NotFound("feedback.not_found")),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::qr_code::QrCodeType;
    use chrono::Utc;

    fn qr_code(table_number: Option<i32>) -> QrCode {
        let now = Utc::now();
        QrCode {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            qr_type: QrCodeType::Feedback,
            table_number,
            table_name: None,
            location_description: None,
            capacity: None,
            short_code: "k2H8aQ1z".into(),
            target_url: String::new(),
            is_active: true,
            total_scans: 0,
            total_feedbacks: 0,
            last_scan: None,
            last_feedback: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn scanned_table_wins_over_informed_table() {
        let qr = qr_code(Some(7));
        assert_eq!(feedback_origin(Some(&qr), Some(2)), (FeedbackSource::Qrcode, Some(7)));

        let counter_qr = qr_code(None);
        assert_eq!(feedback_origin(Some(&counter_qr), Some(2)), (FeedbackSource::Qrcode, Some(2)));

        assert_eq!(feedback_origin(None, Some(2)), (FeedbackSource::Web, Some(2)));
        assert_eq!(feedback_origin(None, None), (FeedbackSource::Web, None));
    }

    #[test]
    fn blank_comments_are_dropped() {
        assert_eq!(clean_comment(Some("  ótimo  ")), Some("ótimo"));
        assert_eq!(clean_comment(Some("   ")), None);
        assert_eq!(clean_comment(None), None);
    }
}

// src/models/feedback.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "feedback_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Compliment,
    Complaint,
    Suggestion,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "feedback_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackSource {
    Qrcode,
    Web,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "feedback_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Reviewed,
    Responded,
    Resolved,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "feedback_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl FeedbackPriority {
    /// Prioridade inicial pela nota: reclamações e notas baixas sobem na fila.
    pub fn for_rating(rating: i32, feedback_type: FeedbackType) -> Self {
        let complaint = feedback_type == FeedbackType::Complaint;
        match rating {
            r if r <= 1 && complaint => Self::Urgent,
            r if r <= 2 || complaint => Self::High,
            3 => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    pub customer_id: Option<Uuid>,
    pub qr_code_id: Option<Uuid>,

    #[schema(example = 5)]
    pub rating: i32,
    pub nps_score: Option<i32>,
    pub comment: Option<String>,
    pub feedback_type: FeedbackType,
    pub source: FeedbackSource,
    pub table_number: Option<i32>,
    pub status: FeedbackStatus,
    pub priority: FeedbackPriority,
    pub response_text: Option<String>,
    pub response_date: Option<DateTime<Utc>>,
    pub responded_by: Option<Uuid>,
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Avaliação com o nome do cliente (listagens do painel)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub feedback: Feedback,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

// Enviado pela página pública (QR code da mesa ou link)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicFeedbackPayload {
    #[validate(range(min = 1, max = 5, message = "A nota deve estar entre 1 e 5."))]
    #[schema(example = 5)]
    pub rating: i32,

    #[validate(range(min = 0, max = 10, message = "O NPS deve estar entre 0 e 10."))]
    pub nps_score: Option<i32>,

    #[validate(length(max = 2000, message = "O comentário deve ter no máximo 2000 caracteres."))]
    pub comment: Option<String>,

    pub feedback_type: Option<FeedbackType>,
    pub customer_id: Option<Uuid>,
    pub qr_code_id: Option<Uuid>,

    #[validate(range(min = 1, message = "Número de mesa inválido."))]
    pub table_number: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedbackPayload {
    pub status: Option<FeedbackStatus>,
    pub priority: Option<FeedbackPriority>,

    #[validate(length(max = 2000, message = "As notas internas devem ter no máximo 2000 caracteres."))]
    pub internal_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondFeedbackPayload {
    #[validate(length(min = 1, max = 2000, message = "A resposta deve ter entre 1 e 2000 caracteres."))]
    pub response_text: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicFeedbackResponse {
    pub feedback: Feedback,
    pub points_earned: i32,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackFilter {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<FeedbackStatus>,
    pub priority: Option<FeedbackPriority>,
    pub source: Option<FeedbackSource>,
    pub rating: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(rating: i32, nps: Option<i32>) -> PublicFeedbackPayload {
        PublicFeedbackPayload {
            rating,
            nps_score: nps,
            comment: None,
            feedback_type: None,
            customer_id: None,
            qr_code_id: None,
            table_number: None,
        }
    }

    #[test]
    fn rating_and_nps_bounds() {
        assert!(payload(5, Some(10)).validate().is_ok());
        assert!(payload(1, Some(0)).validate().is_ok());
        assert!(payload(0, None).validate().is_err());
        assert!(payload(6, None).validate().is_err());
        assert!(payload(4, Some(11)).validate().is_err());
    }

    #[test]
    fn low_ratings_and_complaints_get_priority() {
        use FeedbackPriority::*;
        assert_eq!(FeedbackPriority::for_rating(1, FeedbackType::Complaint), Urgent);
        assert_eq!(FeedbackPriority::for_rating(2, FeedbackType::General), High);
        assert_eq!(FeedbackPriority::for_rating(4, FeedbackType::Complaint), High);
        assert_eq!(FeedbackPriority::for_rating(3, FeedbackType::Suggestion), Medium);
        assert_eq!(FeedbackPriority::for_rating(5, FeedbackType::Compliment), Low);
    }
}

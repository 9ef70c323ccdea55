// src/models/qr_code.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "qr_code_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QrCodeType {
    #[default]
    Feedback,
    Checkin,
    Menu,
}

impl QrCodeType {
    /// Check-in vale para o salão inteiro; os demais apontam para uma mesa.
    pub fn needs_table(self) -> bool {
        !matches!(self, Self::Checkin)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    pub qr_type: QrCodeType,

    #[schema(example = 12)]
    pub table_number: Option<i32>,

    #[schema(example = "Varanda 12")]
    pub table_name: Option<String>,
    pub location_description: Option<String>,
    pub capacity: Option<i32>,

    #[schema(example = "aZ81kQpX")]
    pub short_code: String,

    #[schema(example = "https://app.exemplo.com/feedback/new?restaurant=cantina&qr=aZ81kQpX&table=12")]
    pub target_url: String,

    pub is_active: bool,
    pub total_scans: i32,
    pub total_feedbacks: i32,
    pub last_scan: Option<DateTime<Utc>>,
    pub last_feedback: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QrCode {
    /// Avaliações por leitura, em porcentagem com 2 casas.
    pub fn conversion_rate(&self) -> f64 {
        if self.total_scans <= 0 {
            return 0.0;
        }
        let rate = f64::from(self.total_feedbacks) / f64::from(self.total_scans) * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

/// Endereço que o QR code abre no aplicativo público; `qr` identifica a leitura.
pub fn target_url(
    base_url: &str,
    qr_type: QrCodeType,
    slug: &str,
    table_number: Option<i32>,
    short_code: &str,
) -> String {
    let base = base_url.trim_end_matches('/');
    let table = table_number.map(|n| format!("&table={n}")).unwrap_or_default();
    match qr_type {
        QrCodeType::Checkin => format!("{base}/checkin/public/{slug}?qr={short_code}"),
        QrCodeType::Menu => format!("{base}/menu/dine-in/{slug}?qr={short_code}{table}"),
        QrCodeType::Feedback => format!("{base}/feedback/new?restaurant={slug}&qr={short_code}{table}"),
    }
}

fn validate_table_for_type(payload: &CreateQrCodePayload) -> Result<(), ValidationError> {
    if payload.qr_type.needs_table() && payload.table_number.is_none() {
        let mut err = ValidationError::new("table_required");
        err.message = Some("Informe o número da mesa para este tipo de QR code.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_table_for_type"))]
pub struct CreateQrCodePayload {
    #[serde(default)]
    pub qr_type: QrCodeType,

    #[validate(range(min = 1, max = 9999, message = "Número de mesa inválido."))]
    pub table_number: Option<i32>,

    #[validate(length(max = 50, message = "O nome da mesa deve ter no máximo 50 caracteres."))]
    pub table_name: Option<String>,

    #[validate(length(max = 200, message = "A localização deve ter no máximo 200 caracteres."))]
    pub location_description: Option<String>,

    #[validate(range(min = 1, max = 100, message = "A capacidade deve estar entre 1 e 100."))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQrCodePayload {
    #[validate(length(max = 50, message = "O nome da mesa deve ter no máximo 50 caracteres."))]
    pub table_name: Option<String>,

    #[validate(length(max = 200, message = "A localização deve ter no máximo 200 caracteres."))]
    pub location_description: Option<String>,

    #[validate(range(min = 1, max = 100, message = "A capacidade deve estar entre 1 e 100."))]
    pub capacity: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct QrImageQuery {
    pub size: Option<u32>,
}

// Resposta da leitura pública: para onde o aplicativo deve seguir
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrScan {
    pub qr_code_id: Uuid,
    pub qr_type: QrCodeType,
    pub table_number: Option<i32>,
    pub restaurant_slug: String,
    pub target_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeStats {
    #[serde(flatten)]
    pub qr_code: QrCode,
    pub conversion_rate: f64,
    pub average_rating: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(qr_type: QrCodeType, table_number: Option<i32>) -> CreateQrCodePayload {
        CreateQrCodePayload {
            qr_type,
            table_number,
            table_name: None,
            location_description: None,
            capacity: None,
        }
    }

    #[test]
    fn table_codes_need_a_table_number() {
        assert!(payload(QrCodeType::Feedback, None).validate().is_err());
        assert!(payload(QrCodeType::Menu, None).validate().is_err());
        assert!(payload(QrCodeType::Feedback, Some(3)).validate().is_ok());
        assert!(payload(QrCodeType::Checkin, None).validate().is_ok());
        assert!(payload(QrCodeType::Feedback, Some(0)).validate().is_err());
    }

    #[test]
    fn urls_follow_the_code_type() {
        let base = "https://app.exemplo.com/";
        assert_eq!(
            target_url(base, QrCodeType::Checkin, "cantina", Some(4), "Ab12Cd34"),
            "https://app.exemplo.com/checkin/public/cantina?qr=Ab12Cd34"
        );
        assert_eq!(
            target_url(base, QrCodeType::Feedback, "cantina", Some(4), "Ab12Cd34"),
            "https://app.exemplo.com/feedback/new?restaurant=cantina&qr=Ab12Cd34&table=4"
        );
        assert_eq!(
            target_url(base, QrCodeType::Menu, "cantina", Some(9), "Ab12Cd34"),
            "https://app.exemplo.com/menu/dine-in/cantina?qr=Ab12Cd34&table=9"
        );
    }

    #[test]
    fn conversion_rate_handles_zero_scans() {
        let now = Utc::now();
        let mut code = QrCode {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            qr_type: QrCodeType::Feedback,
            table_number: Some(1),
            table_name: None,
            location_description: None,
            capacity: None,
            short_code: "abc12345".into(),
            target_url: String::new(),
            is_active: true,
            total_scans: 0,
            total_feedbacks: 0,
            last_scan: None,
            last_feedback: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(code.conversion_rate(), 0.0);

        code.total_scans = 3;
        code.total_feedbacks = 1;
        assert_eq!(code.conversion_rate(), 33.33);
    }
}

// src/models/customer.rs

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{checkin::Checkin, coupon::Coupon, feedback::Feedback, survey::SurveyResponse};

// Nome usado quando o cliente se identifica só pelo telefone/CPF
pub const ANONYMOUS_CUSTOMER_NAME: &str = "Cliente Anônimo";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    #[schema(example = "João da Silva")]
    pub name: String,

    pub email: Option<String>,

    #[schema(example = "(11) 97777-6666")]
    pub phone: Option<String>,

    pub whatsapp: Option<String>,

    #[schema(example = "123.456.789-00")]
    pub cpf: Option<String>,

    pub birth_date: Option<NaiveDate>,

    #[schema(example = "checkin_qrcode")]
    pub source: String,

    pub total_visits: i32,
    pub loyalty_points: i32,
    pub survey_responses_count: i32,
    pub last_visit: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resumo do cliente exibido junto de check-ins e cupons
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// Quantos registros de cada histórico entram na ficha do cliente
pub const HISTORY_LIMIT: i64 = 10;

// Ficha completa: cliente + últimas visitas, cupons resgatados, pesquisas e avaliações
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[serde(flatten)]
    pub customer: Customer,
    pub recent_checkins: Vec<Checkin>,
    pub redeemed_coupons: Vec<Coupon>,
    pub survey_responses: Vec<SurveyResponse>,
    pub feedbacks: Vec<Feedback>,
}

/// Aniversário no dia: quem nasceu em 29/02 comemora em 28/02 nos anos não bissextos.
pub fn has_birthday_on(birth_date: NaiveDate, today: NaiveDate) -> bool {
    if birth_date.month() != today.month() {
        return false;
    }
    let leap_day = birth_date.month() == 2 && birth_date.day() == 29;
    let today_is_leap_year = NaiveDate::from_ymd_opt(today.year(), 2, 29).is_some();
    if leap_day && !today_is_leap_year {
        return today.day() == 28;
    }
    birth_date.day() == today.day()
}

fn validate_contact(payload: &CreateCustomerPayload) -> Result<(), ValidationError> {
    let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if has(&payload.email) || has(&payload.phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("contact_required");
        err.message = Some("Informe pelo menos um e-mail ou telefone.".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_contact"))]
pub struct CreateCustomerPayload {
    #[validate(length(min = 2, max = 150, message = "O nome deve ter entre 2 e 150 caracteres."))]
    #[schema(example = "João da Silva")]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 2, max = 150, message = "O nome deve ter entre 2 e 150 caracteres."))]
    pub name: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: Option<&str>, phone: Option<&str>) -> CreateCustomerPayload {
        CreateCustomerPayload {
            name: "João da Silva".into(),
            email: email.map(Into::into),
            phone: phone.map(Into::into),
            whatsapp: None,
            cpf: None,
            birth_date: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn birthdays_match_day_and_month() {
        assert!(has_birthday_on(date(1990, 7, 14), date(2026, 7, 14)));
        assert!(!has_birthday_on(date(1990, 7, 14), date(2026, 7, 15)));
        assert!(!has_birthday_on(date(1990, 7, 14), date(2026, 8, 14)));
    }

    #[test]
    fn leap_day_birthdays_fall_back_to_the_28th() {
        let born = date(2000, 2, 29);
        assert!(has_birthday_on(born, date(2027, 2, 28)));
        assert!(!has_birthday_on(born, date(2028, 2, 28)));
        assert!(has_birthday_on(born, date(2028, 2, 29)));
    }

    #[test]
    fn customer_needs_email_or_phone() {
        assert!(payload(None, None).validate().is_err());
        assert!(payload(None, Some("  ")).validate().is_err());
        assert!(payload(Some("joao@email.com"), None).validate().is_ok());
        assert!(payload(None, Some("11999990000")).validate().is_ok());
    }
}

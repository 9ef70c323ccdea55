// src/models/checkin.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::customer::CustomerSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "checkin_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CheckinStatus {
    Active,
    Completed,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub id: Uuid,

    #[schema(ignore)]
    pub restaurant_id: Uuid,

    pub customer_id: Uuid,
    pub coupon_id: Option<Uuid>,

    #[schema(example = "12")]
    pub table_number: Option<String>,

    pub checkin_time: DateTime<Utc>,
    pub checkout_time: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub status: CheckinStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCheckin {
    #[serde(flatten)]
    pub checkin: Checkin,
    pub customer: CustomerSummary,
}

// ---
// Configurações do programa (settings.checkinProgramSettings do restaurante)
// ---

pub const DEFAULT_CHECKIN_DURATION_MINUTES: i64 = 1440;
// 30 dias
pub const MAX_CHECKIN_DURATION_MINUTES: i64 = 43_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentificationMethod {
    #[default]
    Phone,
    Cpf,
}

impl IdentificationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentificationMethod::Phone => "phone",
            IdentificationMethod::Cpf => "cpf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
pub enum CheckinTimeRestriction {
    #[default]
    #[serde(rename = "unlimited")]
    Unlimited,
    #[serde(rename = "1_per_day")]
    OncePerDay,
    #[serde(rename = "1_per_6_hours")]
    OncePerSixHours,
}

impl CheckinTimeRestriction {
    pub fn min_interval(self) -> Option<Duration> {
        match self {
            CheckinTimeRestriction::Unlimited => None,
            CheckinTimeRestriction::OncePerDay => Some(Duration::hours(24)),
            CheckinTimeRestriction::OncePerSixHours => Some(Duration::hours(6)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitReward {
    pub visit_count: i32,
    pub reward_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckinProgramSettings {
    pub checkin_duration_minutes: i64,
    pub identification_method: IdentificationMethod,
    pub require_coupon_for_checkin: bool,
    pub checkin_time_restriction: CheckinTimeRestriction,
    pub points_per_checkin: i32,
    pub rewards_per_visit: Vec<VisitReward>,
}

impl Default for CheckinProgramSettings {
    fn default() -> Self {
        Self {
            checkin_duration_minutes: DEFAULT_CHECKIN_DURATION_MINUTES,
            identification_method: IdentificationMethod::Phone,
            require_coupon_for_checkin: false,
            checkin_time_restriction: CheckinTimeRestriction::Unlimited,
            points_per_checkin: 1,
            rewards_per_visit: Vec::new(),
        }
    }
}

impl CheckinProgramSettings {
    /// Lê do JSON de configurações do restaurante; campos ausentes ou inválidos usam o padrão.
    pub fn from_restaurant_settings(settings: &Value) -> Self {
        let mut parsed = settings
            .get("checkinProgramSettings")
            .and_then(|v| serde_json::from_value::<CheckinProgramSettings>(v.clone()).ok())
            .unwrap_or_default();

        if parsed.checkin_duration_minutes <= 0 {
            parsed.checkin_duration_minutes = DEFAULT_CHECKIN_DURATION_MINUTES;
        }
        parsed.checkin_duration_minutes = parsed.checkin_duration_minutes.min(MAX_CHECKIN_DURATION_MINUTES);
        parsed
    }

    pub fn expires_at(&self, checkin_time: DateTime<Utc>) -> DateTime<Utc> {
        let minutes = self.checkin_duration_minutes.clamp(1, MAX_CHECKIN_DURATION_MINUTES);
        checkin_time
            .checked_add_signed(Duration::minutes(minutes))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Recompensas cujo marco bate exatamente com o total de visitas.
    pub fn milestones_for(&self, total_visits: i32) -> impl Iterator<Item = &VisitReward> {
        self.rewards_per_visit
            .iter()
            .filter(move |r| r.visit_count == total_visits)
    }
}

/// Validação de `settings` no `PUT /api/restaurant`: o bloco do programa de check-in,
/// quando presente, precisa ter formato e limites válidos.
pub fn validate_restaurant_settings(settings: &Value) -> Result<(), ValidationError> {
    let Some(program) = settings.get("checkinProgramSettings") else {
        return Ok(());
    };

    let parsed = serde_json::from_value::<CheckinProgramSettings>(program.clone()).map_err(|_| {
        let mut err = ValidationError::new("checkin_program_settings");
        err.message = Some("Configurações do programa de check-in inválidas.".into());
        err
    })?;

    if !(1..=MAX_CHECKIN_DURATION_MINUTES).contains(&parsed.checkin_duration_minutes) {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &1);
        err.add_param("max".into(), &MAX_CHECKIN_DURATION_MINUTES);
        err.message = Some("A duração do check-in deve estar entre 1 minuto e 30 dias.".into());
        return Err(err);
    }

    if parsed.points_per_checkin < 0 {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0);
        err.message = Some("Os pontos por check-in não podem ser negativos.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Analytics
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsPeriod {
    Days(i64),
    All,
}

impl AnalyticsPeriod {
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value.unwrap_or("30d") {
            "7d" => Some(AnalyticsPeriod::Days(7)),
            "30d" => Some(AnalyticsPeriod::Days(30)),
            "90d" => Some(AnalyticsPeriod::Days(90)),
            "1y" => Some(AnalyticsPeriod::Days(365)),
            "all" => Some(AnalyticsPeriod::All),
            _ => None,
        }
    }

    pub fn start_date(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            AnalyticsPeriod::Days(days) => Some(now - Duration::days(days)),
            AnalyticsPeriod::All => None,
        }
    }
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FrequentCustomer {
    pub customer_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub checkin_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinAnalytics {
    pub total_checkins: i64,
    pub most_frequent_customers: Vec<FrequentCustomer>,
    pub average_visit_duration_seconds: f64,
    pub checkins_by_day: Vec<DailyCount>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordCheckinPayload {
    pub customer_id: Uuid,
    #[validate(length(max = 20, message = "Número da mesa muito longo."))]
    pub table_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicCheckinPayload {
    #[schema(example = "11999990000")]
    pub phone_number: Option<String>,
    pub cpf: Option<String>,

    #[validate(length(max = 150, message = "Nome muito longo."))]
    pub customer_name: Option<String>,

    #[validate(length(max = 20, message = "Número da mesa muito longo."))]
    pub table_number: Option<String>,

    pub coupon_id: Option<Uuid>,
}

// O que o cliente ganhou ao atingir um marco de visitas
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardEarned {
    pub reward_id: Uuid,
    pub reward_title: String,
    pub reward_type: String,
    pub visit_count: i32,
    pub description: Option<String>,
    pub coupon_code: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub value: Option<rust_decimal::Decimal>,
    #[schema(value_type = Option<Object>)]
    pub wheel_config: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicCheckinResponse {
    pub checkin: Checkin,
    pub customer_total_visits: i32,
    pub reward_earned: Option<RewardEarned>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_default_when_absent() {
        let settings = CheckinProgramSettings::from_restaurant_settings(&json!({}));
        assert_eq!(settings.checkin_duration_minutes, 1440);
        assert_eq!(settings.identification_method, IdentificationMethod::Phone);
        assert!(!settings.require_coupon_for_checkin);
        assert_eq!(settings.points_per_checkin, 1);
    }

    #[test]
    fn settings_are_read_from_restaurant_json() {
        let rid = Uuid::new_v4();
        let settings = CheckinProgramSettings::from_restaurant_settings(&json!({
            "checkinProgramSettings": {
                "checkinDurationMinutes": 120,
                "identificationMethod": "cpf",
                "requireCouponForCheckin": true,
                "checkinTimeRestriction": "1_per_6_hours",
                "rewardsPerVisit": [{ "visitCount": 5, "rewardId": rid }]
            }
        }));

        assert_eq!(settings.checkin_duration_minutes, 120);
        assert_eq!(settings.identification_method, IdentificationMethod::Cpf);
        assert!(settings.require_coupon_for_checkin);
        assert_eq!(settings.checkin_time_restriction.min_interval(), Some(Duration::hours(6)));
        assert_eq!(settings.milestones_for(5).count(), 1);
        assert_eq!(settings.milestones_for(4).count(), 0);
    }

    #[test]
    fn non_positive_duration_falls_back() {
        let settings = CheckinProgramSettings::from_restaurant_settings(&json!({
            "checkinProgramSettings": { "checkinDurationMinutes": 0 }
        }));
        assert_eq!(settings.checkin_duration_minutes, DEFAULT_CHECKIN_DURATION_MINUTES);
    }

    #[test]
    fn huge_duration_is_clamped_and_never_overflows() {
        let settings = CheckinProgramSettings::from_restaurant_settings(&json!({
            "checkinProgramSettings": { "checkinDurationMinutes": 1_000_000_000_000_i64 }
        }));
        assert_eq!(settings.checkin_duration_minutes, MAX_CHECKIN_DURATION_MINUTES);

        let now = Utc::now();
        assert_eq!(settings.expires_at(now) - now, Duration::minutes(MAX_CHECKIN_DURATION_MINUTES));

        // Mesmo montado à mão, o cálculo não estoura
        let raw = CheckinProgramSettings {
            checkin_duration_minutes: i64::MAX,
            ..CheckinProgramSettings::default()
        };
        assert_eq!(raw.expires_at(now) - now, Duration::minutes(MAX_CHECKIN_DURATION_MINUTES));
        assert_eq!(raw.expires_at(DateTime::<Utc>::MAX_UTC), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn restaurant_settings_validation() {
        assert!(validate_restaurant_settings(&json!({ "theme": "dark" })).is_ok());
        assert!(validate_restaurant_settings(&json!({
            "checkinProgramSettings": { "checkinDurationMinutes": 180, "identificationMethod": "cpf" }
        }))
        .is_ok());

        assert!(validate_restaurant_settings(&json!({
            "checkinProgramSettings": { "checkinDurationMinutes": 1_000_000_000_000_i64 }
        }))
        .is_err());
        assert!(validate_restaurant_settings(&json!({
            "checkinProgramSettings": { "checkinDurationMinutes": 0 }
        }))
        .is_err());
        assert!(validate_restaurant_settings(&json!({
            "checkinProgramSettings": { "identificationMethod": "email" }
        }))
        .is_err());
        assert!(validate_restaurant_settings(&json!({
            "checkinProgramSettings": { "pointsPerCheckin": -3 }
        }))
        .is_err());
    }

    #[test]
    fn expiry_adds_duration() {
        let settings = CheckinProgramSettings::default();
        let now = Utc::now();
        assert_eq!(settings.expires_at(now) - now, Duration::minutes(1440));
    }

    #[test]
    fn analytics_period_parsing() {
        assert_eq!(AnalyticsPeriod::parse(None), Some(AnalyticsPeriod::Days(30)));
        assert_eq!(AnalyticsPeriod::parse(Some("1y")), Some(AnalyticsPeriod::Days(365)));
        assert_eq!(AnalyticsPeriod::parse(Some("all")), Some(AnalyticsPeriod::All));
        assert_eq!(AnalyticsPeriod::parse(Some("2w")), None);
        assert!(AnalyticsPeriod::All.start_date(Utc::now()).is_none());
    }
}

// src/models/survey.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "survey_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Draft,
    Active,
    Inactive,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Nps,
    Rating,
    Text,
    MultipleChoice,
    YesNo,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub created_by: Option<Uuid>,
    #[schema(example = "Como foi sua experiência?")]
    pub title: String,
    pub description: Option<String>,
    pub status: SurveyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    #[schema(value_type = Vec<String>)]
    pub options: Value,
    pub is_required: bool,
    pub order_index: i32,
}

impl Question {
    fn option_list(&self) -> Vec<&str> {
        self.options
            .as_array()
            .map(|opts| opts.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Valida a resposta conforme o tipo da pergunta; devolve o valor normalizado.
    pub fn normalize_answer(&self, value: &str) -> Result<String, &'static str> {
        let value = value.trim();
        match self.question_type {
            QuestionType::Nps => match value.parse::<i32>() {
                Ok(n) if (0..=10).contains(&n) => Ok(n.to_string()),
                _ => Err("survey.invalid_nps"),
            },
            QuestionType::Rating => match value.parse::<i32>() {
                Ok(n) if (1..=5).contains(&n) => Ok(n.to_string()),
                _ => Err("survey.invalid_rating"),
            },
            QuestionType::MultipleChoice => {
                if self.option_list().contains(&value) {
                    Ok(value.to_string())
                } else {
                    Err("survey.invalid_option")
                }
            }
            QuestionType::YesNo => match value.to_lowercase().as_str() {
                "yes" | "sim" | "true" => Ok("yes".into()),
                "no" | "nao" | "não" | "false" => Ok("no".into()),
                _ => Err("survey.invalid_option"),
            },
            QuestionType::Text => Ok(value.to_string()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyWithQuestions {
    #[serde(flatten)]
    pub survey: Survey,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: Uuid,
    pub survey_id: Uuid,
    #[schema(ignore)]
    pub restaurant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// ---
// NPS
// ---

/// %promotores (9-10) menos %detratores (0-6), arredondado a 2 casas.
pub fn nps_score(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let total = scores.len() as f64;
    let promoters = scores.iter().filter(|s| **s >= 9).count() as f64;
    let detractors = scores.iter().filter(|s| **s <= 6).count() as f64;
    let score = (promoters - detractors) / total * 100.0;
    Some((score * 100.0).round() / 100.0)
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTypeCount {
    pub question_type: QuestionType,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnalytics {
    pub total_responses: i64,
    pub total_answers: i64,
    pub answers_by_type: Vec<QuestionTypeCount>,
    pub nps_score: Option<f64>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCount {
    pub value: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDistribution {
    pub question: Question,
    pub total_answers: i64,
    pub distribution: Vec<AnswerCount>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    #[validate(length(min = 1, max = 500, message = "O texto da pergunta é obrigatório."))]
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default = "default_required")]
    pub is_required: bool,
    pub order_index: Option<i32>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyPayload {
    #[validate(length(min = 2, max = 150, message = "O título deve ter entre 2 e 150 caracteres."))]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<SurveyStatus>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSurveyPayload {
    #[validate(length(min = 2, max = 150, message = "O título deve ter entre 2 e 150 caracteres."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<SurveyStatus>,
    // Quando presente, substitui todas as perguntas
    #[validate(nested)]
    pub questions: Option<Vec<QuestionPayload>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub question_id: Uuid,
    pub value: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSurveyPayload {
    pub customer_id: Option<Uuid>,
    pub answers: Vec<AnswerPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(question_type: QuestionType, options: Value) -> Question {
        Question {
            id: Uuid::new_v4(),
            survey_id: Uuid::new_v4(),
            question_text: "?".into(),
            question_type,
            options,
            is_required: true,
            order_index: 0,
        }
    }

    #[test]
    fn nps_answer_range() {
        let q = question(QuestionType::Nps, json!([]));
        assert_eq!(q.normalize_answer("0"), Ok("0".into()));
        assert_eq!(q.normalize_answer(" 10 "), Ok("10".into()));
        assert_eq!(q.normalize_answer("11"), Err("survey.invalid_nps"));
        assert_eq!(q.normalize_answer("dez"), Err("survey.invalid_nps"));
    }

    #[test]
    fn rating_answer_range() {
        let q = question(QuestionType::Rating, json!([]));
        assert!(q.normalize_answer("1").is_ok());
        assert!(q.normalize_answer("5").is_ok());
        assert_eq!(q.normalize_answer("0"), Err("survey.invalid_rating"));
        assert_eq!(q.normalize_answer("6"), Err("survey.invalid_rating"));
    }

    #[test]
    fn multiple_choice_must_match_option() {
        let q = question(QuestionType::MultipleChoice, json!(["Ótimo", "Bom", "Ruim"]));
        assert_eq!(q.normalize_answer("Bom"), Ok("Bom".into()));
        assert_eq!(q.normalize_answer("Péssimo"), Err("survey.invalid_option"));
    }

    #[test]
    fn yes_no_is_normalized() {
        let q = question(QuestionType::YesNo, json!([]));
        assert_eq!(q.normalize_answer("Sim"), Ok("yes".into()));
        assert_eq!(q.normalize_answer("não"), Ok("no".into()));
        assert!(q.normalize_answer("talvez").is_err());
    }

    #[test]
    fn nps_score_math() {
        assert_eq!(nps_score(&[]), None);
        // 2 promotores, 1 neutro, 1 detrator de 4
        assert_eq!(nps_score(&[10, 9, 8, 3]), Some(25.0));
        assert_eq!(nps_score(&[0, 1, 2]), Some(-100.0));
        assert_eq!(nps_score(&[9, 10]), Some(100.0));
        assert_eq!(nps_score(&[9, 7, 6]), Some(0.0));
    }
}

// src/services/survey_service.rs

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, RestaurantRepository, SurveyRepository},
    models::{
        restaurant::Restaurant,
        survey::{
            nps_score, AnswerPayload, CreateSurveyPayload, Question, QuestionDistribution, QuestionPayload,
            QuestionType, Survey, SurveyAnalytics, SurveyResponse, SurveyStatus, SurveyWithQuestions,
            UpdateSurveyPayload,
        },
    },
};

/// Múltipla escolha precisa de pelo menos duas opções.
pub fn check_questions(questions: &[QuestionPayload]) -> Result<(), AppError> {
    let invalid = questions.iter().any(|q| {
        q.question_type == QuestionType::MultipleChoice
            && q.options.iter().filter(|o| !o.trim().is_empty()).count() < 2
    });

    if invalid {
        return Err(AppError::BadRequest("survey.options_required"));
    }
    Ok(())
}

/// Valida as respostas contra as perguntas da pesquisa; devolve (pergunta, valor normalizado).
pub fn validate_answers(questions: &[Question], answers: &[AnswerPayload]) -> Result<Vec<(Uuid, String)>, AppError> {
    let by_id: HashMap<Uuid, &Question> = questions.iter().map(|q| (q.id, q)).collect();
    let mut answered = HashSet::new();
    let mut normalized = Vec::with_capacity(answers.len());

    for answer in answers {
        let question = by_id
            .get(&answer.question_id)
            .ok_or(AppError::BadRequest("survey.question_not_in_survey"))?;

        // Resposta em branco de pergunta opcional é ignorada
        if answer.value.trim().is_empty() {
            if question.is_required {
                return Err(AppError::BadRequest("survey.required_answer_missing"));
            }
            continue;
        }

        if !answered.insert(question.id) {
            return Err(AppError::BadRequest("survey.duplicate_answer"));
        }

        let value = question.normalize_answer(&answer.value).map_err(AppError::BadRequest)?;
        normalized.push((question.id, value));
    }

    if questions.iter().any(|q| q.is_required && !answered.contains(&q.id)) {
        return Err(AppError::BadRequest("survey.required_answer_missing"));
    }

    Ok(normalized)
}

#[derive(Clone)]
pub struct SurveyService {
    repo: SurveyRepository,
    customer_repo: CustomerRepository,
    restaurant_repo: RestaurantRepository,
}

impl SurveyService {
    pub fn new(repo: SurveyRepository, customer_repo: CustomerRepository, restaurant_repo: RestaurantRepository) -> Self {
        Self {
            repo,
            customer_repo,
            restaurant_repo,
        }
    }

    pub async fn list(&self, restaurant_id: Uuid, status: Option<SurveyStatus>) -> Result<Vec<Survey>, AppError> {
        self.repo.list(restaurant_id, status).await
    }

    pub async fn get(&self, restaurant_id: Uuid, id: Uuid) -> Result<SurveyWithQuestions, AppError> {
        let survey = self
            .repo
            .find_by_id(restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("survey.not_found"))?;
        let questions = self.repo.questions(survey.id).await?;
        Ok(SurveyWithQuestions { survey, questions })
    }

    pub async fn create(&self, restaurant_id: Uuid, actor_id: Uuid, payload: &CreateSurveyPayload) -> Result<SurveyWithQuestions, AppError> {
        check_questions(&payload.questions)?;

        let mut tx = self.repo.pool().begin().await?;

        let survey = self
            .repo
            .create(
                &mut *tx,
                restaurant_id,
                actor_id,
                &payload.title,
                payload.description.as_deref(),
                payload.status.unwrap_or(SurveyStatus::Draft),
            )
            .await?;

        let mut questions = Vec::with_capacity(payload.questions.len());
        for (position, question) in payload.questions.iter().enumerate() {
            let position = question.order_index.unwrap_or(position as i32);
            questions.push(self.repo.insert_question(&mut *tx, survey.id, position, question).await?);
        }

        tx.commit().await?;

        tracing::info!(%restaurant_id, survey_id = %survey.id, questions = questions.len(), "Pesquisa criada");
        Ok(SurveyWithQuestions { survey, questions })
    }

    pub async fn update(&self, restaurant_id: Uuid, id: Uuid, payload: &UpdateSurveyPayload) -> Result<SurveyWithQuestions, AppError> {
        if let Some(questions) = &payload.questions {
            check_questions(questions)?;
        }

        let mut tx = self.repo.pool().begin().await?;

        let survey = self
            .repo
            .update(
                &mut *tx,
                restaurant_id,
                id,
                payload.title.as_deref(),
                payload.description.as_deref(),
                payload.status,
            )
            .await?
            .ok_or(AppError::NotFound("survey.not_found"))?;

        if let Some(new_questions) = &payload.questions {
            self.repo.delete_questions(&mut *tx, survey.id).await?;
            for (position, question) in new_questions.iter().enumerate() {
                let position = question.order_index.unwrap_or(position as i32);
                self.repo.insert_question(&mut *tx, survey.id, position, question).await?;
            }
        }

        tx.commit().await?;

        let questions = self.repo.questions(survey.id).await?;
        Ok(SurveyWithQuestions { survey, questions })
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete(restaurant_id, id).await? {
            0 => Err(AppError::NotFound("survey.not_found")),
            _ => Ok(()),
        }
    }

    // ---
    // Público
    // ---

    async fn active_restaurant_id(&self, slug: &str) -> Result<Uuid, AppError> {
        self.restaurant_repo
            .find_by_slug(slug)
            .await?
            .filter(Restaurant::is_public)
            .map(|r| r.id)
            .ok_or(AppError::NotFound("restaurant.not_found"))
    }

    pub async fn get_public(&self, slug: &str, survey_id: Uuid) -> Result<SurveyWithQuestions, AppError> {
        let restaurant_id = self.active_restaurant_id(slug).await?;
        let survey = self
            .repo
            .find_active_public(restaurant_id, survey_id)
            .await?
            .ok_or(AppError::NotFound("survey.not_found"))?;
        let questions = self.repo.questions(survey.id).await?;
        Ok(SurveyWithQuestions { survey, questions })
    }

    pub async fn submit_public(
        &self,
        slug: &str,
        survey_id: Uuid,
        customer_id: Option<Uuid>,
        answers: &[AnswerPayload],
    ) -> Result<SurveyResponse, AppError> {
        let SurveyWithQuestions { survey, questions } = self.get_public(slug, survey_id).await?;
        let normalized = validate_answers(&questions, answers)?;

        let mut tx = self.repo.pool().begin().await?;

        // Cliente de outro restaurante é tratado como anônimo
        let customer_id = match customer_id {
            Some(id) => self
                .customer_repo
                .find_by_id(&mut *tx, survey.restaurant_id, id)
                .await?
                .map(|c| c.id),
            None => None,
        };

        let response = self
            .repo
            .create_response(&mut *tx, survey.id, survey.restaurant_id, customer_id)
            .await?;

        for (question_id, value) in &normalized {
            self.repo.insert_answer(&mut *tx, response.id, *question_id, value).await?;
        }

        if let Some(id) = customer_id {
            self.customer_repo.increment_survey_responses(&mut *tx, id).await?;
        }

        tx.commit().await?;

        tracing::info!(
            restaurant_id = %survey.restaurant_id,
            survey_id = %survey.id,
            answers = normalized.len(),
            "Resposta de pesquisa registrada"
        );
        Ok(response)
    }

    // ---
    // Analytics
    // ---

    pub async fn analytics(&self, restaurant_id: Uuid, survey_id: Uuid) -> Result<SurveyAnalytics, AppError> {
        let survey = self
            .repo
            .find_by_id(restaurant_id, survey_id)
            .await?
            .ok_or(AppError::NotFound("survey.not_found"))?;

        let total_responses = self.repo.count_responses(survey.id).await?;
        let answers_by_type = self.repo.answers_by_type(survey.id).await?;
        let total_answers = answers_by_type.iter().map(|t| t.count).sum();
        let nps_values = self.repo.nps_values(survey.id).await?;

        Ok(SurveyAnalytics {
            total_responses,
            total_answers,
            answers_by_type,
            nps_score: nps_score(&nps_values),
        })
    }

    pub async fn distribution(&self, restaurant_id: Uuid, survey_id: Uuid, question_id: Uuid) -> Result<QuestionDistribution, AppError> {
        let SurveyWithQuestions { questions, .. } = self.get(restaurant_id, survey_id).await?;

        let question = questions
            .into_iter()
            .find(|q| q.id == question_id)
            .ok_or(AppError::NotFound("survey.question_not_found"))?;

        let distribution = self.repo.distribution(question.id).await?;
        let total_answers = distribution.iter().map(|a| a.count).sum();

        Ok(QuestionDistribution {
            question,
            total_answers,
            distribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(question_type: QuestionType, is_required: bool) -> Question {
        Question {
            id: Uuid::new_v4(),
            survey_id: Uuid::new_v4(),
            question_text: "?".into(),
            question_type,
            options: json!(["Bom", "Ruim"]),
            is_required,
            order_index: 0,
        }
    }

    fn answer(question: &Question, value: &str) -> AnswerPayload {
        AnswerPayload {
            question_id: question.id,
            value: value.into(),
        }
    }

    #[test]
    fn valid_submission_is_normalized() {
        let nps = question(QuestionType::Nps, true);
        let yes_no = question(QuestionType::YesNo, false);
        let result = validate_answers(&[nps.clone(), yes_no.clone()], &[answer(&nps, " 9 "), answer(&yes_no, "Sim")]).unwrap();
        assert_eq!(result, vec![(nps.id, "9".to_string()), (yes_no.id, "yes".to_string())]);
    }

    #[test]
    fn missing_required_answer_is_rejected() {
        let nps = question(QuestionType::Nps, true);
        let text = question(QuestionType::Text, false);
        assert!(matches!(
            validate_answers(&[nps.clone(), text.clone()], &[answer(&text, "ótimo")]),
            Err(AppError::BadRequest("survey.required_answer_missing"))
        ));
        assert!(matches!(
            validate_answers(&[nps.clone()], &[answer(&nps, "  ")]),
            Err(AppError::BadRequest("survey.required_answer_missing"))
        ));
    }

    #[test]
    fn optional_blank_answer_is_skipped() {
        let text = question(QuestionType::Text, false);
        assert!(validate_answers(&[text.clone()], &[answer(&text, "")]).unwrap().is_empty());
    }

    #[test]
    fn foreign_question_is_rejected() {
        let nps = question(QuestionType::Nps, false);
        let other = question(QuestionType::Nps, false);
        assert!(matches!(
            validate_answers(&[nps], &[answer(&other, "5")]),
            Err(AppError::BadRequest("survey.question_not_in_survey"))
        ));
    }

    #[test]
    fn invalid_values_use_question_error() {
        let rating = question(QuestionType::Rating, true);
        let choice = question(QuestionType::MultipleChoice, true);
        assert!(matches!(
            validate_answers(&[rating.clone()], &[answer(&rating, "7")]),
            Err(AppError::BadRequest("survey.invalid_rating"))
        ));
        assert!(matches!(
            validate_answers(&[choice.clone()], &[answer(&choice, "Médio")]),
            Err(AppError::BadRequest("survey.invalid_option"))
        ));
    }

    #[test]
    fn multiple_choice_needs_two_options() {
        let payload = |options: Vec<&str>| QuestionPayload {
            question_text: "Como foi?".into(),
            question_type: QuestionType::MultipleChoice,
            options: options.into_iter().map(Into::into).collect(),
            is_required: true,
            order_index: None,
        };
        assert!(check_questions(&[payload(vec!["Bom", "Ruim"])]).is_ok());
        assert!(matches!(
            check_questions(&[payload(vec!["Bom", " "])]),
            Err(AppError::BadRequest("survey.options_required"))
        ));
    }
}

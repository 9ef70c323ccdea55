// src/common/error.rs

use std::collections::HashMap;
use std::sync::LazyLock;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::{I18nStore, Locale, DEFAULT_LANGUAGE};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// As variantes "genéricas" carregam a chave da mensagem (ex: "checkin.not_found"),
// que é traduzida pelo I18nStore conforme o Accept-Language.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida: {0}")]
    BadRequest(&'static str),

    #[error("Não autorizado: {0}")]
    Unauthorized(&'static str),

    #[error("Pagamento necessário: {0}")]
    PaymentRequired(&'static str),

    #[error("Acesso negado: {0}")]
    Forbidden(&'static str),

    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Conflito: {0}")]
    Conflict(&'static str),

    #[error("Muitas requisições, tente novamente em {retry_after}s")]
    TooManyRequests { retry_after: u64 },

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Conta desativada")]
    AccountDisabled,

    #[error("Conta bloqueada temporariamente")]
    AccountLocked,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_)
            | AppError::InvalidCredentials
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::Forbidden(_) | AppError::AccountDisabled | AppError::AccountLocked => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::FontNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave da mensagem no catálogo de traduções.
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "error.validation",
            AppError::BadRequest(key)
            | AppError::Unauthorized(key)
            | AppError::PaymentRequired(key)
            | AppError::Forbidden(key)
            | AppError::NotFound(key)
            | AppError::Conflict(key) => key,
            AppError::TooManyRequests { .. } => "error.too_many_requests",
            AppError::EmailAlreadyExists => "auth.email_already_exists",
            AppError::InvalidCredentials => "auth.invalid_credentials",
            AppError::InvalidToken => "auth.invalid_token",
            AppError::UserNotFound => "auth.user_not_found",
            AppError::AccountDisabled => "auth.account_disabled",
            AppError::AccountLocked => "auth.account_locked",
            AppError::FontNotFound(_) => "label.font_not_found",
            _ => "error.internal",
        }
    }

    /// Converte o erro de domínio no erro HTTP já traduzido.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();

        // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
        if status.is_server_error() {
            tracing::error!(error = %self, "Erro Interno do Servidor");
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::TooManyRequests { retry_after } => Some(json!({ "retryAfter": retry_after })),
            _ => None,
        };

        ApiError {
            status,
            error: store.translate(&locale.0, self.message_key()),
            details,
        }
    }
}

static DEFAULT_STORE: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

// Usado pelos middlewares, que não têm o Locale em mãos.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let locale = Locale(DEFAULT_LANGUAGE.to_string());
        self.to_api_error(&locale, &DEFAULT_STORE).into_response()
    }
}

// O erro "pronto para o cliente": status + mensagem traduzida + detalhes opcionais.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retry_after = self
            .details
            .as_ref()
            .and_then(|d| d.get("retryAfter"))
            .and_then(Value::as_u64);

        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };

        let mut response = (self.status, Json(body)).into_response();

        if self.status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(secs) = retry_after {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(lang: &str) -> Locale {
        Locale(lang.to_string())
    }

    #[test]
    fn maps_domain_errors_to_http_status() {
        assert_eq!(AppError::NotFound("checkin.not_found").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("permission.denied").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::PaymentRequired("permission.feature_locked").status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(AppError::BadRequest("checkin.already_active").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmailAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::TooManyRequests { retry_after: 10 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("length");
        err.message = Some("O nome é obrigatório.".into());
        errors.add("name", err);

        let store = I18nStore::new();
        let api_error = AppError::ValidationError(errors).to_api_error(&locale("pt"), &store);

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        let details = api_error.details.expect("details");
        assert_eq!(details["name"][0], "O nome é obrigatório.");
    }

    #[test]
    fn translates_messages_by_locale() {
        let store = I18nStore::new();
        let pt = AppError::InvalidCredentials.to_api_error(&locale("pt"), &store);
        let en = AppError::InvalidCredentials.to_api_error(&locale("en"), &store);

        assert_eq!(pt.error, "Credenciais inválidas.");
        assert_eq!(en.error, "Invalid credentials.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::new();
        let api_error = AppError::InternalServerError(anyhow::anyhow!("falha secreta"))
            .to_api_error(&locale("pt"), &store);

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_error.error.contains("secreta"));
    }

    #[test]
    fn too_many_requests_sets_retry_after_header() {
        let response = AppError::TooManyRequests { retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}

// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{iam::PermissionSnapshot, restaurant::UserRestaurant};

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "Maria Souza")]
    pub name: String,

    #[schema(example = "maria@restaurante.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "(11) 98888-7777")]
    pub phone: Option<String>,

    pub avatar: Option<String>,

    pub is_active: bool,
    pub is_superadmin: bool,
    pub email_verified: bool,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub login_attempts: i32,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub locked_until: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_changed_at: Option<DateTime<Utc>>,

    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Bloqueio vencido: o contador de tentativas precisa recomeçar do zero.
    pub fn lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until <= now)
    }

    /// Tokens emitidos antes da última troca de senha deixam de valer.
    pub fn token_predates_password_change(&self, issued_at: usize) -> bool {
        self.password_changed_at
            .is_some_and(|changed| (issued_at as i64) < changed.timestamp())
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    #[schema(example = "Maria Souza")]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "maria@restaurante.com")]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    #[schema(example = "senha123")]
    pub password: String,

    pub phone: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "maria@restaurante.com")]
    pub email: String,

    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    #[schema(example = "senha123")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "A senha atual é obrigatória."))]
    pub current_password: String,

    #[validate(length(min = 6, message = "A nova senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Resposta do login: token + contexto inicial do painel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub restaurants: Vec<UserRestaurant>,
    pub restaurant: Option<UserRestaurant>,
    #[schema(value_type = Option<Object>)]
    pub permission_snapshot: Option<PermissionSnapshot>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: User,
    pub restaurants: Vec<UserRestaurant>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Maria".into(),
            email: "maria@restaurante.com".into(),
            password_hash: "hash".into(),
            phone: None,
            avatar: None,
            is_active: true,
            is_superadmin: false,
            email_verified: false,
            login_attempts: 0,
            locked_until: None,
            password_changed_at: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn lock_state_follows_the_clock() {
        let now = Utc::now();
        let mut u = user();
        assert!(!u.is_locked(now));
        assert!(!u.lock_expired(now));

        u.login_attempts = 5;
        u.locked_until = Some(now + Duration::minutes(10));
        assert!(u.is_locked(now));
        assert!(!u.lock_expired(now));

        // Depois do prazo, o bloqueio some e as tentativas antigas devem ser zeradas
        let later = now + Duration::minutes(11);
        assert!(!u.is_locked(later));
        assert!(u.lock_expired(later));
    }

    #[test]
    fn tokens_issued_before_a_password_change_are_stale() {
        let changed = Utc::now();
        let mut u = user();
        let before = (changed - Duration::hours(1)).timestamp() as usize;
        let after = (changed + Duration::seconds(5)).timestamp() as usize;

        assert!(!u.token_predates_password_change(before));

        u.password_changed_at = Some(changed);
        assert!(u.token_predates_password_change(before));
        assert!(!u.token_predates_password_change(after));
        assert!(!u.token_predates_password_change(changed.timestamp() as usize));
    }
}

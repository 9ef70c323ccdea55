// src/services/auth.rs

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RestaurantRepository, UserRepository},
    models::{
        auth::{Claims, LoginResponse, MeResponse, UpdateProfilePayload, User},
        restaurant::UserRestaurant,
    },
    services::{audit_service::AuditService, iam_service::IamService},
};

// Tokens revogados no logout, guardados até a expiração (exp em segundos)
type TokenBlacklist = Arc<RwLock<HashMap<String, usize>>>;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    restaurant_repo: RestaurantRepository,
    iam_service: IamService,
    audit: AuditService,
    jwt_secret: String,
    jwt_expires_hours: i64,
    blacklist: TokenBlacklist,
}

/// Restaurante principal: o primeiro do qual é dono, senão o primeiro vínculo.
pub fn primary_restaurant(restaurants: &[UserRestaurant]) -> Option<&UserRestaurant> {
    restaurants
        .iter()
        .find(|r| r.is_owner)
        .or_else(|| restaurants.first())
}

pub(crate) async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação: {}", e))??;
    Ok(is_valid)
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        restaurant_repo: RestaurantRepository,
        iam_service: IamService,
        audit: AuditService,
        jwt_secret: String,
        jwt_expires_hours: i64,
    ) -> Self {
        Self {
            user_repo,
            restaurant_repo,
            iam_service,
            audit,
            jwt_secret,
            jwt_expires_hours,
            blacklist: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<String, AppError> {
        let hashed_password = hash_password(password).await?;

        let new_user = self
            .user_repo
            .create_user(self.user_repo.pool(), name, email, &hashed_password, phone)
            .await?;

        tracing::info!(user_id = %new_user.id, "Novo usuário registrado");
        self.create_token(new_user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let now = Utc::now();
        if user.is_locked(now) {
            return Err(AppError::AccountLocked);
        }
        if user.lock_expired(now) {
            self.user_repo.clear_expired_lock(user.id).await?;
        }

        if !verify_password(password, &user.password_hash).await? {
            self.user_repo.register_failed_login(user.id).await?;
            tracing::warn!(user_id = %user.id, "Tentativa de login com senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        self.user_repo.register_successful_login(user.id).await?;

        let token = self.create_token(user.id)?;
        let restaurants = self.restaurant_repo.list_for_user(user.id).await?;
        let restaurant = primary_restaurant(&restaurants).cloned();

        // O snapshot é opcional no login: sem restaurante ou com falha, o painel busca depois
        let permission_snapshot = match &restaurant {
            Some(r) => match self.iam_service.get_snapshot(r.id, user.id).await {
                Ok(snapshot) => Some((*snapshot).clone()),
                Err(e) => {
                    tracing::warn!(error = %e, restaurant_id = %r.id, "Snapshot indisponível no login");
                    None
                }
            },
            None => None,
        };

        self.audit
            .record(
                Some(user.id),
                restaurant.as_ref().map(|r| r.id),
                "auth.login",
                "users",
                json!({ "email": user.email }),
            )
            .await;

        Ok(LoginResponse {
            token,
            user,
            restaurants,
            restaurant,
            permission_snapshot,
        })
    }

    pub async fn me(&self, user: User) -> Result<MeResponse, AppError> {
        let restaurants = self.restaurant_repo.list_for_user(user.id).await?;
        Ok(MeResponse { user, restaurants })
    }

    pub async fn update_profile(&self, user_id: Uuid, payload: &UpdateProfilePayload) -> Result<User, AppError> {
        self.user_repo
            .update_profile(
                user_id,
                payload.name.as_deref(),
                payload.phone.as_deref(),
                payload.avatar.as_deref(),
            )
            .await
    }

    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<String, AppError> {
        if !verify_password(current_password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let hashed = hash_password(new_password).await?;
        self.user_repo.update_password(user.id, &hashed).await?;

        tracing::info!(user_id = %user.id, "Senha alterada; tokens anteriores invalidados");
        self.create_token(user.id)
    }

    // ---
    // Tokens
    // ---

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.jwt_expires_hours);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    pub fn revoke_token(&self, token: &str, exp: usize) {
        let now = Utc::now().timestamp() as usize;
        let mut blacklist = self.blacklist.write().unwrap_or_else(PoisonError::into_inner);
        blacklist.retain(|_, expires| *expires > now);
        blacklist.insert(token.to_owned(), exp);
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        let blacklist = self.blacklist.read().unwrap_or_else(PoisonError::into_inner);
        blacklist.contains_key(token)
    }

    /// Valida o token e carrega o usuário; usado pelo `auth_guard`.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        if self.is_revoked(token) {
            return Err(AppError::Unauthorized("auth.token_revoked"));
        }

        let claims = self.decode_token(token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if user.token_predates_password_change(claims.iat) {
            return Err(AppError::Unauthorized("auth.token_revoked"));
        }

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::restaurant::RestaurantStatus;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    fn service() -> AuthService {
        let pool = PgPoolOptions::new().connect_lazy_with(PgConnectOptions::new());
        let audit = AuditService::new(crate::db::AuditRepository::new(pool.clone()));
        let user_repo = UserRepository::new(pool.clone());
        let restaurant_repo = RestaurantRepository::new(pool.clone());
        let iam = IamService::new(
            crate::db::IamRepository::new(pool.clone()),
            restaurant_repo.clone(),
            user_repo.clone(),
            audit.clone(),
        );
        AuthService::new(user_repo, restaurant_repo, iam, audit, "segredo-de-teste".into(), 24)
    }

    fn restaurant(name: &str, is_owner: bool) -> UserRestaurant {
        UserRestaurant {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: name.to_lowercase(),
            status: RestaurantStatus::Active,
            is_owner,
        }
    }

    #[test]
    fn primary_restaurant_prefers_owned() {
        let list = vec![restaurant("Filial", false), restaurant("Matriz", true)];
        assert_eq!(primary_restaurant(&list).unwrap().name, "Matriz");

        let list = vec![restaurant("Filial", false), restaurant("Outra", false)];
        assert_eq!(primary_restaurant(&list).unwrap().name, "Filial");

        assert!(primary_restaurant(&[]).is_none());
    }

    #[tokio::test]
    async fn token_roundtrip_keeps_subject() {
        let service = service();
        let user_id = Uuid::new_v4();

        let token = service.create_token(user_id).unwrap();
        let claims = service.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let service = service();
        assert!(matches!(service.decode_token("nao.e.jwt"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_before_lookup() {
        let service = service();
        let token = service.create_token(Uuid::new_v4()).unwrap();
        let claims = service.decode_token(&token).unwrap();

        service.revoke_token(&token, claims.exp);

        assert!(service.is_revoked(&token));
        assert!(matches!(
            service.validate_token(&token).await,
            Err(AppError::Unauthorized("auth.token_revoked"))
        ));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("senha123").await.unwrap();
        assert!(verify_password("senha123", &hashed).await.unwrap());
        assert!(!verify_password("outra", &hashed).await.unwrap());
    }
}

// src/config.rs

use std::{env, fmt::Display, fs::read_to_string, net::IpAddr, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

use crate::{
    db::{
        AuditRepository, CashRegisterRepository, CheckinRepository, CouponRepository,
        CustomerRepository, FinancialRepository, IamRepository, LabelRepository,
        FeedbackRepository, ProductRepository, QrCodeRepository, RestaurantRepository,
        RewardRepository, StockRepository, SurveyRepository, UserRepository, WaiterCallRepository,
    },
    middleware::i18n::I18nStore,
    services::{
        audit_service::AuditService, auth::AuthService,
        cash_register_service::CashRegisterService, checkin_service::CheckinService,
        coupon_service::CouponService, customer_service::CustomerService,
        feedback_service::FeedbackService, financial_service::FinancialService, iam_service::IamService,
        label_service::LabelService, product_service::ProductService,
        qr_code_service::QrCodeService, rate_limiter::{RateLimitConfig, RateLimiter},
        restaurant_service::RestaurantService, reward_service::RewardService,
        stock_service::StockService, survey_service::SurveyService,
        waiter_call_service::WaiterCallService,
    },
};

const DEFAULT_PUBLIC_APP_URL: &str = "http://localhost:5173";

// ---
// Configuração lida do ambiente (.env / Docker secrets)
// ---
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_options: PgConnectOptions,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    pub frontend_url: Option<String>,
    // Base das URLs impressas nos QR codes de mesa
    pub public_app_url: String,
    pub port: u16,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    // Proxies cujo X-Forwarded-For é aceito
    pub trusted_proxies: Vec<IpAddr>,
    pub fonts_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_options = match lookup("DATABASE_URL") {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .context("DATABASE_URL inválida")?,
            None => {
                let mut options = PgConnectOptions::new()
                    .host(&lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string()))
                    .port(try_load(&lookup, "DB_PORT", 5432)?)
                    .username(&lookup("DB_USER").unwrap_or_else(|| "postgres".to_string()))
                    .database(&lookup("DB_NAME").unwrap_or_else(|| "restaurante".to_string()));

                if let Some(password) = read_secret(&lookup, "DB_PASSWORD")? {
                    options = options.password(&password);
                }
                options
            }
        };

        let frontend_url = lookup("FRONTEND_URL").filter(|s| !s.is_empty());
        let public_app_url = lookup("PUBLIC_APP_URL")
            .filter(|s| !s.is_empty())
            .or_else(|| frontend_url.clone())
            .unwrap_or_else(|| DEFAULT_PUBLIC_APP_URL.to_string());

        let jwt_secret = read_secret(&lookup, "JWT_SECRET")?
            .filter(|s| !s.is_empty())
            .context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            db_options,
            db_max_connections: try_load(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_expires_hours: try_load(&lookup, "JWT_EXPIRES_HOURS", 24 * 7)?,
            frontend_url,
            public_app_url,
            port: try_load(&lookup, "PORT", 3000)?,
            rate_limit_max_requests: try_load(&lookup, "RATE_LIMIT_MAX_REQUESTS", 100)?,
            rate_limit_window_secs: try_load(&lookup, "RATE_LIMIT_WINDOW_SECS", 15 * 60)?,
            trusted_proxies: parse_ip_list(lookup("TRUSTED_PROXIES").as_deref().unwrap_or_default())?,
            fonts_dir: lookup("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Valor inválido para {key}: {e}")),
        None => {
            tracing::debug!("{key} não definido, usando padrão: {default}");
            Ok(default)
        }
    }
}

fn parse_ip_list(raw: &str) -> anyhow::Result<Vec<IpAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(|ip| {
            ip.parse::<IpAddr>()
                .map_err(|e| anyhow::anyhow!("Valor inválido para TRUSTED_PROXIES ({ip}): {e}"))
        })
        .collect()
}

// `<KEY>_FILE` tem prioridade (Docker secrets); senão usa `<KEY>` direto.
fn read_secret<F>(lookup: &F, key: &str) -> anyhow::Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(&format!("{key}_FILE")) {
        let secret = read_to_string(&path)
            .with_context(|| format!("Falha ao ler {key}_FILE em {path}"))?;
        return Ok(Some(secret.trim().to_string()));
    }
    Ok(lookup(key))
}

// ---
// Estado compartilhado da aplicação
// ---
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,
    pub rate_limiter: Arc<RateLimiter>,

    pub auth_service: AuthService,
    pub iam_service: IamService,
    pub restaurant_service: RestaurantService,
    pub customer_service: CustomerService,
    pub checkin_service: CheckinService,
    pub product_service: ProductService,
    pub stock_service: StockService,
    pub label_service: LabelService,
    pub reward_service: RewardService,
    pub coupon_service: CouponService,
    pub survey_service: SurveyService,
    pub financial_service: FinancialService,
    pub cash_register_service: CashRegisterService,
    pub waiter_call_service: WaiterCallService,
    pub feedback_service: FeedbackService,
    pub qr_code_service: QrCodeService,
    pub audit_service: AuditService,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, a aplicação não inicia.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = AppConfig::from_env()?;

        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(config.db_options.clone())
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::build(config, db_pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn build(config: AppConfig, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let restaurant_repo = RestaurantRepository::new(db_pool.clone());
        let iam_repo = IamRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let checkin_repo = CheckinRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let stock_repo = StockRepository::new(db_pool.clone());
        let label_repo = LabelRepository::new(db_pool.clone());
        let reward_repo = RewardRepository::new(db_pool.clone());
        let coupon_repo = CouponRepository::new(db_pool.clone());
        let survey_repo = SurveyRepository::new(db_pool.clone());
        let financial_repo = FinancialRepository::new(db_pool.clone());
        let cash_register_repo = CashRegisterRepository::new(db_pool.clone());
        let waiter_call_repo = WaiterCallRepository::new(db_pool.clone());
        let feedback_repo = FeedbackRepository::new(db_pool.clone());
        let qr_code_repo = QrCodeRepository::new(db_pool.clone());

        let audit_service = AuditService::new(audit_repo);
        let iam_service = IamService::new(
            iam_repo.clone(),
            restaurant_repo.clone(),
            user_repo.clone(),
            audit_service.clone(),
        );
        let auth_service = AuthService::new(
            user_repo.clone(),
            restaurant_repo.clone(),
            iam_service.clone(),
            audit_service.clone(),
            config.jwt_secret.clone(),
            config.jwt_expires_hours,
        );
        let restaurant_service = RestaurantService::new(
            restaurant_repo.clone(),
            user_repo.clone(),
            iam_repo.clone(),
            iam_service.clone(),
        );
        let customer_service = CustomerService::new(customer_repo.clone(), audit_service.clone());
        let reward_service = RewardService::new(
            reward_repo.clone(),
            coupon_repo.clone(),
            customer_repo.clone(),
            restaurant_repo.clone(),
        );
        let coupon_service = CouponService::new(
            coupon_repo.clone(),
            reward_repo.clone(),
            restaurant_repo.clone(),
            reward_service.clone(),
            audit_service.clone(),
        );
        let checkin_service = CheckinService::new(
            checkin_repo,
            customer_repo.clone(),
            restaurant_repo.clone(),
            coupon_repo.clone(),
            reward_repo.clone(),
            reward_service.clone(),
            iam_service.clone(),
            audit_service.clone(),
        );
        let product_service = ProductService::new(product_repo.clone());
        let stock_service = StockService::new(stock_repo, product_repo.clone());
        let label_service = LabelService::new(label_repo, stock_service.clone(), config.fonts_dir.clone());
        let survey_service = SurveyService::new(survey_repo, customer_repo.clone(), restaurant_repo.clone());
        let financial_service = FinancialService::new(financial_repo);
        let cash_register_service = CashRegisterService::new(cash_register_repo);
        let feedback_service = FeedbackService::new(
            feedback_repo.clone(),
            customer_repo,
            restaurant_repo.clone(),
            qr_code_repo.clone(),
        );
        let qr_code_service = QrCodeService::new(
            qr_code_repo,
            restaurant_repo.clone(),
            feedback_repo,
            config.public_app_url.clone(),
        );
        let waiter_call_service = WaiterCallService::new(waiter_call_repo, restaurant_repo);

        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests: config.rate_limit_max_requests,
            window_secs: config.rate_limit_window_secs,
            trusted_proxies: config.trusted_proxies.clone(),
            ..RateLimitConfig::default()
        }));

        Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            rate_limiter,
            auth_service,
            iam_service,
            restaurant_service,
            customer_service,
            checkin_service,
            product_service,
            stock_service,
            label_service,
            reward_service,
            coupon_service,
            survey_service,
            financial_service,
            cash_register_service,
            waiter_call_service,
            feedback_service,
            qr_code_service,
            audit_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn composes_connection_from_db_parts() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "db"),
            ("DB_PORT", "6543"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", "restaurantes"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.db_options.get_host(), "db");
        assert_eq!(config.db_options.get_port(), 6543);
        assert_eq!(config.db_options.get_username(), "app");
        assert_eq!(config.db_options.get_database(), Some("restaurantes"));
        assert_eq!(config.port, 3000);
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.rate_limit_window_secs, 900);
        assert!(config.trusted_proxies.is_empty());
        assert!(config.frontend_url.is_none());
        assert_eq!(config.public_app_url, DEFAULT_PUBLIC_APP_URL);
    }

    #[test]
    fn password_file_wins_over_plain_variable() {
        let path = std::env::temp_dir().join(format!("db_password_{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, "do-arquivo\n").unwrap();
        let path_str = path.to_string_lossy().to_string();

        let lookup = lookup_from(&[("DB_PASSWORD", "da-variavel"), ("DB_PASSWORD_FILE", path_str.as_str())]);
        let secret = read_secret(&lookup, "DB_PASSWORD").unwrap();

        assert_eq!(secret.as_deref(), Some("do-arquivo"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("DB_HOST", "db")]));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "segredo"),
            ("PORT", "porta"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn database_url_takes_precedence() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://u:p@pg.local:5433/app"),
            ("DB_HOST", "ignorado"),
            ("JWT_SECRET", "segredo"),
            ("FRONTEND_URL", "http://localhost:5173"),
        ]))
        .unwrap();

        assert_eq!(config.db_options.get_host(), "pg.local");
        assert_eq!(config.db_options.get_port(), 5433);
        assert_eq!(config.frontend_url.as_deref(), Some("http://localhost:5173"));
        assert_eq!(config.public_app_url, "http://localhost:5173");
    }

    #[test]
    fn public_app_url_overrides_frontend_url() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "segredo"),
            ("FRONTEND_URL", "http://painel.local"),
            ("PUBLIC_APP_URL", "https://cardapio.exemplo.com"),
        ]))
        .unwrap();
        assert_eq!(config.public_app_url, "https://cardapio.exemplo.com");
    }

    #[test]
    fn trusted_proxies_are_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "segredo"),
            ("TRUSTED_PROXIES", "10.0.0.1, ::1"),
        ]))
        .unwrap();
        assert_eq!(config.trusted_proxies.len(), 2);
        assert!(config.trusted_proxies.contains(&"10.0.0.1".parse().unwrap()));

        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "segredo"),
            ("TRUSTED_PROXIES", "proxy.local"),
        ]));
        assert!(result.is_err());
    }
}

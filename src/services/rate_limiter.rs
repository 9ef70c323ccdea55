// src/services/rate_limiter.rs

//! Limitador de requisições em memória (janela deslizante).
//!
//! A chave é o ID do usuário nas rotas autenticadas e o IP de origem nas rotas
//! públicas. O número de chaves rastreadas tem um teto rígido: quando ele é
//! atingido, uma limpeza é forçada e, se ainda não houver espaço, a chave com a
//! requisição mais antiga é descartada para abrir vaga.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::common::error::AppError;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Máximo de requisições permitidas na janela.
    pub max_requests: usize,
    /// Tamanho da janela em segundos.
    pub window_secs: u64,
    /// A limpeza roda a cada N requisições.
    pub cleanup_interval: u64,
    /// Teto de chaves distintas em memória.
    pub max_tracked_keys: usize,
    /// Proxies cujo `X-Forwarded-For` é confiável.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            // 100 requisições a cada 15 minutos por usuário/IP
            max_requests: 100,
            window_secs: 15 * 60,
            cleanup_interval: 100,
            max_tracked_keys: 10_000,
            trusted_proxies: Vec::new(),
        }
    }
}

pub struct RateLimiter {
    config: RateLimitConfig,
    state: RwLock<HashMap<String, Vec<Instant>>>,
    request_count: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: RwLock::new(HashMap::new()),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn is_trusted_proxy(&self, ip: IpAddr) -> bool {
        self.config.trusted_proxies.contains(&ip)
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_secs)
    }

    /// Registra a requisição se permitida; senão devolve `TooManyRequests` com o tempo de espera.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), AppError> {
        let window = self.window();
        let cutoff = now.checked_sub(window).unwrap_or(now);

        let count = self.request_count.fetch_add(1, Ordering::Relaxed);
        if count > 0 && self.config.cleanup_interval > 0 && count % self.config.cleanup_interval == 0 {
            tracing::debug!(request_count = count, "limpeza periódica do rate limiter");
            self.cleanup_at(now);
        }

        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if !state.contains_key(key) && state.len() >= self.config.max_tracked_keys {
            state.retain(|_, timestamps| timestamps.iter().any(|&t| t > cutoff));

            while state.len() >= self.config.max_tracked_keys {
                let stalest = state
                    .iter()
                    .min_by_key(|(_, timestamps)| timestamps.last().copied())
                    .map(|(k, _)| k.clone());

                let Some(stalest) = stalest else { break };
                tracing::debug!(evicted = %stalest, "limite de chaves rastreadas atingido, descartando a mais antiga");
                state.remove(&stalest);
            }
        }

        let timestamps = state.entry(key.to_string()).or_default();
        timestamps.retain(|&t| t > cutoff);

        if timestamps.len() >= self.config.max_requests {
            // O mais antigo dentro da janela define quando a próxima requisição passa
            let retry_after = timestamps
                .first()
                .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
                .map(|d| d.as_secs().max(1))
                .unwrap_or(self.config.window_secs);

            tracing::warn!(key, requests = timestamps.len(), max = self.config.max_requests, "rate limit excedido");
            return Err(AppError::TooManyRequests { retry_after });
        }

        timestamps.push(now);
        Ok(())
    }

    /// Remove chaves sem requisições recentes.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&self, now: Instant) {
        let cutoff = now.checked_sub(self.window()).unwrap_or(now);
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        state.retain(|_, timestamps| {
            timestamps.retain(|&t| t > cutoff);
            !timestamps.is_empty()
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: usize, window_secs: u64, max_tracked_keys: usize) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window_secs,
            cleanup_interval: 1_000,
            max_tracked_keys,
            trusted_proxies: Vec::new(),
        })
    }

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = limiter(3, 60, 100);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("user:1", now).is_ok());
        }

        match limiter.check_at("user:1", now) {
            Err(AppError::TooManyRequests { retry_after }) => assert!(retry_after >= 1 && retry_after <= 60),
            other => panic!("esperava TooManyRequests, veio {other:?}"),
        }
    }

    #[test]
    fn keys_are_limited_independently() {
        let limiter = limiter(1, 60, 100);
        let now = Instant::now();

        assert!(limiter.check_at("ip:10.0.0.1", now).is_ok());
        assert!(limiter.check_at("ip:10.0.0.2", now).is_ok());
        assert!(limiter.check_at("ip:10.0.0.1", now).is_err());
    }

    #[test]
    fn window_slides_and_frees_slots() {
        let limiter = limiter(1, 10, 100);
        let start = Instant::now();

        assert!(limiter.check_at("user:1", start).is_ok());
        assert!(limiter.check_at("user:1", start + Duration::from_secs(5)).is_err());
        assert!(limiter.check_at("user:1", start + Duration::from_secs(11)).is_ok());
    }

    #[test]
    fn tracked_keys_are_capped_by_evicting_the_stalest() {
        let limiter = limiter(10, 60, 2);
        let start = Instant::now();

        assert!(limiter.check_at("a", start).is_ok());
        assert!(limiter.check_at("b", start + Duration::from_secs(1)).is_ok());
        assert!(limiter.check_at("c", start + Duration::from_secs(2)).is_ok());
        assert_eq!(limiter.tracked_keys(), 2);

        // "a" foi descartada; "b" e "c" seguem rastreadas
        let state = limiter.state.read().unwrap();
        assert!(!state.contains_key("a"));
        assert!(state.contains_key("b") && state.contains_key("c"));
    }

    #[test]
    fn flood_of_distinct_keys_does_not_lock_out_new_clients() {
        let limiter = limiter(100, 900, 1_000);
        let now = Instant::now();

        for i in 0..10_000 {
            let key = format!("ip:10.{}.{}.{}", i / 65_536, (i / 256) % 256, i % 256);
            assert!(limiter.check_at(&key, now).is_ok());
        }

        assert!(limiter.check_at("ip:203.0.113.9", now).is_ok());
        assert!(limiter.tracked_keys() <= 1_000);
    }

    #[test]
    fn cap_makes_room_after_old_keys_expire() {
        let limiter = limiter(10, 10, 1);
        let start = Instant::now();

        assert!(limiter.check_at("a", start).is_ok());
        assert!(limiter.check_at("b", start + Duration::from_secs(11)).is_ok());
        assert_eq!(limiter.tracked_keys(), 1);
    }
}

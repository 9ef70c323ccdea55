// src/middleware/rate_limit.rs

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{middleware::auth::AuthenticatedUser, services::rate_limiter::RateLimiter};

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Chave do limitador: usuário autenticado, senão IP de origem.
///
/// O `X-Forwarded-For` só é lido quando a conexão vem de um proxy confiável; nesse
/// caso vale o último endereço da cadeia que não seja de outro proxy confiável.
pub fn client_key(request: &Request, is_trusted_proxy: impl Fn(IpAddr) -> bool) -> String {
    if let Some(AuthenticatedUser(user)) = request.extensions().get::<AuthenticatedUser>() {
        return format!("user:{}", user.id);
    }

    let Some(peer) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return "anonymous".to_string();
    };

    if !is_trusted_proxy(peer) {
        return format!("ip:{peer}");
    }

    let forwarded = request
        .headers()
        .get_all(FORWARDED_FOR_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|ip| ip.trim().parse::<IpAddr>().ok())
        .collect::<Vec<_>>();

    let client = forwarded
        .into_iter()
        .rev()
        .find(|ip| !is_trusted_proxy(*ip))
        .unwrap_or(peer);

    format!("ip:{client}")
}

pub async fn rate_limit(State(limiter): State<Arc<RateLimiter>>, request: Request, next: Next) -> Response {
    let key = client_key(&request, |ip| limiter.is_trusted_proxy(ip));

    if let Err(err) = limiter.check(&key) {
        tracing::warn!(%key, path = %request.uri().path(), "Limite de requisições excedido");
        return err.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    const PROXY: [u8; 4] = [10, 0, 0, 1];

    fn from_peer(peer: [u8; 4], forwarded: Option<&str>) -> Request {
        let mut builder = Request::builder();
        if let Some(value) = forwarded {
            builder = builder.header(FORWARDED_FOR_HEADER, value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        request
    }

    fn trusted(ip: IpAddr) -> bool {
        ip == IpAddr::from(PROXY)
    }

    #[test]
    fn forwarded_header_is_ignored_from_untrusted_peers() {
        let request = from_peer([198, 51, 100, 4], Some("203.0.113.7"));
        assert_eq!(client_key(&request, trusted), "ip:198.51.100.4");
    }

    #[test]
    fn trusted_proxy_forwards_the_client_address() {
        let request = from_peer(PROXY, Some("203.0.113.7"));
        assert_eq!(client_key(&request, trusted), "ip:203.0.113.7");
    }

    #[test]
    fn spoofed_entries_before_the_proxy_hop_are_skipped() {
        // O cliente forja "1.2.3.4"; o proxy acrescenta o IP real no final
        let request = from_peer(PROXY, Some("1.2.3.4, 203.0.113.7"));
        assert_eq!(client_key(&request, trusted), "ip:203.0.113.7");

        let request = from_peer(PROXY, Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_key(&request, trusted), "ip:203.0.113.7");
    }

    #[test]
    fn trusted_proxy_without_header_keys_on_the_proxy() {
        let request = from_peer(PROXY, Some("lixo"));
        assert_eq!(client_key(&request, trusted), "ip:10.0.0.1");
    }

    #[test]
    fn key_without_any_source_is_anonymous() {
        let request = Request::builder()
            .header(FORWARDED_FOR_HEADER, "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request, trusted), "anonymous");
    }
}

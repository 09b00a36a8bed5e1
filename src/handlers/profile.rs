use axum::{
    Json,
    extract::{ConnectInfo, Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::error::LookupError;
use crate::models::NormalizedProfile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProfileQuery {
    pub fid: Option<String>,
}

// Rate limit key: the peer address, or the proxy headers when the proxy is trusted
pub fn client_key(headers: &HeaderMap, peer: SocketAddr, trust_proxy_headers: bool) -> String {
    if !trust_proxy_headers {
        return peer.ip().to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

async fn respond(state: &AppState, id: &str, client: &str) -> Result<Json<NormalizedProfile>, LookupError> {
    state.lookup.lookup(id, client).await.map(Json)
}

// GET /api/user?fid=2
pub async fn profile_by_query_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<NormalizedProfile>, LookupError> {
    let client = client_key(&headers, peer, state.trust_proxy_headers);
    respond(&state, query.fid.as_deref().unwrap_or_default(), &client).await
}

// GET /api/users/{id}
pub async fn profile_by_path_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<NormalizedProfile>, LookupError> {
    let client = client_key(&headers, peer, state.trust_proxy_headers);
    respond(&state, &id, &client).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.7:51000".parse().unwrap()
    }

    fn proxied() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.1"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.2"));
        headers
    }

    #[test]
    fn falls_back_to_peer_ip() {
        assert_eq!(client_key(&HeaderMap::new(), peer(), true), "192.0.2.7");
        assert_eq!(client_key(&HeaderMap::new(), peer(), false), "192.0.2.7");
    }

    #[test]
    fn ignores_proxy_headers_unless_trusted() {
        assert_eq!(client_key(&proxied(), peer(), false), "192.0.2.7");
    }

    #[test]
    fn prefers_real_ip_header() {
        assert_eq!(client_key(&proxied(), peer(), true), "203.0.113.1");
    }

    #[test]
    fn uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 198.51.100.2, 10.0.0.1"));
        assert_eq!(client_key(&headers, peer(), true), "198.51.100.2");
    }
}

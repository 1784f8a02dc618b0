//! Security Middleware Module
//!
//! Axum middleware for rate limiting and security headers.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::warn;

use crate::api::app_state::AppState;
use crate::error::AppError;
use crate::security::rate_limit::RateLimitResult;

/// Identify the calling client: proxy headers first, then the peer address
pub fn client_id<B>(req: &axum::http::Request<B>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(ip) = req.headers().get("X-Real-IP").and_then(|h| h.to_str().ok()) {
        return ip.trim().to_string();
    }

    if let Some(ConnectInfo(peer)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return peer.ip().to_string();
    }

    "anonymous".to_string()
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_id(&req);

    match state.rate_limiter.check(&client).await {
        RateLimitResult::Allowed { remaining } => {
            let mut response = next.run(req).await;
            response
                .headers_mut()
                .insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
            response
        }
        RateLimitResult::Limited { retry_after } => {
            warn!(client = %client, retry_after, "Request rate limited");
            state.observability.metrics.record_rate_limited();

            let mut response = AppError::RateLimited
                .into_response_with_details(&format!("retry after {} seconds", retry_after));
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// Security headers middleware
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request() -> axum::http::request::Builder {
        axum::http::Request::builder().uri("/api/otp/send")
    }

    #[test]
    fn test_client_id_prefers_forwarded_for() {
        let req = request()
            .header("X-Forwarded-For", "10.0.0.1, 172.16.0.1")
            .header("X-Real-IP", "192.168.1.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_id(&req), "10.0.0.1");
    }

    #[test]
    fn test_client_id_falls_back() {
        let req = request()
            .header("X-Real-IP", "192.168.1.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_id(&req), "192.168.1.1");

        let mut req = request().body(Body::empty()).unwrap();
        assert_eq!(client_id(&req), "anonymous");

        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_id(&req), "127.0.0.1");
    }
}

//! API 模块
//!
//! 提供 REST API 支持。

pub mod app_state;
pub mod dto;
pub mod extract;
pub mod handlers;
pub mod routes;

use crate::api::app_state::AppState;
use crate::config::config::SecurityConfig;
use crate::observability::metrics_middleware;
use crate::security::middleware::{rate_limit_middleware, security_headers_middleware};
use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(app_state: AppState, security: &SecurityConfig) -> Router {
    // 仅 OTP 接口限流
    let otp = routes::otp_routes::create_otp_router().route_layer(from_fn_with_state(
        app_state.clone(),
        rate_limit_middleware,
    ));

    let api = Router::new()
        .merge(routes::book_routes::create_book_router())
        .merge(routes::account_routes::create_account_router())
        .merge(otp);

    Router::new()
        .nest("/api", api)
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(
            app_state.observability.clone(),
            metrics_middleware,
        ))
        .with_state(app_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

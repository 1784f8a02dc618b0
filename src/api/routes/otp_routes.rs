//! OTP Routes

use crate::api::handlers::otp_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建 OTP 路由器
pub fn create_otp_router() -> Router<AppState> {
    Router::new()
        .route("/otp/send", post(send_otp))
        .route("/otp/verify", post(verify_otp))
}

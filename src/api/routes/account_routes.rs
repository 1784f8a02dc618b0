//! Account Routes

use crate::api::handlers::account_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建账户路由器
pub fn create_account_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_account))
        .route("/users/:username", get(get_account))
}

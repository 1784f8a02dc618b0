use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::{
    api::{app_state::AppState, dto::account_dto::*, extract::AppJson},
    error::AppError,
    security::validation::validators,
};

pub async fn register_account(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    validators::validate_username(&request.username)?;
    validators::validate_email(&request.email)?;

    let account = state
        .accounts
        .register(request.username.trim(), request.email.trim())
        .await?;
    info!("Registered account: {}", account.username);

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .accounts
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account not found: {}", username)))?;

    Ok(Json(AccountResponse::from(account)))
}

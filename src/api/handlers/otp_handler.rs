use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::*, extract::AppJson},
    error::AppError,
    security::validation::validators,
};

/// 健康检查中邮件服务的名称
pub const MAIL_SERVICE: &str = "mail";

pub async fn send_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<SendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("OTP requested for user: {}", request.username);
    validators::validate_username(&request.username)?;
    validators::validate_email(&request.email)?;

    let result = state
        .otp_manager
        .issue(&request.username, &request.email)
        .await;
    state
        .observability
        .observe_upstream(MAIL_SERVICE, &result)
        .await;
    result?;
    state.observability.metrics.record_otp_issued();

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "OTP has successfully been sent to the user.",
        )),
    ))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("OTP verification for user: {}", request.username);

    let result = state
        .otp_manager
        .verify(&request.username, &request.otp)
        .await;
    match &result {
        Ok(()) => state.observability.metrics.record_otp_verification(true),
        Err(AppError::InvalidOtp | AppError::IncorrectOtp) => {
            state.observability.metrics.record_otp_verification(false)
        }
        Err(_) => {}
    }
    result?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User is now verified and can login.")),
    ))
}

//! The password reset flow: request a one-time code, verify it, then set a
//! new password with the short-lived reset token.

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    auth::{encode_reset_token, decode_reset_token},
    error::require_field,
    models::{PasswordHash, UserID},
    stores::{OtpStore, UserStore},
    AppState, Error,
};

/// How long a one-time code stays valid.
pub const OTP_TTL: Duration = Duration::minutes(10);

/// The fields for a password reset request.
#[derive(Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

/// The fields for verifying a one-time code.
#[derive(Deserialize)]
pub struct VerifyOtpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

/// The fields for completing a password reset.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub reset_token: String,
    #[serde(default)]
    pub new_password: String,
}

/// Handler for requesting a password reset code.
///
/// Issues a fresh 6-digit code, replacing any earlier codes for the user,
/// and emails it to them. The code is persisted before the mail is sent, so
/// a mail failure is reported in `emailSent` but never fails the request.
///
/// # Errors
/// Returns [Error::NotFound] if the email is not registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(form): Json<ForgotPasswordForm>,
) -> Result<Response, Error> {
    let email = require_field(&form.email, "email")?;
    let user = state.user_store.get_by_email(email)?;

    let code = rand::thread_rng().gen_range(100_000..=999_999).to_string();
    let expires_at = OffsetDateTime::now_utc() + OTP_TTL;

    state
        .otp_store
        .replace(user.id, &user.email, &code, expires_at)?;

    let email_sent = match state.mailer.send_otp(&user.email, &code) {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!("could not send reset code to {}: {}", user.email, error);
            false
        }
    };

    Ok(Json(json!({
        "success": true,
        "message": "a reset code has been sent to your email",
        "emailSent": email_sent,
    }))
    .into_response())
}

/// Handler for verifying a one-time code.
///
/// On success the code is marked verified and a reset token valid for
/// [RESET_TOKEN_DURATION](crate::auth::RESET_TOKEN_DURATION) is returned.
///
/// # Errors
/// Returns [Error::InvalidOtp] if the code does not match an active request,
/// or [Error::OtpExpired] if it matched but its expiry has passed.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(form): Json<VerifyOtpForm>,
) -> Result<Response, Error> {
    let email = require_field(&form.email, "email")?;
    let code = require_field(&form.otp, "otp")?;

    let user = state.user_store.get_by_email(email)?;
    let now = OffsetDateTime::now_utc();

    let otp = state
        .otp_store
        .find(user.id, code, false)?
        .ok_or(Error::InvalidOtp)?;

    if otp.is_expired(now) {
        state.otp_store.delete(otp.id)?;
        return Err(Error::OtpExpired);
    }

    state.otp_store.mark_verified(otp.id)?;
    state.otp_store.purge_expired(now)?;

    let reset_token = encode_reset_token(user.id, &user.email, &state.jwt_keys)?;

    Ok(Json(json!({
        "success": true,
        "message": "code verified",
        "resetToken": reset_token,
    }))
    .into_response())
}

/// Handler for completing a password reset.
///
/// The reset token alone is not enough: the user must still hold a verified
/// code, which is consumed here so a token cannot be replayed.
///
/// # Errors
/// Returns [Error::InvalidToken] if the reset token is malformed, expired,
/// or has no verified code behind it, [Error::OtpExpired] if the verified
/// code's expiry has passed, or [Error::PasswordTooShort] if the new
/// password is too short.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(form): Json<ResetPasswordForm>,
) -> Result<Response, Error> {
    let token = require_field(&form.reset_token, "resetToken")?;
    require_field(&form.new_password, "newPassword")?;

    let claims = decode_reset_token(token, &state.jwt_keys)?;
    let user_id = UserID::new(claims.user_id);

    let otp = state
        .otp_store
        .find_verified(user_id)?
        .ok_or(Error::InvalidToken)?;

    if otp.is_expired(OffsetDateTime::now_utc()) {
        state.otp_store.delete(otp.id)?;
        return Err(Error::OtpExpired);
    }

    let password_hash =
        PasswordHash::from_raw_password(&form.new_password, PasswordHash::DEFAULT_COST)?;

    state.user_store.set_password(user_id, password_hash)?;
    state.otp_store.delete_for_user(user_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "password has been reset",
    }))
    .into_response())
}

//! Defines the app level error type and its mapping to JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or blank in the request body.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The email address in the request does not parse as an email address.
    #[error("invalid email format")]
    InvalidEmail,

    /// The password does not meet the minimum length requirement.
    #[error("password must be at least 6 characters")]
    PasswordTooShort,

    /// A user already exists with the given email address.
    #[error("a user already exists with this email")]
    DuplicateEmail,

    /// The email/password combination did not match a user.
    ///
    /// The message deliberately does not reveal whether the email or the
    /// password was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A transaction or budget category was given an empty category label.
    #[error("category is required")]
    EmptyCategory,

    /// A transaction amount was zero or negative.
    #[error("amount must be greater than 0")]
    NonPositiveAmount,

    /// A budget allocation amount was negative.
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    /// The transaction type was neither `expense` nor `income`.
    #[error("type must be either 'expense' or 'income'")]
    InvalidTransactionType,

    /// The report period was not one of day, week, month or year.
    #[error("invalid report period \"{0}\"")]
    InvalidPeriod(String),

    /// A date range had its end before its start, or a comparison request
    /// was missing one of its period boundaries.
    #[error("invalid date range")]
    InvalidDateRange,

    /// The one-time code did not match an active password reset request.
    #[error("invalid OTP")]
    InvalidOtp,

    /// The one-time code matched but its expiry has passed.
    #[error("OTP has expired, please request a new one")]
    OtpExpired,

    /// Tried to delete a profile picture for a user that has none.
    #[error("no profile picture to delete")]
    NoAvatar,

    /// The uploaded file is not an image.
    #[error("uploaded file must be an image")]
    NotAnImage,

    /// The multipart form could not be parsed or had no file field.
    #[error("could not read the uploaded file: {0}")]
    MultipartError(String),

    /// The bearer token was missing, malformed, or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// An auth token could not be signed.
    #[error("could not create auth token: {0}")]
    TokenCreation(String),

    /// The requested resource was not found.
    ///
    /// Also returned for resources owned by another user, so that clients
    /// cannot probe for the existence of other users' records.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A write lost out to concurrent updates and exhausted its retries.
    #[error("the operation conflicted with concurrent updates, please retry")]
    Conflict,

    /// An unexpected error occurred in the password hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The object storage collaborator failed.
    #[error("object storage failed: {0}")]
    StorageError(String),

    /// The mail collaborator failed.
    ///
    /// Callers in the OTP flow report this in the response body instead of
    /// failing the request.
    #[error("sending mail failed: {0}")]
    MailError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

/// Check that a request field is present and not blank.
pub(crate) fn require_field<'a>(value: &'a str, field: &'static str) -> Result<&'a str, Error> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        Err(Error::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                Error::Conflict
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingField(_)
            | Error::InvalidEmail
            | Error::PasswordTooShort
            | Error::DuplicateEmail
            | Error::EmptyCategory
            | Error::NonPositiveAmount
            | Error::NegativeAmount(_)
            | Error::InvalidTransactionType
            | Error::InvalidPeriod(_)
            | Error::InvalidDateRange
            | Error::InvalidOtp
            | Error::OtpExpired
            | Error::NoAvatar
            | Error::NotAnImage
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Conflict => StatusCode::CONFLICT,
            Error::StorageError(_) | Error::MailError(_) => StatusCode::BAD_GATEWAY,
            Error::TokenCreation(_) | Error::HashingError(_) | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!("an unexpected error occurred: {}", self);
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });

        // Internal error detail is only exposed in non-production builds.
        if cfg!(debug_assertions) && status.is_server_error() {
            body["error"] = json!(self.to_string());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn not_found_maps_to_404() {
        let response = Error::NotFound.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_credentials_message_is_generic() {
        assert_eq!(Error::InvalidCredentials.to_string(), "invalid email or password");
    }

    #[test]
    fn query_returned_no_rows_becomes_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn validation_errors_map_to_400() {
        for error in [
            Error::MissingField("email"),
            Error::NonPositiveAmount,
            Error::EmptyCategory,
            Error::InvalidPeriod("decade".to_owned()),
        ] {
            let status = error.into_response().status();
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }
}

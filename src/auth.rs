//! Auth token issuance and verification, and the register/log in endpoints.

use std::str::FromStr;

use axum::{
    extract::{FromRef, FromRequestParts, Json, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use email_address::EmailAddress;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    error::require_field,
    models::{PasswordHash, UserID},
    stores::{NewUser, UserStore},
    AppState, Error,
};

// Code in this module is adapted from https://github.com/ezesundayeze/axum--auth
// and https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

/// How long a session token stays valid.
pub const SESSION_TOKEN_DURATION: Duration = Duration::days(7);

/// How long a password reset token stays valid.
pub const RESET_TOKEN_DURATION: Duration = Duration::minutes(15);

/// The keys for signing and verifying JSON Web Tokens.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl JwtKeys {
    /// Derive the signing and verifying keys from a shared secret.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The contents of a session token.
#[derive(Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the authenticated user.
    pub sub: i64,
    /// The time the token was issued.
    pub iat: usize,
    /// The expiry time of the token.
    pub exp: usize,
}

impl Claims {
    /// The authenticated user's ID.
    pub fn user_id(&self) -> UserID {
        UserID::new(self.sub)
    }
}

/// The contents of a password reset token, issued only after OTP
/// verification.
#[derive(Serialize, Deserialize)]
pub struct ResetClaims {
    /// The ID of the user resetting their password.
    pub user_id: i64,
    /// The email the reset was requested for.
    pub email: String,
    /// The time the token was issued.
    pub iat: usize,
    /// The expiry time of the token.
    pub exp: usize,
}

impl<S> FromRequestParts<S> for Claims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::InvalidToken)?;

        let keys = JwtKeys::from_ref(state);

        decode_session_token(bearer.token(), &keys)
    }
}

/// Create a session token for `user_id`, valid for [SESSION_TOKEN_DURATION].
pub fn encode_session_token(user_id: UserID, keys: &JwtKeys) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        iat: now.unix_timestamp() as usize,
        exp: (now + SESSION_TOKEN_DURATION).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify a session token and return its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, has a bad
/// signature, or has expired.
pub fn decode_session_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode(token, &keys.decoding, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|_| Error::InvalidToken)
}

/// Create a password reset token, valid for [RESET_TOKEN_DURATION].
pub fn encode_reset_token(user_id: UserID, email: &str, keys: &JwtKeys) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = ResetClaims {
        user_id: user_id.as_i64(),
        email: email.to_owned(),
        iat: now.unix_timestamp() as usize,
        exp: (now + RESET_TOKEN_DURATION).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify a password reset token and return its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, has a bad
/// signature, or has expired.
pub fn decode_reset_token(token: &str, keys: &JwtKeys) -> Result<ResetClaims, Error> {
    decode(token, &keys.decoding, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|_| Error::InvalidToken)
}

/// The fields for a registration request.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
}

/// The fields for a log in request.
#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Handler for registration requests.
///
/// Creates the account and logs the new user straight in.
///
/// # Errors
/// Returns an error if a field is missing or malformed, or if the email is
/// already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<Response, Error> {
    let full_name = require_field(&form.full_name, "fullName")?;
    let raw_email = require_field(&form.email, "email")?;
    let phone = require_field(&form.phone, "phone")?;
    require_field(&form.password, "password")?;

    let email = EmailAddress::from_str(raw_email).map_err(|_| Error::InvalidEmail)?;
    let password_hash = PasswordHash::from_raw_password(&form.password, PasswordHash::DEFAULT_COST)?;

    let user = state.user_store.create(NewUser {
        full_name: full_name.to_owned(),
        email,
        phone: phone.to_owned(),
        password_hash,
    })?;

    let token = encode_session_token(user.id, &state.jwt_keys)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "registration successful",
            "token": token,
            "user": user.to_view(),
        })),
    )
        .into_response())
}

/// Handler for log in requests.
///
/// # Errors
/// Returns [Error::InvalidCredentials] for an unknown email or a wrong
/// password. The response does not reveal which one was wrong.
pub async fn log_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, Error> {
    let email = require_field(&credentials.email, "email")?;
    require_field(&credentials.password, "password")?;

    let user = state.user_store.get_by_email(email).map_err(|error| match error {
        Error::NotFound => Error::InvalidCredentials,
        error => error,
    })?;

    let password_is_correct = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_session_token(user.id, &state.jwt_keys)?;

    Ok(Json(json!({
        "success": true,
        "message": "login successful",
        "token": token,
        "user": user.to_view(),
    }))
    .into_response())
}

/// Handler for log out requests.
///
/// Session tokens are stateless, so there is nothing to revoke server-side;
/// the client discards its token.
pub async fn log_out(_claims: Claims) -> Response {
    Json(json!({
        "success": true,
        "message": "logged out",
    }))
    .into_response()
}


#[cfg(test)]
mod handler_tests {
    use axum::{
        routing::{get, post},
        Router,
    };
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::app_state::test_state::get_test_state;

    use super::{log_in, log_out, register};

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(log_in))
            .route("/api/auth/logout", get(log_out))
            .with_state(get_test_state());

        TestServer::new(app)
    }

    fn registration_body() -> Value {
        json!({
            "fullName": "Jane Doe",
            "email": "a@b.com",
            "phone": "021555123",
            "password": "secret1",
        })
    }

    #[tokio::test]
    async fn register_creates_account_and_returns_token() {
        let server = get_test_server();

        let response = server.post("/api/auth/register").json(&registration_body()).await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["success"], json!(true));
        assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
        assert_eq!(body["user"]["email"], json!("a@b.com"));
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let server = get_test_server();

        let mut body = registration_body();
        body["email"] = json!("not-an-email");

        server
            .post("/api/auth/register")
            .json(&body)
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let server = get_test_server();

        let mut body = registration_body();
        body["password"] = json!("abc12");

        server
            .post("/api/auth/register")
            .json(&body)
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let server = get_test_server();

        server
            .post("/api/auth/register")
            .json(&registration_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        server
            .post("/api/auth/register")
            .json(&registration_body())
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();

        server
            .post("/api/auth/register")
            .json(&registration_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/auth/login")
            .json(&json!({"email": "a@b.com", "password": "secret1"}))
            .await;

        response.assert_status_ok();
        assert!(response.json::<Value>()["token"].as_str().is_some());
    }

    #[tokio::test]
    async fn log_in_failure_message_is_generic() {
        let server = get_test_server();

        server
            .post("/api/auth/register")
            .json(&registration_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let wrong_password = server
            .post("/api/auth/login")
            .json(&json!({"email": "a@b.com", "password": "wrongpassword"}))
            .await;
        let unknown_email = server
            .post("/api/auth/login")
            .json(&json!({"email": "nobody@b.com", "password": "secret1"}))
            .await;

        wrong_password.assert_status_unauthorized();
        unknown_email.assert_status_unauthorized();

        let want = json!("invalid email or password");
        assert_eq!(wrong_password.json::<Value>()["message"], want);
        assert_eq!(unknown_email.json::<Value>()["message"], want);
    }

    #[tokio::test]
    async fn protected_route_requires_token() {
        let server = get_test_server();

        server
            .get("/api/auth/logout")
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn protected_route_accepts_issued_token() {
        let server = get_test_server();

        let response = server
            .post("/api/auth/register")
            .json(&registration_body())
            .await;
        let token = response.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_owned();

        server
            .get("/api/auth/logout")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }
}

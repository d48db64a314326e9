//! Middleware for logging requests and responses.

use axum::{
    extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response,
};
use serde_json::Value;

/// The fields whose values are replaced before a request body is logged.
const REDACTED_FIELDS: &[&str] = &["password", "newPassword", "confirmPassword"];

/// How many bytes of a body are logged at the `info` level before truncating.
pub const LOG_BODY_LENGTH_LIMIT: usize = 512;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// JSON request bodies have their password fields redacted, and bodies longer
/// than [LOG_BODY_LENGTH_LIMIT] bytes are truncated with the full body logged
/// at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_text) = buffer_request(request).await;

    let is_json = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        let display_text = redact_fields(&body_text);
        log_request(&parts, &display_text);
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body_text) = buffer_response(response).await;
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

/// Replace the values of the [REDACTED_FIELDS] in a JSON body.
///
/// Bodies that do not parse as JSON are passed through unchanged.
fn redact_fields(body_text: &str) -> String {
    let Ok(mut body) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    if let Some(object) = body.as_object_mut() {
        for field in REDACTED_FIELDS {
            if let Some(value) = object.get_mut(*field) {
                *value = Value::String("********".to_owned());
            }
        }
    }

    body.to_string()
}

async fn buffer_request(request: Request) -> (axum::http::request::Parts, String) {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn buffer_response(response: Response) -> (axum::http::response::Parts, String) {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    let method = &parts.method;
    let uri = &parts.uri;

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "received request: {method} {uri}\nbody: {}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("full request body: {body:?}");
    } else {
        tracing::info!("received request: {method} {uri}\nbody: {body:?}");
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    let status = parts.status;

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "sending response: {status}\nbody: {}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("full response body: {body:?}");
    } else {
        tracing::info!("sending response: {status}\nbody: {body:?}");
    }
}

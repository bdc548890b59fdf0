//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};
use serde_json::json;

/// The maximum number of body bytes to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged in full at the `debug` level.
///
/// Password fields in JSON request bodies are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    if headers.headers.get(CONTENT_TYPE) == Some(&"application/json".parse().unwrap()) {
        let display_text = redact_json_field(&body_text, "password");
        log_request(&headers, &display_text);
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace the value of `field_name` in a JSON object string with asterisks.
///
/// Returns the text unchanged if it is not a JSON object or does not contain
/// `field_name`.
fn redact_json_field(body_text: &str, field_name: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(body_text) else {
        return body_text.to_string();
    };

    let Some(object) = value.as_object_mut() else {
        return body_text.to_string();
    };

    if object.contains_key(field_name) {
        object.insert(field_name.to_owned(), json!("********"));
        return value.to_string();
    }

    body_text.to_string()
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod redact_json_field_tests {
    use super::redact_json_field;

    #[test]
    fn redacts_password_field() {
        let body = r#"{"email":"alice@example.com","password":"hunter2"}"#;

        let redacted = redact_json_field(body, "password");

        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains("alice@example.com"));
        assert!(redacted.contains("********"));
    }

    #[test]
    fn leaves_other_bodies_alone() {
        let body = r#"{"kind":"deposit","amount":100}"#;

        let redacted = redact_json_field(body, "password");

        assert_eq!(redacted, body);
    }

    #[test]
    fn leaves_non_json_bodies_alone() {
        let body = "password=hunter2";

        let redacted = redact_json_field(body, "password");

        assert_eq!(redacted, body);
    }
}

//! This file defines the log-out route logic.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::auth::invalidate_auth_cookie;

/// Handler for log-out requests.
///
/// Invalidates the auth cookie. Logging out without being logged in is not
/// an error.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    (StatusCode::NO_CONTENT, invalidate_auth_cookie(jar)).into_response()
}

//! This file defines the log-in route logic.
//! The auth module handles the lower level cookie auth logic.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{invalidate_auth_cookie, set_auth_cookie},
    models::{Role, UserID},
    stores::{LedgerStore, UserStore},
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The data in a log-in request.
#[derive(Debug, Clone, Deserialize)]
pub struct LogInData {
    /// The email the user signs in with.
    pub email: String,
    /// The user's plain text password.
    pub password: String,
    /// Whether to keep the user signed in for longer than a normal session.
    #[serde(default)]
    pub remember_me: bool,
}

/// The signed-in user's profile, returned on a successful log-in.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The signed-in user's ID.
    pub user_id: UserID,
    /// The signed-in user's email address.
    pub email: String,
    /// The signed-in user's role.
    pub role: Role,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the user's
/// profile is returned. Otherwise, a 401 response is returned that does not
/// reveal whether the email or the password was wrong.
pub async fn post_log_in<L, U>(
    State(state): State<AppState<L, U>>,
    jar: PrivateCookieJar,
    Json(user_data): Json<LogInData>,
) -> Response
where
    L: LedgerStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let user = match state.user_store.get_user_by_email(&user_data.email) {
        Ok(user) => user,
        Err(Error::NotFound) => return Error::InvalidCredentials.into_response(),
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return error.into_response();
        }
    };

    let is_password_valid = match user.password_hash.verify(&user_data.password) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return Error::HashingError(error.to_string()).into_response();
        }
    };

    if !is_password_valid {
        return Error::InvalidCredentials.into_response();
    }

    let cookie_duration = if user_data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    match set_auth_cookie(jar.clone(), user.id, user.role, cookie_duration) {
        Ok(updated_jar) => (
            StatusCode::OK,
            updated_jar,
            Json(UserProfile {
                user_id: user.id,
                email: user.email,
                role: user.role,
            }),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (StatusCode::INTERNAL_SERVER_ERROR, invalidate_auth_cookie(jar)).into_response()
        }
    }
}

#[cfg(test)]
mod log_in_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        AppState,
        auth::COOKIE_TOKEN,
        build_router,
        models::{PasswordHash, Role, ValidatedPassword},
        stores::{InMemoryLedgerStore, InMemoryUserStore, UserStore},
    };

    use super::super::endpoints;
    use super::UserProfile;

    fn get_test_server() -> TestServer {
        let mut user_store = InMemoryUserStore::new();
        let password_hash =
            PasswordHash::new(ValidatedPassword::new_unchecked("averystrongpassword"), 4).unwrap();
        user_store
            .create_user("customer@example.com", password_hash, Role::Customer)
            .unwrap();

        let state = AppState::new("aniatetsn", InMemoryLedgerStore::new(), user_store);

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "customer@example.com",
                "password": "averystrongpassword",
            }))
            .await;

        response.assert_status_ok();
        assert!(!response.cookie(COOKIE_TOKEN).value().is_empty());

        let profile: UserProfile = response.json();
        assert_eq!(profile.email, "customer@example.com");
        assert_eq!(profile.role, Role::Customer);
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "customer@example.com",
                "password": "notthepassword",
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "nobody@example.com",
                "password": "averystrongpassword",
            }))
            .await;

        // An unknown email must look exactly like a wrong password.
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

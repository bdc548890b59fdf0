//! Authentication middleware that validates cookies, extends sessions, and
//! enforces role-based access.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use time::Duration;

use crate::{
    AppState, Error,
    auth::cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    models::Role,
    stores::{LedgerStore, UserStore},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
}

impl<L, U> FromRef<AppState<L, U>> for AuthState
where
    L: LedgerStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<L, U>) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid authorization cookie.
/// The auth token is placed into the request and then the request executed
/// normally if the cookie is valid (and carries `required_role`, when one is
/// given), otherwise a JSON error response is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(token): Extension<Token>` to receive the token.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key`
/// for decrypting and verifying the cookie contents.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    required_role: Option<Role>,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}.");
            return Error::CookieMissing.into_response();
        }
    };
    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    if let Some(role) = required_role
        && token.role != role
    {
        return Error::Forbidden.into_response();
    }

    parts.extensions.insert(token);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware function that checks for a valid authorization cookie and lets
/// any signed-in user through.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, None).await
}

/// Middleware function that checks for a valid authorization cookie and
/// requires the signed-in user to be a banker.
pub async fn banker_guard(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, Some(Role::Banker)).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Json, Router,
        extract::State,
        http::StatusCode,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, SameSite},
    };
    use axum_test::TestServer;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, set_auth_cookie},
        create_cookie_key,
        models::{Role, UserID},
    };

    use super::{AuthState, auth_guard, banker_guard};

    async fn test_handler() -> Json<&'static str> {
        Json("Hello, World!")
    }

    async fn stub_customer_log_in(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserID::new(1), Role::Customer, state.cookie_duration)
    }

    async fn stub_banker_log_in(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserID::new(2), Role::Banker, state.cookie_duration)
    }

    const TEST_CUSTOMER_LOG_IN_ROUTE: &str = "/log_in/customer";
    const TEST_BANKER_LOG_IN_ROUTE: &str = "/log_in/banker";
    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_BANKER_ROUTE: &str = "/banker";

    fn get_test_server(cookie_duration: Duration) -> TestServer {
        let state = AuthState {
            cookie_key: create_cookie_key("nafstenoas"),
            cookie_duration,
        };

        let protected_routes = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));
        let banker_routes = Router::new()
            .route(TEST_BANKER_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), banker_guard));

        let app = protected_routes
            .merge(banker_routes)
            .route(TEST_CUSTOMER_LOG_IN_ROUTE, post(stub_customer_log_in))
            .route(TEST_BANKER_LOG_IN_ROUTE, post(stub_banker_log_in))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_cookie() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server.post(TEST_CUSTOMER_LOG_IN_ROUTE).await;

        response.assert_status_ok();
        let token_cookie = response.cookie(COOKIE_TOKEN);

        server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn get_protected_route_with_no_auth_cookie_fails() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_invalid_auth_cookie_fails() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_expired_auth_cookie_fails() {
        let server = get_test_server(Duration::seconds(-1));
        let response = server.post(TEST_CUSTOMER_LOG_IN_ROUTE).await;

        response.assert_status_ok();
        let mut token_cookie = response.cookie(COOKIE_TOKEN);
        token_cookie.set_expires(OffsetDateTime::now_utc() + Duration::minutes(5));

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn banker_route_rejects_customers() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server.post(TEST_CUSTOMER_LOG_IN_ROUTE).await;
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_BANKER_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn banker_route_allows_bankers() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server.post(TEST_BANKER_LOG_IN_ROUTE).await;
        let token_cookie = response.cookie(COOKIE_TOKEN);

        server
            .get(TEST_BANKER_ROUTE)
            .add_cookie(token_cookie)
            .await
            .assert_status_ok();
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {:?}, want {:?}",
            left,
            right
        );
    }

    #[tokio::test]
    async fn auth_guard_extends_valid_cookie_duration() {
        let server = get_test_server(Duration::seconds(5));
        let response = server.post(TEST_CUSTOMER_LOG_IN_ROUTE).await;

        response.assert_status_ok();
        let response_time = OffsetDateTime::now_utc();
        let jar = response.cookies();
        assert_date_time_close(
            jar.get(COOKIE_TOKEN).unwrap().expires_datetime().unwrap(),
            response_time + Duration::seconds(5),
        );

        let response = server.get(TEST_PROTECTED_ROUTE).add_cookies(jar).await;

        let auth_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close(
            auth_cookie.expires_datetime().unwrap(),
            response_time + Duration::seconds(5),
        );
        assert_eq!(auth_cookie.secure(), Some(true));
        assert_eq!(auth_cookie.http_only(), Some(true));
        assert_eq!(auth_cookie.same_site(), Some(SameSite::Strict));
    }
}

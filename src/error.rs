//! Defines the app level error type and its conversion to JSON API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing or creating a token expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not handle token expiry date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A string was used as an email address that does not look like one.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email used to register is already in use.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// Tried to open an account for a user that already has one.
    #[error("the user already has an account")]
    DuplicateAccount,

    /// A role string that is neither `customer` nor `banker` was read.
    #[error("\"{0}\" is not a valid role")]
    InvalidRole(String),

    /// The signed-in user does not have the role required for the route.
    #[error("the signed-in user may not access this resource")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A transaction kind that is neither `deposit` nor `withdrawal`.
    #[error("\"{0}\" is not a valid transaction kind")]
    InvalidTransactionKind(String),

    /// A transaction amount that is missing, non-numeric, zero or negative.
    #[error("invalid transaction amount: {0}")]
    InvalidAmount(String),

    /// A withdrawal was requested for more money than the account holds.
    ///
    /// The account state is left untouched when this error is returned.
    #[error("cannot withdraw {requested} with a balance of {available}")]
    InsufficientFunds {
        /// The amount the withdrawal asked for.
        requested: f64,
        /// The account balance at the time of the request.
        available: f64,
    },

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("account.user_id") =>
            {
                Error::DuplicateAccount
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, error_code) = match &self {
            Error::InvalidCredentials | Error::CookieMissing => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            Error::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Error::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::InvalidTransactionKind(_) => (StatusCode::BAD_REQUEST, "INVALID_KIND"),
            Error::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            Error::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS"),
            Error::TooWeak(_) => (StatusCode::BAD_REQUEST, "WEAK_PASSWORD"),
            Error::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "INVALID_EMAIL"),
            Error::DuplicateEmail => (StatusCode::CONFLICT, "DUPLICATE_EMAIL"),
            Error::DuplicateAccount => (StatusCode::CONFLICT, "DUPLICATE_ACCOUNT"),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": {
                            "code": "INTERNAL_ERROR",
                            "message": "An internal error occurred. Please try again later.",
                        }
                    })),
                )
                    .into_response();
            }
        };

        (
            status_code,
            Json(json!({
                "error": {
                    "code": error_code,
                    "message": self.to_string(),
                }
            })),
        )
            .into_response()
    }
}

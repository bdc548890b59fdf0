//! This file defines the customer registration route logic.
//!
//! Registering a customer provisions both the user and their account, so a
//! freshly registered customer always has an account with a balance of zero.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    models::{AccountID, PasswordHash, Role, UserID},
    stores::{LedgerStore, UserStore},
};

/// The data in a registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    /// The email the new customer will sign in with.
    pub email: String,
    /// The new customer's plain text password.
    pub password: String,
}

/// The response to a successful registration.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The new customer's user ID.
    pub user_id: UserID,
    /// The new customer's email address.
    pub email: String,
    /// The new customer's role (always `customer`).
    pub role: Role,
    /// The new customer's account ID.
    pub account_id: AccountID,
}

/// Handler for registering a new customer via the POST method.
///
/// Creates the user and their account together. The new customer starts with
/// a balance of zero and must log in afterwards.
pub async fn register_user<L, U>(
    State(mut state): State<AppState<L, U>>,
    Json(register_data): Json<RegisterData>,
) -> Response
where
    L: LedgerStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let email = register_data.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Error::InvalidEmail(register_data.email).into_response();
    }

    let password_hash =
        match PasswordHash::from_raw_password(&register_data.password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => password_hash,
            Err(error) => return error.into_response(),
        };

    let user = match state
        .user_store
        .create_user(email, password_hash, Role::Customer)
    {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    let account = match state.ledger_store.create_account(user.id) {
        Ok(account) => account,
        Err(error) => {
            tracing::error!("Could not open an account for new user {}: {error}", user.id);
            return error.into_response();
        }
    };

    (
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            email: user.email,
            role: user.role,
            account_id: account.id,
        }),
    )
        .into_response()
}

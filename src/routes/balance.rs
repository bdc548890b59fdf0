//! This file defines the balance inquiry route for the signed-in customer.

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth::Token,
    models::AccountID,
    stores::{LedgerStore, UserStore},
};

/// The signed-in customer's current balance.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// The customer's account ID.
    pub account_id: AccountID,
    /// The current account balance.
    pub balance: f64,
}

/// Handler for balance inquiries by the signed-in customer.
///
/// Returns the balance of the account owned by the signed-in user,
/// reflecting every transaction committed before this call.
pub async fn get_balance<L, U>(
    State(state): State<AppState<L, U>>,
    Extension(token): Extension<Token>,
) -> Response
where
    L: LedgerStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    match state.ledger_store.account_of(token.user_id) {
        Ok(account) => Json(BalanceResponse {
            account_id: account.id,
            balance: account.balance,
        })
        .into_response(),
        Err(error) => error.into_response(),
    }
}

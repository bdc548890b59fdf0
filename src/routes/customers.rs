//! This file defines the banker-only routes for viewing customers and their
//! transaction histories.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    models::{AccountID, UserID},
    routes::transaction::{TransactionListParams, parse_filter},
    stores::{LedgerStore, UserStore},
};

/// One row in the banker's customer overview.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    /// The customer's user ID.
    pub user_id: UserID,
    /// The customer's email address.
    pub email: String,
    /// The customer's account ID.
    pub account_id: AccountID,
    /// The customer's current balance.
    pub balance: f64,
}

/// Handler for the banker's customer overview.
///
/// Lists every account together with its owner's email and current balance.
pub async fn get_customers<L, U>(State(state): State<AppState<L, U>>) -> Response
where
    L: LedgerStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let accounts = match state.ledger_store.accounts() {
        Ok(accounts) => accounts,
        Err(error) => return error.into_response(),
    };

    let mut customers = Vec::with_capacity(accounts.len());
    for account in accounts {
        let user = match state.user_store.get_user_by_id(account.user_id) {
            Ok(user) => user,
            Err(error) => {
                tracing::error!(
                    "Could not load the owner of account {}: {error}",
                    account.id
                );
                return error.into_response();
            }
        };

        customers.push(CustomerSummary {
            user_id: user.id,
            email: user.email,
            account_id: account.id,
            balance: account.balance,
        });
    }

    Json(customers).into_response()
}

/// Handler for a banker viewing one customer's transaction history.
pub async fn get_customer_transactions<L, U>(
    State(state): State<AppState<L, U>>,
    Path(user_id): Path<i64>,
    Query(params): Query<TransactionListParams>,
) -> Response
where
    L: LedgerStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let filter = match parse_filter(params) {
        Ok(filter) => filter,
        Err(error) => return error.into_response(),
    };

    let account = match state.ledger_store.account_of(UserID::new(user_id)) {
        Ok(account) => account,
        Err(error) => return error.into_response(),
    };

    match state.ledger_store.transactions(account.id, filter) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_response(),
    }
}

//! This file defines the routes for posting transactions and browsing the
//! transaction history of the signed-in customer.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::Token,
    models::{Amount, NewTransaction, TransactionKind},
    stores::{LedgerStore, SortOrder, TransactionFilter, UserStore},
};

/// The data in a transaction request.
///
/// `kind` and `amount` arrive as raw JSON values so that a missing or
/// non-numeric amount can be reported as an invalid amount instead of a
/// generic deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    /// The transaction kind, `deposit` or `withdrawal`.
    #[serde(default)]
    pub kind: Option<String>,
    /// The transaction amount as an arbitrary JSON value.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    /// Optional free text describing the transaction.
    #[serde(default)]
    pub description: Option<String>,
}

/// Validate a transaction request into the inputs for the ledger.
fn parse_new_transaction(data: TransactionData) -> Result<NewTransaction, Error> {
    let kind: TransactionKind = data.kind.as_deref().unwrap_or_default().parse()?;

    let raw_amount = match data.amount {
        Some(serde_json::Value::Number(number)) => number.as_f64().ok_or_else(|| {
            Error::InvalidAmount("the amount is not representable as a number".to_owned())
        })?,
        Some(value) => return Err(Error::InvalidAmount(format!("{value} is not a number"))),
        None => return Err(Error::InvalidAmount("the amount is missing".to_owned())),
    };
    let amount = Amount::new(raw_amount)?;

    Ok(NewTransaction {
        kind,
        amount,
        description: data.description,
    })
}

/// The query parameters for listing transactions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionListParams {
    /// `desc` lists the newest transactions first; anything else lists the
    /// oldest first.
    #[serde(default)]
    pub order: Option<String>,
    /// Only include transactions of this kind.
    #[serde(default)]
    pub kind: Option<String>,
}

/// Validate the query parameters into a transaction filter.
pub(super) fn parse_filter(params: TransactionListParams) -> Result<TransactionFilter, Error> {
    let order = match params.order.as_deref() {
        Some("desc") => SortOrder::Descending,
        _ => SortOrder::Ascending,
    };

    let kind = match params.kind.as_deref() {
        None | Some("") => None,
        Some(text) => Some(text.parse::<TransactionKind>()?),
    };

    Ok(TransactionFilter { kind, order })
}

/// Handler for posting a deposit or withdrawal to the signed-in customer's
/// account.
///
/// On success the created transaction is returned, including the balance
/// snapshot taken when it was committed. A failed request leaves the account
/// and its history untouched.
pub async fn create_transaction_endpoint<L, U>(
    State(mut state): State<AppState<L, U>>,
    Extension(token): Extension<Token>,
    Json(transaction_data): Json<TransactionData>,
) -> Response
where
    L: LedgerStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let new_transaction = match parse_new_transaction(transaction_data) {
        Ok(new_transaction) => new_transaction,
        Err(error) => return error.into_response(),
    };

    let account = match state.ledger_store.account_of(token.user_id) {
        Ok(account) => account,
        Err(error) => return error.into_response(),
    };

    match state
        .ledger_store
        .post_transaction(account.id, new_transaction)
    {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for listing the signed-in customer's transaction history.
///
/// The history is returned in full, ordered by creation time.
pub async fn get_transactions<L, U>(
    State(state): State<AppState<L, U>>,
    Extension(token): Extension<Token>,
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

    let account = match state.ledger_store.account_of(token.user_id) {
        Ok(account) => account,
        Err(error) => return error.into_response(),
    };

    match state.ledger_store.transactions(account.id, filter) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod parse_new_transaction_tests {
    use serde_json::json;

    use crate::{
        Error,
        models::TransactionKind,
    };

    use super::{TransactionData, parse_new_transaction};

    fn transaction_data(kind: &str, amount: serde_json::Value) -> TransactionData {
        TransactionData {
            kind: Some(kind.to_owned()),
            amount: Some(amount),
            description: None,
        }
    }

    #[test]
    fn accepts_a_valid_deposit() {
        let new_transaction =
            parse_new_transaction(transaction_data("deposit", json!(5000))).unwrap();

        assert_eq!(new_transaction.kind, TransactionKind::Deposit);
        assert_eq!(new_transaction.amount.as_f64(), 5_000.0);
    }

    #[test]
    fn rejects_unknown_kind() {
        let result = parse_new_transaction(transaction_data("transfer", json!(100)));

        assert_eq!(
            result,
            Err(Error::InvalidTransactionKind("transfer".to_owned()))
        );
    }

    #[test]
    fn rejects_missing_kind() {
        let result = parse_new_transaction(TransactionData {
            kind: None,
            amount: Some(json!(100)),
            description: None,
        });

        assert!(matches!(result, Err(Error::InvalidTransactionKind(_))));
    }

    #[test]
    fn rejects_non_numeric_amount() {
        let result = parse_new_transaction(transaction_data("deposit", json!("abc")));

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn rejects_missing_amount() {
        let result = parse_new_transaction(TransactionData {
            kind: Some("deposit".to_owned()),
            amount: None,
            description: None,
        });

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn rejects_negative_amount() {
        let result = parse_new_transaction(transaction_data("deposit", json!(-5)));

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
    }
}

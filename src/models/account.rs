//! The account model: the balance-holding entity associated with one user.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::models::UserID;

/// A newtype wrapper for integer account IDs.
///
/// This helps disambiguate account IDs from other types of IDs, leading to
/// better compile time errors, and more flexible generics that can have
/// distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountID(i64);

impl AccountID {
    /// Create a new account ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the account ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for AccountID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The balance-holding entity associated with one user.
///
/// `balance` always equals the `balance_after` of the account's most recent
/// transaction, or 0 if no transactions exist, and is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The account's ID in the application database.
    pub id: AccountID,
    /// The user that owns the account (one account per user).
    pub user_id: UserID,
    /// The current account balance.
    pub balance: f64,
}

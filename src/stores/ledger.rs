//! Defines the ledger store trait: the component that owns balance and
//! transaction history consistency for accounts.

use crate::{
    Error,
    models::{Account, AccountID, NewTransaction, Transaction, UserID},
};

/// Handles accounts, their balances, and their transaction histories.
///
/// Implementations must keep each account's balance equal to the
/// `balance_after` of its most recent transaction, and must serialize
/// concurrent [LedgerStore::post_transaction] calls on the same account so
/// that the history is consistent with some total order of the calls.
pub trait LedgerStore {
    /// Open a new account for `owner` with a balance of zero.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::NotFound] if `owner` does not refer to a valid user,
    /// - [Error::DuplicateAccount] if `owner` already has an account,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create_account(&mut self, owner: UserID) -> Result<Account, Error>;

    /// Retrieve the account with the ID `id`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NotFound] if `id` does not refer to a valid account.
    fn account(&self, id: AccountID) -> Result<Account, Error>;

    /// Retrieve the account owned by the user `owner`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NotFound] if `owner` has no account.
    fn account_of(&self, owner: UserID) -> Result<Account, Error>;

    /// Retrieve all accounts, ordered by ID.
    fn accounts(&self) -> Result<Vec<Account>, Error>;

    /// Atomically post a transaction to the account `account_id`.
    ///
    /// Implementations must read the current balance, apply
    /// [balance_after](crate::models::balance_after), update the stored
    /// balance and append the transaction record as one atomic unit. On any
    /// error, no account or transaction state changes.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::NotFound] if `account_id` does not refer to a valid account,
    /// - [Error::InsufficientFunds] if a withdrawal asks for more than the
    ///   current balance,
    /// - or [Error::SqlError] if the underlying storage operation failed.
    fn post_transaction(
        &mut self,
        account_id: AccountID,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error>;

    /// The current balance of the account `account_id`.
    ///
    /// Reflects every transaction committed before the call returns.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NotFound] if `account_id` does not refer to a valid
    /// account.
    fn balance(&self, account_id: AccountID) -> Result<f64, Error>;

    /// Retrieve the transactions of the account `account_id` in the way
    /// defined by `filter`.
    ///
    /// The returned sequence is fully materialized; an account with no
    /// transactions produces an empty list.
    fn transactions(
        &self,
        account_id: AccountID,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, Error>;
}

/// Defines how transactions should be fetched from
/// [LedgerStore::transactions].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionFilter {
    /// Only include transactions of this kind. None includes all kinds.
    pub kind: Option<crate::models::TransactionKind>,
    /// The order to sort transactions by their creation time.
    pub order: SortOrder,
}

/// The order to sort transactions in a [TransactionFilter].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest transactions first.
    #[default]
    Ascending,
    /// Newest transactions first.
    Descending,
}

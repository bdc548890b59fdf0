//! Defines the domain models of the application and their validation rules.

mod account;
mod password;
mod transaction;
mod user;

pub use account::{Account, AccountID};
pub use password::{PasswordHash, ValidatedPassword};
pub use transaction::{
    Amount, NewTransaction, Transaction, TransactionKind, balance_after, next_timestamp,
};
pub use user::{Role, User, UserID};

pub(crate) use transaction::datetime_format;

/// An alias for the integer type used for database row IDs.
pub type DatabaseID = i64;

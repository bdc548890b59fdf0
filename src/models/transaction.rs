//! The transaction model and the balance arithmetic shared by every ledger
//! backend.
//!
//! A transaction is an immutable record of a single balance-changing event.
//! Backends must call [balance_after] inside their atomic write step so that
//! the funds check and the balance snapshot are computed in exactly one
//! place.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    models::{AccountID, DatabaseID},
};

/// The two kinds of balance-changing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money paid into an account.
    Deposit,
    /// Money taken out of an account.
    Withdrawal,
}

impl TransactionKind {
    /// The kind as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            other => Err(Error::InvalidTransactionKind(other.to_owned())),
        }
    }
}

/// A transaction amount that has been validated.
///
/// An amount is always finite and strictly positive, so code holding an
/// `Amount` can skip re-checking those properties.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    /// Validate `value` as a transaction amount.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if `value` is not finite or not
    /// strictly positive.
    pub fn new(value: f64) -> Result<Self, Error> {
        if !value.is_finite() {
            return Err(Error::InvalidAmount(format!(
                "{value} is not a finite number"
            )));
        }

        if value <= 0.0 {
            return Err(Error::InvalidAmount(format!(
                "{value} is not strictly positive"
            )));
        }

        Ok(Self(value))
    }

    /// The amount as a 64 bit float.
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The validated inputs for posting a transaction to a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether the transaction pays money in or takes money out.
    pub kind: TransactionKind,
    /// How much money the transaction moves.
    pub amount: Amount,
    /// Optional free text describing the transaction.
    pub description: Option<String>,
}

/// An immutable record of a single balance-changing event.
///
/// Transactions are never updated or deleted once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction's ID in the application database.
    pub id: DatabaseID,
    /// The account the transaction belongs to.
    pub account_id: AccountID,
    /// Whether the transaction paid money in or took money out.
    pub kind: TransactionKind,
    /// How much money the transaction moved.
    pub amount: f64,
    /// Optional free text describing the transaction.
    pub description: Option<String>,
    /// The account balance immediately after this transaction was committed.
    pub balance_after: f64,
    /// When the transaction was committed.
    ///
    /// Non-decreasing in insertion order for a given account.
    #[serde(with = "datetime_format")]
    pub created_at: OffsetDateTime,
}

/// Compute the balance an account will hold after applying a transaction.
///
/// This is the single home of the ledger's consistency rule: the new balance
/// always equals the old balance plus a deposit or minus a withdrawal, and a
/// withdrawal may never drive the balance negative. Storage backends must
/// call this inside their atomic read-validate-write step.
///
/// # Errors
///
/// Returns an [Error::InsufficientFunds] if a withdrawal asks for more than
/// `balance`.
pub fn balance_after(balance: f64, kind: TransactionKind, amount: Amount) -> Result<f64, Error> {
    match kind {
        TransactionKind::Deposit => Ok(balance + amount.as_f64()),
        TransactionKind::Withdrawal if amount.as_f64() > balance => Err(Error::InsufficientFunds {
            requested: amount.as_f64(),
            available: balance,
        }),
        TransactionKind::Withdrawal => Ok(balance - amount.as_f64()),
    }
}

/// The timestamp for a transaction about to be committed.
///
/// Clamps the current time to the previous transaction's timestamp so that
/// `created_at` never decreases in insertion order for an account, even if
/// the wall clock steps backwards.
pub fn next_timestamp(previous: Option<OffsetDateTime>) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    match previous {
        Some(previous) if previous > now => previous,
        _ => now,
    }
}

pub(crate) mod datetime_format {
    //! Specifies how to serialize a [time::OffsetDateTime] in a custom format that
    //! avoids serialisations with datetimes containing midnight.
    //!
    //! The default serializer for [time::OffsetDateTime] will serialize
    //! "00:00:00.000000" as "0:00:00.0" and the deserializer would error out
    //! because it expects the hours to be two digits, not one.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// Date time format used on the wire, e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod amount_tests {
    use crate::Error;

    use super::Amount;

    #[test]
    fn accepts_positive_amounts() {
        let amount = Amount::new(5_000.0).unwrap();

        assert_eq!(amount.as_f64(), 5_000.0);
    }

    #[test]
    fn rejects_zero() {
        assert!(matches!(Amount::new(0.0), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(matches!(Amount::new(-5.0), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn rejects_non_finite_amounts() {
        assert!(matches!(
            Amount::new(f64::NAN),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(f64::INFINITY),
            Err(Error::InvalidAmount(_))
        ));
    }
}


#[cfg(test)]
mod next_timestamp_tests {
    use time::{Duration, OffsetDateTime};

    use super::next_timestamp;

    #[test]
    fn uses_now_without_a_previous_timestamp() {
        let before = OffsetDateTime::now_utc();

        let got = next_timestamp(None);

        assert!(got >= before);
    }

    #[test]
    fn never_goes_backwards() {
        let future = OffsetDateTime::now_utc() + Duration::hours(1);

        let got = next_timestamp(Some(future));

        assert_eq!(got, future);
    }

    #[test]
    fn moves_forward_past_an_old_timestamp() {
        let past = OffsetDateTime::now_utc() - Duration::hours(1);

        let got = next_timestamp(Some(past));

        assert!(got > past);
    }
}

//! Implements a SQLite backed ledger store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    models::{
        Account, AccountID, NewTransaction, Transaction, TransactionKind, UserID, balance_after,
        next_timestamp,
    },
    stores::{LedgerStore, SortOrder, TransactionFilter},
};

/// Stores accounts and their transactions in a SQLite database.
///
/// Note that because an account belongs to a [User](crate::models::User),
/// the user model must be set up in the database.
///
/// Posting a transaction holds the connection lock across a SQL transaction,
/// so concurrent posts are serialized.
#[derive(Debug, Clone)]
pub struct SQLiteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedgerStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl LedgerStore for SQLiteLedgerStore {
    /// Open a new account in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `owner` does not refer to a valid user,
    /// - [Error::DuplicateAccount] if `owner` already has an account,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create_account(&mut self, owner: UserID) -> Result<Account, Error> {
        let connection = self.connection.lock().unwrap();

        connection
            .execute(
                "INSERT INTO account (user_id, balance) VALUES (?1, 0.0)",
                (owner.as_i64(),),
            )
            .map_err(|error| match error {
                // Code 787 occurs when a FOREIGN KEY constraint failed.
                // The caller tried to open an account for a non-existent user.
                rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                    Error::NotFound
                }
                error => error.into(),
            })?;

        let id = AccountID::new(connection.last_insert_rowid());

        Ok(Account {
            id,
            user_id: owner,
            balance: 0.0,
        })
    }

    fn account(&self, id: AccountID) -> Result<Account, Error> {
        let account = self
            .connection
            .lock()
            .unwrap()
            .prepare("SELECT id, user_id, balance FROM account WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], map_row_to_account)?;

        Ok(account)
    }

    fn account_of(&self, owner: UserID) -> Result<Account, Error> {
        let account = self
            .connection
            .lock()
            .unwrap()
            .prepare("SELECT id, user_id, balance FROM account WHERE user_id = :user_id")?
            .query_row(&[(":user_id", &owner.as_i64())], map_row_to_account)?;

        Ok(account)
    }

    fn accounts(&self) -> Result<Vec<Account>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, user_id, balance FROM account ORDER BY id ASC")?
            .query_map([], map_row_to_account)?
            .map(|maybe_account| maybe_account.map_err(Error::SqlError))
            .collect()
    }

    /// Atomically post a transaction to an account in the database.
    ///
    /// The balance read, funds check, balance update and transaction insert
    /// run inside one SQL transaction while the connection lock is held. An
    /// early return rolls the SQL transaction back, leaving the account
    /// untouched.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `account_id` does not refer to a valid account,
    /// - [Error::InsufficientFunds] if a withdrawal asks for more than the
    ///   current balance,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn post_transaction(
        &mut self,
        account_id: AccountID,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();
        let sql_transaction = connection.unchecked_transaction()?;

        let balance: f64 = sql_transaction.query_row(
            "SELECT balance FROM account WHERE id = :id",
            &[(":id", &account_id.as_i64())],
            |row| row.get(0),
        )?;

        let new_balance = balance_after(balance, new_transaction.kind, new_transaction.amount)?;

        let last_created_at: Option<OffsetDateTime> = sql_transaction
            .query_row(
                "SELECT created_at FROM \"transaction\"
                 WHERE account_id = :account_id
                 ORDER BY id DESC LIMIT 1",
                &[(":account_id", &account_id.as_i64())],
                |row| row.get(0),
            )
            .optional()?;
        let created_at = next_timestamp(last_created_at);

        sql_transaction.execute(
            "UPDATE account SET balance = ?1 WHERE id = ?2",
            (new_balance, account_id.as_i64()),
        )?;

        sql_transaction.execute(
            "INSERT INTO \"transaction\" (account_id, kind, amount, description, balance_after, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                account_id.as_i64(),
                new_transaction.kind.as_str(),
                new_transaction.amount.as_f64(),
                &new_transaction.description,
                new_balance,
                created_at,
            ),
        )?;
        let id = sql_transaction.last_insert_rowid();

        sql_transaction.commit()?;

        Ok(Transaction {
            id,
            account_id,
            kind: new_transaction.kind,
            amount: new_transaction.amount.as_f64(),
            description: new_transaction.description,
            balance_after: new_balance,
            created_at,
        })
    }

    fn balance(&self, account_id: AccountID) -> Result<f64, Error> {
        let balance = self.connection.lock().unwrap().query_row(
            "SELECT balance FROM account WHERE id = :id",
            &[(":id", &account_id.as_i64())],
            |row| row.get(0),
        )?;

        Ok(balance)
    }

    /// Query for transactions in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL error.
    fn transactions(
        &self,
        account_id: AccountID,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, Error> {
        let mut query_string_parts = vec![
            "SELECT id, account_id, kind, amount, description, balance_after, created_at
             FROM \"transaction\" WHERE account_id = ?1"
                .to_string(),
        ];
        let mut query_parameters = vec![Value::Integer(account_id.as_i64())];

        if let Some(kind) = filter.kind {
            query_string_parts.push(format!("AND kind = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(kind.as_str().to_owned()));
        }

        match filter.order {
            SortOrder::Ascending => {
                query_string_parts.push("ORDER BY created_at ASC, id ASC".to_string())
            }
            SortOrder::Descending => {
                query_string_parts.push("ORDER BY created_at DESC, id DESC".to_string())
            }
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, map_row_to_transaction)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }
}

fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let balance = row.get(2)?;

    Ok(Account {
        id: AccountID::new(raw_id),
        user_id: UserID::new(raw_user_id),
        balance,
    })
}

fn map_row_to_transaction(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_account_id = row.get(1)?;
    let raw_kind: String = row.get(2)?;
    let kind = raw_kind.parse::<TransactionKind>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let amount = row.get(3)?;
    let description = row.get(4)?;
    let balance_after = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(Transaction {
        id,
        account_id: AccountID::new(raw_account_id),
        kind,
        amount,
        description,
        balance_after,
        created_at,
    })
}

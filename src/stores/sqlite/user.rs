//! Implements a SQLite backed user store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    models::{PasswordHash, Role, User, UserID},
    stores::UserStore,
};

/// Stores users in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateEmail] if `email` is already in use,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create_user(
        &mut self,
        email: &str,
        password_hash: PasswordHash,
        role: Role,
    ) -> Result<User, Error> {
        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO user (email, password, role) VALUES (?1, ?2, ?3)",
            (email, password_hash.as_ref(), role.as_str()),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User {
            id,
            email: email.to_owned(),
            password_hash,
            role,
        })
    }

    fn get_user_by_id(&self, id: UserID) -> Result<User, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare("SELECT id, email, password, role FROM user WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], map_row_to_user)?;

        Ok(user)
    }

    fn get_user_by_email(&self, email: &str) -> Result<User, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare("SELECT id, email, password, role FROM user WHERE email = :email")?
            .query_row(&[(":email", &email)], map_row_to_user)?;

        Ok(user)
    }

    fn set_password(&mut self, id: UserID, password_hash: PasswordHash) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "UPDATE user SET password = ?1 WHERE id = ?2",
            (password_hash.as_ref(), id.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let email = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let raw_role: String = row.get(3)?;
    let role = raw_role.parse::<Role>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(User {
        id: UserID::new(raw_id),
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role,
    })
}

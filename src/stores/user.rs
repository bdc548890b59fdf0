//! Defines the user store trait.

use crate::{
    Error,
    models::{PasswordHash, Role, User, UserID},
};

/// Handles the creation and retrieval of users.
pub trait UserStore {
    /// Create a new user in the store.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::DuplicateEmail] if `email` is already in use,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create_user(
        &mut self,
        email: &str,
        password_hash: PasswordHash,
        role: Role,
    ) -> Result<User, Error>;

    /// Retrieve the user with the ID `id`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NotFound] if `id` does not refer to a valid user.
    fn get_user_by_id(&self, id: UserID) -> Result<User, Error>;

    /// Retrieve the user with the email address `email`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NotFound] if no user has the email `email`.
    fn get_user_by_email(&self, email: &str) -> Result<User, Error>;

    /// Replace the password hash of the user with the ID `id`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NotFound] if `id` does not refer to a valid user.
    fn set_password(&mut self, id: UserID, password_hash: PasswordHash) -> Result<(), Error>;
}

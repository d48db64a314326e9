//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    models::{PasswordHash, User, UserID},
    Error,
};

/// The fields needed to create a user account.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub full_name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub password_hash: PasswordHash,
}

/// A partial update to a user's profile. `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Handles the creation and retrieval of user accounts.
pub trait UserStore {
    /// Create a new user account.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if the email is already registered.
    fn create(&self, new_user: NewUser) -> Result<User, Error>;

    /// Retrieve a user by ID.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Retrieve a user by their email address.
    ///
    /// The lookup is case-insensitive; emails are stored lowercase.
    fn get_by_email(&self, email: &str) -> Result<User, Error>;

    /// Update the user's profile fields and return the updated user.
    fn update_profile(&self, id: UserID, update: ProfileUpdate) -> Result<User, Error>;

    /// Replace the user's password hash.
    fn set_password(&self, id: UserID, password_hash: PasswordHash) -> Result<(), Error>;

    /// Attach an uploaded avatar to the user and return the updated user.
    fn set_avatar(&self, id: UserID, url: &str, key: &str) -> Result<User, Error>;

    /// Detach the user's avatar and return the updated user.
    fn clear_avatar(&self, id: UserID) -> Result<User, Error>;
}

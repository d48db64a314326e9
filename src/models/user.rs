//! This file defines a user of the application and its supporting types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::PasswordHash;

/// A newtype wrapper for integer user IDs.
/// This helps disambiguate user IDs from other types of IDs, leading to better
/// compile time errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// The password hash is never serialized; handlers expose users through
/// [User::to_view].
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    /// The ID of the user.
    pub id: UserID,
    /// The user's display name.
    pub full_name: String,
    /// The user's email address, stored lowercase and unique.
    pub email: String,
    /// The user's phone number.
    pub phone: String,
    /// The user's salted and hashed password.
    pub password_hash: PasswordHash,
    /// URL of the user's profile picture, if one has been uploaded.
    pub avatar_url: Option<String>,
    /// The object storage key for the profile picture, used for deletion.
    pub avatar_key: Option<String>,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// The public fields of a [User], safe to return to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserID,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// The public view of the user, without credentials or storage keys.
    pub fn to_view(&self) -> UserView {
        UserView {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            avatar_url: self.avatar_url.clone(),
            created_at: self.created_at,
        }
    }
}

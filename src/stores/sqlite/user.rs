//! Implements a SQLite backed user store.
use std::sync::{Arc, Mutex};

use rusqlite::{types::Type, Connection, Row};
use time::OffsetDateTime;

use crate::{
    db::{CreateTable, MapRow},
    models::{PasswordHash, User, UserID},
    stores::{user::ProfileUpdate, NewUser, UserStore},
    Error,
};

const USER_COLUMNS: &str = "id, full_name, email, phone, password, avatar_url, avatar_key, created_at";

/// Handles the creation and retrieval of user accounts in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SqliteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// The email is stored lowercase so lookups are case-insensitive.
    ///
    /// # Panics
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if the email is taken, or
    /// [Error::SqlError] if an SQL related error occurred.
    fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let connection = self.connection.lock().unwrap();

        let user = connection
            .prepare(&format!(
                "INSERT INTO user (full_name, email, phone, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {USER_COLUMNS}"
            ))?
            .query_row(
                (
                    &new_user.full_name,
                    new_user.email.to_string().to_lowercase(),
                    &new_user.phone,
                    new_user.password_hash.to_string(),
                    OffsetDateTime::now_utc().unix_timestamp(),
                ),
                Self::map_row,
            )?;

        Ok(user)
    }

    /// Get the user that has the specified `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user, or
    /// [Error::SqlError] if there are SQL related errors.
    fn get(&self, id: UserID) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
            .query_row(&[(":id", &id.as_i64())], Self::map_row)
            .map_err(|e| e.into())
    }

    /// Get the user that has the specified `email` address, ignoring case.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user, or
    /// [Error::SqlError] if there are SQL related errors.
    fn get_by_email(&self, email: &str) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
            ))?
            .query_row(&[(":email", &email.to_lowercase())], Self::map_row)
            .map_err(|e| e.into())
    }

    /// Update the profile fields set in `update` and return the updated user.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user.
    fn update_profile(&self, id: UserID, update: ProfileUpdate) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "UPDATE user
                 SET full_name = COALESCE(?1, full_name), phone = COALESCE(?2, phone)
                 WHERE id = ?3
                 RETURNING {USER_COLUMNS}"
            ))?
            .query_row((update.full_name, update.phone, id.as_i64()), Self::map_row)
            .map_err(|e| e.into())
    }

    /// Replace the user's password hash.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user.
    fn set_password(&self, id: UserID, password_hash: PasswordHash) -> Result<(), Error> {
        let rows_updated = self.connection.lock().unwrap().execute(
            "UPDATE user SET password = ?1 WHERE id = ?2",
            (password_hash.to_string(), id.as_i64()),
        )?;

        if rows_updated == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Attach an uploaded avatar to the user.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user.
    fn set_avatar(&self, id: UserID, url: &str, key: &str) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "UPDATE user SET avatar_url = ?1, avatar_key = ?2 WHERE id = ?3
                 RETURNING {USER_COLUMNS}"
            ))?
            .query_row((url, key, id.as_i64()), Self::map_row)
            .map_err(|e| e.into())
    }

    /// Detach the user's avatar.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user.
    fn clear_avatar(&self, id: UserID) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "UPDATE user SET avatar_url = NULL, avatar_key = NULL WHERE id = ?1
                 RETURNING {USER_COLUMNS}"
            ))?
            .query_row([id.as_i64()], Self::map_row)
            .map_err(|e| e.into())
    }
}

impl CreateTable for SqliteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY,
                    full_name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    phone TEXT NOT NULL,
                    password TEXT NOT NULL,
                    avatar_url TEXT,
                    avatar_key TEXT,
                    created_at INTEGER NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let full_name = row.get(offset + 1)?;
        let email = row.get(offset + 2)?;
        let phone = row.get(offset + 3)?;
        let raw_password_hash: String = row.get(offset + 4)?;
        let avatar_url = row.get(offset + 5)?;
        let avatar_key = row.get(offset + 6)?;
        let raw_created_at: i64 = row.get(offset + 7)?;

        let created_at = OffsetDateTime::from_unix_timestamp(raw_created_at).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 7, Type::Integer, Box::new(error))
        })?;

        Ok(User {
            id: UserID::new(raw_id),
            full_name,
            email,
            phone,
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            avatar_url,
            avatar_key,
            created_at,
        })
    }
}

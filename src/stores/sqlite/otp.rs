//! Implements a SQLite backed store for password reset one-time codes.
use std::sync::{Arc, Mutex};

use rusqlite::{types::Type, Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    db::{CreateTable, MapRow},
    models::{DatabaseID, PasswordResetOtp, UserID},
    stores::OtpStore,
    Error,
};

const OTP_COLUMNS: &str = "id, user_id, email, code, verified, expires_at";

/// Stores password reset one-time codes in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteOtpStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteOtpStore {
    /// Create a new OTP store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl OtpStore for SqliteOtpStore {
    /// Delete any earlier codes for `user_id` and store a fresh one, so a
    /// user only ever has one live code.
    ///
    /// # Panics
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if an SQL related error occurred.
    fn replace(
        &self,
        user_id: UserID,
        email: &str,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetOtp, Error> {
        let connection = self.connection.lock().unwrap();
        let tx = connection.unchecked_transaction()?;

        tx.execute("DELETE FROM otp WHERE user_id = ?1", [user_id.as_i64()])?;

        let otp = tx
            .prepare(&format!(
                "INSERT INTO otp (user_id, email, code, verified, expires_at, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?5)
                 RETURNING {OTP_COLUMNS}"
            ))?
            .query_row(
                (
                    user_id.as_i64(),
                    email,
                    code,
                    expires_at.unix_timestamp(),
                    OffsetDateTime::now_utc().unix_timestamp(),
                ),
                Self::map_row,
            )?;

        tx.commit()?;
        Ok(otp)
    }

    /// Find a code for `user_id` matching `code` and the given verification
    /// state. Expired codes are still returned so the caller can report
    /// expiry rather than a generic mismatch.
    fn find(
        &self,
        user_id: UserID,
        code: &str,
        verified: bool,
    ) -> Result<Option<PasswordResetOtp>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {OTP_COLUMNS} FROM otp
                 WHERE user_id = ?1 AND code = ?2 AND verified = ?3"
            ))?
            .query_row((user_id.as_i64(), code, verified), Self::map_row)
            .optional()
            .map_err(|e| e.into())
    }

    /// Find the user's verified code, if they have one. Expired codes are
    /// still returned so the caller can report expiry.
    fn find_verified(&self, user_id: UserID) -> Result<Option<PasswordResetOtp>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {OTP_COLUMNS} FROM otp WHERE user_id = ?1 AND verified = 1"
            ))?
            .query_row([user_id.as_i64()], Self::map_row)
            .optional()
            .map_err(|e| e.into())
    }

    /// Mark a code as verified.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such code.
    fn mark_verified(&self, id: DatabaseID) -> Result<(), Error> {
        let rows_updated = self
            .connection
            .lock()
            .unwrap()
            .execute("UPDATE otp SET verified = 1 WHERE id = ?1", [id])?;

        if rows_updated == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete a code.
    fn delete(&self, id: DatabaseID) -> Result<(), Error> {
        self.connection
            .lock()
            .unwrap()
            .execute("DELETE FROM otp WHERE id = ?1", [id])?;

        Ok(())
    }

    /// Delete every code issued for `user_id`.
    fn delete_for_user(&self, user_id: UserID) -> Result<(), Error> {
        self.connection
            .lock()
            .unwrap()
            .execute("DELETE FROM otp WHERE user_id = ?1", [user_id.as_i64()])?;

        Ok(())
    }

    /// Delete all codes whose expiry has passed at time `now`.
    fn purge_expired(&self, now: OffsetDateTime) -> Result<(), Error> {
        self.connection
            .lock()
            .unwrap()
            .execute("DELETE FROM otp WHERE expires_at < ?1", [now.unix_timestamp()])?;

        Ok(())
    }
}

impl CreateTable for SqliteOtpStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS otp (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    email TEXT NOT NULL,
                    code TEXT NOT NULL,
                    verified INTEGER NOT NULL DEFAULT 0,
                    expires_at INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_otp_expires_at ON otp (expires_at)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteOtpStore {
    type ReturnType = PasswordResetOtp;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_expires_at: i64 = row.get(offset + 5)?;
        let expires_at = OffsetDateTime::from_unix_timestamp(raw_expires_at).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 5, Type::Integer, Box::new(error))
        })?;

        Ok(PasswordResetOtp {
            id: row.get(offset)?,
            user_id: UserID::new(row.get(offset + 1)?),
            email: row.get(offset + 2)?,
            code: row.get(offset + 3)?,
            verified: row.get(offset + 4)?,
            expires_at,
        })
    }
}

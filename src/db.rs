/*! This module defines traits for interacting with the application's database
and the function that sets up the schema. */

use std::time::Duration;

use rusqlite::{Connection, Row};

use crate::{
    stores::sqlite::{SqliteBudgetStore, SqliteOtpStore, SqliteTransactionStore, SqliteUserStore},
    Error,
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create the tables and indexes for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// The row must contain the store's full column list, starting at index zero.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type, with the store's columns starting
    /// at the column index `offset`.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// How long a storage call may wait on a locked database before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the tables for the domain models if they do not exist.
///
/// # Errors
/// Returns an error if the tables could not be created or an SQL error occurred.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    connection.busy_timeout(BUSY_TIMEOUT)?;

    SqliteUserStore::create_table(connection)?;
    SqliteBudgetStore::create_table(connection)?;
    SqliteTransactionStore::create_table(connection)?;
    SqliteOtpStore::create_table(connection)?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("could not initialize database");

        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table'
                 AND name IN ('user', 'budget', 'budget_category', 'transaction', 'otp')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 5);
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("could not initialize database");
        initialize(&connection).expect("second initialize failed");
    }
}

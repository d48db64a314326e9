//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    auth::JwtKeys,
    db::initialize,
    mail::Mailer,
    pagination::PaginationConfig,
    storage::ObjectStorage,
    stores::sqlite::{SqliteBudgetStore, SqliteOtpStore, SqliteTransactionStore, SqliteUserStore},
    Error,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection shared by all stores.
    pub db_connection: Arc<Mutex<Connection>>,

    /// Handles user accounts.
    pub user_store: SqliteUserStore,

    /// The Budget Ledger.
    pub budget_store: SqliteBudgetStore,

    /// The Transaction Log.
    pub transaction_store: SqliteTransactionStore,

    /// Handles password reset one-time codes.
    pub otp_store: SqliteOtpStore,

    /// The keys for signing and verifying auth tokens.
    pub jwt_keys: JwtKeys,

    /// Stores profile pictures.
    pub object_storage: Arc<dyn ObjectStorage>,

    /// Delivers password reset codes.
    pub mailer: Arc<dyn Mailer>,

    /// The config that controls how list endpoints page their data.
    pub pagination_config: PaginationConfig,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        object_storage: Arc<dyn ObjectStorage>,
        mailer: Arc<dyn Mailer>,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            user_store: SqliteUserStore::new(connection.clone()),
            budget_store: SqliteBudgetStore::new(connection.clone()),
            transaction_store: SqliteTransactionStore::new(connection.clone()),
            otp_store: SqliteOtpStore::new(connection.clone()),
            jwt_keys: JwtKeys::from_secret(jwt_secret),
            object_storage,
            mailer,
            pagination_config,
            db_connection: connection,
        })
    }
}

// This impl tells the `Claims` extractor how to access the keys from our state.
impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_keys.clone()
    }
}

//! Defines the transaction store trait: the Transaction Log.

use std::{collections::BTreeMap, ops::RangeInclusive};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    models::{DatabaseID, Transaction, TransactionType, UserID},
    Error,
};

/// The fields needed to create a transaction.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub user_id: UserID,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub transaction_type: TransactionType,
    /// When the transaction happened. `None` defaults to the creation time.
    pub date: Option<OffsetDateTime>,
}

/// A partial update to a transaction. `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct TransactionUpdate {
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub date: Option<OffsetDateTime>,
}

/// The columns transactions can be sorted by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Date,
    Amount,
    Category,
    CreatedAt,
}

impl SortField {
    /// The database column backing the sort field.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Amount => "amount",
            SortField::Category => "category",
            SortField::CreatedAt => "created_at",
        }
    }
}

/// The order to sort transactions in a [TransactionQuery].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

/// Defines how transactions should be fetched from [TransactionStore::query].
#[derive(Clone, Debug)]
pub struct TransactionQuery {
    /// Only this user's transactions are ever returned.
    pub user_id: UserID,
    /// Include only transactions with this exact category label.
    pub category: Option<String>,
    /// Include only transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Include transactions within `date_range` (inclusive).
    pub date_range: Option<RangeInclusive<OffsetDateTime>>,
    /// Skip the first N matching transactions.
    pub offset: u64,
    /// Select up to the first N (`limit`) transactions after the offset.
    pub limit: u64,
    /// The column to order by.
    pub sort_field: SortField,
    /// The direction to order in.
    pub sort_order: SortOrder,
}

/// Totals over a user's transactions, computed directly from the transaction
/// log as a cross-check on the budget's cached totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_amount: f64,
    /// Per-category expense totals.
    pub category_breakdown: BTreeMap<String, f64>,
    pub transaction_count: u64,
}

/// Handles the creation, retrieval and mutation of transactions.
///
/// Every expense mutation is paired with exactly one compensating call into
/// the Budget Ledger, and the pair commits or rolls back as a unit: a
/// transaction must never exist unreflected in the budget, or vice versa.
pub trait TransactionStore {
    /// Create a new transaction, applying its budget delta when it is an
    /// expense.
    fn create(&self, new_transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Retrieve a transaction owned by `user_id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the id does not exist or belongs to
    /// another user.
    fn get(&self, id: DatabaseID, user_id: UserID) -> Result<Transaction, Error>;

    /// Update a transaction, reversing the old budget contribution and
    /// applying the new one when budget-relevant fields change.
    fn update(
        &self,
        id: DatabaseID,
        user_id: UserID,
        update: TransactionUpdate,
    ) -> Result<Transaction, Error>;

    /// Delete a transaction, reversing its budget contribution when it is an
    /// expense.
    fn delete(&self, id: DatabaseID, user_id: UserID) -> Result<(), Error>;

    /// Retrieve transactions in the way defined by `query`, along with the
    /// total number of matches ignoring offset and limit.
    fn query(&self, query: &TransactionQuery) -> Result<(Vec<Transaction>, u64), Error>;

    /// Compute income/expense totals and a per-category expense breakdown in
    /// a single pass over the log.
    fn summary(
        &self,
        user_id: UserID,
        date_range: Option<RangeInclusive<OffsetDateTime>>,
    ) -> Result<SpendingSummary, Error>;

    /// All of a user's transactions within `date_range`, newest first,
    /// optionally restricted to expenses. Used by the reporting aggregator.
    fn in_range(
        &self,
        user_id: UserID,
        date_range: RangeInclusive<OffsetDateTime>,
        expenses_only: bool,
    ) -> Result<Vec<Transaction>, Error>;
}

//! Implements a SQLite backed budget store: the Budget Ledger.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    db::{CreateTable, MapRow},
    models::{month_label, Budget, CategoryAllocation, CategoryBudget, DatabaseID, UserID},
    stores::BudgetStore,
    Error,
};

use super::with_busy_retry;

/// Maintains budgets and their per-category spend totals in a SQLite
/// database.
///
/// The spend columns are only ever written through the `*_tx` helpers in this
/// file, which keep `budget.total_spent` equal to the sum of the category
/// `spent_amount` values. [SqliteTransactionStore](super::SqliteTransactionStore)
/// calls the same helpers so a transaction write and its budget update share
/// one database transaction.
#[derive(Debug, Clone)]
pub struct SqliteBudgetStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteBudgetStore {
    /// Create a new budget store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

/// Get the ID of the user's budget row, inserting a zeroed budget for the
/// current month if none exists yet.
pub(crate) fn ensure_budget_tx(
    connection: &Connection,
    user_id: UserID,
) -> Result<DatabaseID, Error> {
    connection.execute(
        "INSERT INTO budget (user_id, month) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO NOTHING",
        (user_id.as_i64(), current_month_label()),
    )?;

    let id = connection.query_row(
        "SELECT id FROM budget WHERE user_id = ?1",
        [user_id.as_i64()],
        |row| row.get(0),
    )?;

    Ok(id)
}

/// Fetch the user's budget along with its category rows.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no budget row.
pub(crate) fn fetch_budget_tx(connection: &Connection, user_id: UserID) -> Result<Budget, Error> {
    let mut budget = connection
        .prepare("SELECT id, user_id, total_budget, total_spent, month FROM budget WHERE user_id = ?1")?
        .query_row([user_id.as_i64()], SqliteBudgetStore::map_row)?;

    budget.category_budgets = connection
        .prepare(
            "SELECT category, budget_amount, spent_amount, icon, color
             FROM budget_category WHERE budget_id = ?1 ORDER BY id",
        )?
        .query_map([budget.id], |row| {
            Ok(CategoryBudget {
                category: row.get(0)?,
                budget_amount: row.get(1)?,
                spent_amount: row.get(2)?,
                icon: row.get(3)?,
                color: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(budget)
}

/// Adjust the spend totals for one category by `delta`, clamped at a floor of
/// zero.
///
/// Inserts a zero-allocation category row when the category is new to the
/// budget, so every expense is reflected in exactly one category entry.
///
/// A reversal never takes back more than the category actually holds, and
/// the same clamped delta is applied to `total_spent` so it stays equal to
/// the sum of the category spent amounts.
pub(crate) fn apply_expense_delta_tx(
    connection: &Connection,
    user_id: UserID,
    category: &str,
    delta: f64,
) -> Result<(), Error> {
    let budget_id = ensure_budget_tx(connection, user_id)?;

    connection.execute(
        "INSERT INTO budget_category (budget_id, category) VALUES (?1, ?2)
         ON CONFLICT(budget_id, category) DO NOTHING",
        (budget_id, category),
    )?;

    let spent: f64 = connection.query_row(
        "SELECT spent_amount FROM budget_category WHERE budget_id = ?1 AND category = ?2",
        (budget_id, category),
        |row| row.get(0),
    )?;

    let delta = delta.max(-spent);

    connection.execute(
        "UPDATE budget_category SET spent_amount = spent_amount + ?3
         WHERE budget_id = ?1 AND category = ?2",
        (budget_id, category, delta),
    )?;

    connection.execute(
        "UPDATE budget SET total_spent = MAX(0, total_spent + ?2) WHERE id = ?1",
        (budget_id, delta),
    )?;

    Ok(())
}

/// The "YYYY-MM" label for the current month in UTC.
fn current_month_label() -> String {
    month_label(OffsetDateTime::now_utc().date())
}

impl BudgetStore for SqliteBudgetStore {
    /// Return the user's budget, creating a zeroed one if none exists yet.
    ///
    /// # Panics
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if an SQL related error occurred.
    fn get_or_init(&self, user_id: UserID) -> Result<Budget, Error> {
        with_busy_retry(|| {
            let connection = self.connection.lock().unwrap();
            let tx = connection.unchecked_transaction()?;

            ensure_budget_tx(&tx, user_id)?;
            let budget = fetch_budget_tx(&tx, user_id)?;

            tx.commit()?;
            Ok(budget)
        })
    }

    /// Adjust `total_spent` and the category's `spent_amount` by `delta`,
    /// clamped at a floor of zero.
    ///
    /// # Errors
    /// Returns [Error::Conflict] if the database stayed locked across all
    /// retries, or [Error::SqlError] for other SQL errors.
    fn apply_expense_delta(
        &self,
        user_id: UserID,
        category: &str,
        delta: f64,
    ) -> Result<(), Error> {
        with_busy_retry(|| {
            let connection = self.connection.lock().unwrap();
            let tx = connection.unchecked_transaction()?;

            apply_expense_delta_tx(&tx, user_id, category, delta)?;

            tx.commit()?;
            Ok(())
        })
    }

    /// Replace the allocation plan with `allocations`.
    ///
    /// Spend history is merged in per category: a caller-supplied
    /// `spent_amount` wins, otherwise the stored value is preserved,
    /// otherwise zero. `total_spent` is recomputed from the merged rows.
    /// Icon and color merge the same way, falling back to the defaults for
    /// categories the budget has not seen before.
    ///
    /// # Errors
    /// Returns [Error::EmptyCategory] if any allocation has a blank category
    /// label.
    fn set_allocations(
        &self,
        user_id: UserID,
        total_budget: f64,
        allocations: Vec<CategoryAllocation>,
    ) -> Result<Budget, Error> {
        if allocations
            .iter()
            .any(|allocation| allocation.category.trim().is_empty())
        {
            return Err(Error::EmptyCategory);
        }

        with_busy_retry(|| {
            let connection = self.connection.lock().unwrap();
            let tx = connection.unchecked_transaction()?;

            let budget_id = ensure_budget_tx(&tx, user_id)?;

            let stored_rows: Vec<(String, f64, String, String)> = tx
                .prepare(
                    "SELECT category, spent_amount, icon, color
                     FROM budget_category WHERE budget_id = ?1",
                )?
                .query_map([budget_id], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            tx.execute("DELETE FROM budget_category WHERE budget_id = ?1", [budget_id])?;

            let mut insert = tx.prepare(
                "INSERT OR REPLACE INTO budget_category
                 (budget_id, category, budget_amount, spent_amount, icon, color)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for allocation in &allocations {
                let stored = stored_rows
                    .iter()
                    .find(|(category, ..)| category == &allocation.category);

                let spent_amount = allocation
                    .spent_amount
                    .or_else(|| stored.map(|(_, spent, ..)| *spent))
                    .unwrap_or(0.0);
                let icon = allocation
                    .icon
                    .as_deref()
                    .or_else(|| stored.map(|(_, _, icon, _)| icon.as_str()))
                    .unwrap_or("category");
                let color = allocation
                    .color
                    .as_deref()
                    .or_else(|| stored.map(|(.., color)| color.as_str()))
                    .unwrap_or("#2196F3");

                insert.execute((
                    budget_id,
                    &allocation.category,
                    allocation.budget_amount,
                    spent_amount,
                    icon,
                    color,
                ))?;
            }

            drop(insert);

            tx.execute(
                "UPDATE budget
                 SET total_budget = ?2,
                     total_spent = (SELECT COALESCE(SUM(spent_amount), 0)
                                    FROM budget_category WHERE budget_id = ?1)
                 WHERE id = ?1",
                (budget_id, total_budget),
            )?;

            let budget = fetch_budget_tx(&tx, user_id)?;

            tx.commit()?;
            Ok(budget)
        })
    }

    /// Zero every spent amount, keep the allocations, and advance `month` to
    /// the current period label.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the user has no budget yet.
    fn reset_period(&self, user_id: UserID) -> Result<Budget, Error> {
        with_busy_retry(|| {
            let connection = self.connection.lock().unwrap();
            let tx = connection.unchecked_transaction()?;

            let rows_updated = tx.execute(
                "UPDATE budget SET total_spent = 0, month = ?2 WHERE user_id = ?1",
                (user_id.as_i64(), current_month_label()),
            )?;

            if rows_updated == 0 {
                return Err(Error::NotFound);
            }

            tx.execute(
                "UPDATE budget_category SET spent_amount = 0
                 WHERE budget_id = (SELECT id FROM budget WHERE user_id = ?1)",
                [user_id.as_i64()],
            )?;

            let budget = fetch_budget_tx(&tx, user_id)?;

            tx.commit()?;
            Ok(budget)
        })
    }
}

impl CreateTable for SqliteBudgetStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS budget (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER UNIQUE NOT NULL,
                    total_budget REAL NOT NULL DEFAULT 0,
                    total_spent REAL NOT NULL DEFAULT 0,
                    month TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS budget_category (
                    id INTEGER PRIMARY KEY,
                    budget_id INTEGER NOT NULL,
                    category TEXT NOT NULL,
                    budget_amount REAL NOT NULL DEFAULT 0,
                    spent_amount REAL NOT NULL DEFAULT 0,
                    icon TEXT NOT NULL DEFAULT 'category',
                    color TEXT NOT NULL DEFAULT '#2196F3',
                    UNIQUE(budget_id, category),
                    FOREIGN KEY(budget_id) REFERENCES budget(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteBudgetStore {
    type ReturnType = Budget;

    /// Maps the budget row only; the caller fills in `category_budgets`.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Budget {
            id: row.get(offset)?,
            user_id: UserID::new(row.get(offset + 1)?),
            total_budget: row.get(offset + 2)?,
            total_spent: row.get(offset + 3)?,
            category_budgets: Vec::new(),
            month: row.get(offset + 4)?,
        })
    }
}

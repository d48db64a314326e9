//! Implements a SQLite backed transaction store: the Transaction Log.
use std::{
    collections::BTreeMap,
    ops::RangeInclusive,
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::{params_from_iter, types::Type, types::Value, Connection, Row};
use time::OffsetDateTime;

use crate::{
    db::{CreateTable, MapRow},
    models::{DatabaseID, Transaction, TransactionType, UserID},
    stores::{
        transaction::{SortOrder, SpendingSummary, TransactionQuery},
        NewTransaction, TransactionStore, TransactionUpdate,
    },
    Error,
};

use super::{budget::apply_expense_delta_tx, with_busy_retry};

const TRANSACTION_COLUMNS: &str = "id, user_id, category, amount, description, type, date, created_at";

/// Stores transactions in a SQLite database.
///
/// Expense mutations and their compensating budget updates run inside one
/// database transaction on the shared connection, so a transaction can never
/// exist unreflected in the budget, or vice versa.
#[derive(Debug, Clone)]
pub struct SqliteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn get_tx(
        connection: &Connection,
        id: DatabaseID,
        user_id: UserID,
    ) -> Result<Transaction, Error> {
        let transaction = connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                 WHERE id = ?1 AND user_id = ?2"
            ))?
            .query_row((id, user_id.as_i64()), Self::map_row)?;

        Ok(transaction)
    }
}

/// Build the WHERE clause and parameter list shared by [TransactionStore::query]'s
/// count and page queries.
fn build_filter(query: &TransactionQuery) -> (String, Vec<Value>) {
    let mut clause_parts = vec!["user_id = ?1".to_string()];
    let mut parameters = vec![Value::Integer(query.user_id.as_i64())];

    if let Some(category) = &query.category {
        clause_parts.push(format!("category = ?{}", parameters.len() + 1));
        parameters.push(Value::Text(category.clone()));
    }

    if let Some(transaction_type) = query.transaction_type {
        clause_parts.push(format!("type = ?{}", parameters.len() + 1));
        parameters.push(Value::Text(transaction_type.as_str().to_string()));
    }

    if let Some(date_range) = &query.date_range {
        clause_parts.push(format!(
            "date BETWEEN ?{} AND ?{}",
            parameters.len() + 1,
            parameters.len() + 2,
        ));
        parameters.push(Value::Integer(date_range.start().unix_timestamp()));
        parameters.push(Value::Integer(date_range.end().unix_timestamp()));
    }

    (clause_parts.join(" AND "), parameters)
}

impl TransactionStore for SqliteTransactionStore {
    /// Create a new transaction, applying its amount to the owner's budget
    /// when it is an expense.
    ///
    /// # Panics
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    /// Returns [Error::Conflict] if the database stayed locked across all
    /// retries, or [Error::SqlError] for other SQL errors.
    fn create(&self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        with_busy_retry(|| {
            let connection = self.connection.lock().unwrap();
            let tx = connection.unchecked_transaction()?;

            let now = OffsetDateTime::now_utc();
            let date = new_transaction.date.unwrap_or(now);

            let transaction = tx
                .prepare(&format!(
                    "INSERT INTO \"transaction\"
                     (user_id, category, amount, description, type, date, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     RETURNING {TRANSACTION_COLUMNS}"
                ))?
                .query_row(
                    (
                        new_transaction.user_id.as_i64(),
                        &new_transaction.category,
                        new_transaction.amount,
                        &new_transaction.description,
                        new_transaction.transaction_type.as_str(),
                        date.unix_timestamp(),
                        now.unix_timestamp(),
                    ),
                    Self::map_row,
                )?;

            if transaction.transaction_type == TransactionType::Expense {
                apply_expense_delta_tx(
                    &tx,
                    transaction.user_id,
                    &transaction.category,
                    transaction.amount,
                )?;
            }

            tx.commit()?;
            Ok(transaction)
        })
    }

    /// Retrieve a transaction owned by `user_id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the id does not exist or belongs to
    /// another user.
    fn get(&self, id: DatabaseID, user_id: UserID) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        Self::get_tx(&connection, id, user_id)
    }

    /// Update a transaction, reversing its old budget contribution and
    /// applying the new one.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the id does not exist or belongs to
    /// another user.
    fn update(
        &self,
        id: DatabaseID,
        user_id: UserID,
        update: TransactionUpdate,
    ) -> Result<Transaction, Error> {
        with_busy_retry(|| {
            let connection = self.connection.lock().unwrap();
            let tx = connection.unchecked_transaction()?;

            let before = Self::get_tx(&tx, id, user_id)?;

            let after = tx
                .prepare(&format!(
                    "UPDATE \"transaction\"
                     SET category = ?1, amount = ?2, description = ?3, type = ?4, date = ?5
                     WHERE id = ?6 AND user_id = ?7
                     RETURNING {TRANSACTION_COLUMNS}"
                ))?
                .query_row(
                    (
                        update.category.as_ref().unwrap_or(&before.category),
                        update.amount.unwrap_or(before.amount),
                        update.description.as_ref().unwrap_or(&before.description),
                        update
                            .transaction_type
                            .unwrap_or(before.transaction_type)
                            .as_str(),
                        update.date.unwrap_or(before.date).unix_timestamp(),
                        id,
                        user_id.as_i64(),
                    ),
                    Self::map_row,
                )?;

            if before.transaction_type == TransactionType::Expense {
                apply_expense_delta_tx(&tx, user_id, &before.category, -before.amount)?;
            }

            if after.transaction_type == TransactionType::Expense {
                apply_expense_delta_tx(&tx, user_id, &after.category, after.amount)?;
            }

            tx.commit()?;
            Ok(after)
        })
    }

    /// Delete a transaction, reversing its budget contribution when it is an
    /// expense.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the id does not exist or belongs to
    /// another user.
    fn delete(&self, id: DatabaseID, user_id: UserID) -> Result<(), Error> {
        with_busy_retry(|| {
            let connection = self.connection.lock().unwrap();
            let tx = connection.unchecked_transaction()?;

            let transaction = Self::get_tx(&tx, id, user_id)?;

            tx.execute(
                "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
                (id, user_id.as_i64()),
            )?;

            if transaction.transaction_type == TransactionType::Expense {
                apply_expense_delta_tx(
                    &tx,
                    user_id,
                    &transaction.category,
                    -transaction.amount,
                )?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Query for transactions, returning the requested page and the total
    /// number of matches ignoring offset and limit.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if there is an SQL error.
    fn query(&self, query: &TransactionQuery) -> Result<(Vec<Transaction>, u64), Error> {
        let (where_clause, parameters) = build_filter(query);
        let connection = self.connection.lock().unwrap();

        let total: i64 = connection
            .prepare(&format!(
                "SELECT COUNT(*) FROM \"transaction\" WHERE {where_clause}"
            ))?
            .query_row(params_from_iter(parameters.iter()), |row| row.get(0))?;

        let order = match query.sort_order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };

        let transactions = connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                 WHERE {where_clause}
                 ORDER BY {} {order}, id DESC
                 LIMIT {} OFFSET {}",
                query.sort_field.column(),
                query.limit,
                query.offset,
            ))?
            .query_map(params_from_iter(parameters.iter()), Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((transactions, total as u64))
    }

    /// Compute income/expense totals and a per-category expense breakdown in
    /// a single pass over the user's transactions.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if there is an SQL error.
    fn summary(
        &self,
        user_id: UserID,
        date_range: Option<RangeInclusive<OffsetDateTime>>,
    ) -> Result<SpendingSummary, Error> {
        let query = TransactionQuery {
            user_id,
            category: None,
            transaction_type: None,
            date_range,
            offset: 0,
            limit: 0,
            sort_field: Default::default(),
            sort_order: Default::default(),
        };
        let (where_clause, parameters) = build_filter(&query);

        let transactions = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE {where_clause}"
            ))?
            .query_map(params_from_iter(parameters.iter()), Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary = SpendingSummary {
            total_income: 0.0,
            total_expenses: 0.0,
            net_amount: 0.0,
            category_breakdown: BTreeMap::new(),
            transaction_count: transactions.len() as u64,
        };

        for transaction in transactions {
            match transaction.transaction_type {
                TransactionType::Income => summary.total_income += transaction.amount,
                TransactionType::Expense => {
                    summary.total_expenses += transaction.amount;
                    *summary
                        .category_breakdown
                        .entry(transaction.category)
                        .or_insert(0.0) += transaction.amount;
                }
            }
        }

        summary.net_amount = summary.total_income - summary.total_expenses;

        Ok(summary)
    }

    /// All of the user's transactions within `date_range`, newest first.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if there is an SQL error.
    fn in_range(
        &self,
        user_id: UserID,
        date_range: RangeInclusive<OffsetDateTime>,
        expenses_only: bool,
    ) -> Result<Vec<Transaction>, Error> {
        let type_filter = if expenses_only {
            " AND type = 'expense'"
        } else {
            ""
        };

        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                 WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3{type_filter}
                 ORDER BY date DESC, id DESC"
            ))?
            .query_map(
                (
                    user_id.as_i64(),
                    date_range.start().unix_timestamp(),
                    date_range.end().unix_timestamp(),
                ),
                Self::map_row,
            )?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }
}

impl CreateTable for SqliteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    category TEXT NOT NULL,
                    amount REAL NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
                    date INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
             ON \"transaction\" (user_id, date DESC)",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_transaction_user_category
             ON \"transaction\" (user_id, category)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_type: String = row.get(offset + 5)?;
        let transaction_type = TransactionType::from_str(&raw_type).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 5, Type::Text, Box::new(error))
        })?;

        let raw_date: i64 = row.get(offset + 6)?;
        let date = OffsetDateTime::from_unix_timestamp(raw_date).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 6, Type::Integer, Box::new(error))
        })?;

        let raw_created_at: i64 = row.get(offset + 7)?;
        let created_at = OffsetDateTime::from_unix_timestamp(raw_created_at).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 7, Type::Integer, Box::new(error))
        })?;

        Ok(Transaction {
            id: row.get(offset)?,
            user_id: UserID::new(row.get(offset + 1)?),
            category: row.get(offset + 2)?,
            amount: row.get(offset + 3)?,
            description: row.get(offset + 4)?,
            transaction_type,
            date,
            created_at,
        })
    }
}

#[cfg(test)]
mod transaction_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{macros::datetime, Duration, OffsetDateTime};

    use crate::{
        db::initialize,
        models::{TransactionType, UserID},
        stores::{
            BudgetStore, NewTransaction, SortField, SortOrder, TransactionQuery, TransactionStore,
            TransactionUpdate,
        },
    };

    use super::{super::SqliteBudgetStore, Error, SqliteTransactionStore};

    fn get_stores() -> (SqliteTransactionStore, SqliteBudgetStore) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        // The transaction and budget tables' foreign keys need user rows to
        // point at.
        for (id, email) in [(1, "jane@bar.baz"), (2, "john@bar.baz")] {
            conn.execute(
                "INSERT INTO user (id, full_name, email, phone, password, created_at)
                 VALUES (?1, 'Jane Doe', ?2, '021555123', 'hash', 0)",
                (id, email),
            )
            .unwrap();
        }

        let connection = Arc::new(Mutex::new(conn));

        (
            SqliteTransactionStore::new(connection.clone()),
            SqliteBudgetStore::new(connection),
        )
    }

    fn expense(user_id: UserID, category: &str, amount: f64) -> NewTransaction {
        NewTransaction {
            user_id,
            category: category.to_owned(),
            amount,
            description: String::new(),
            transaction_type: TransactionType::Expense,
            date: None,
        }
    }

    fn base_query(user_id: UserID) -> TransactionQuery {
        TransactionQuery {
            user_id,
            category: None,
            transaction_type: None,
            date_range: None,
            offset: 0,
            limit: 100,
            sort_field: SortField::Date,
            sort_order: SortOrder::Descending,
        }
    }

    #[test]
    fn create_expense_updates_budget() {
        let (transactions, budgets) = get_stores();
        let user_id = UserID::new(1);

        transactions.create(expense(user_id, "Food", 120.0)).unwrap();

        let budget = budgets.get_or_init(user_id).unwrap();
        assert_eq!(budget.total_spent, 120.0);
        assert_eq!(budget.category_budgets[0].category, "Food");
        assert_eq!(budget.category_budgets[0].spent_amount, 120.0);
    }

    #[test]
    fn create_income_does_not_touch_budget() {
        let (transactions, budgets) = get_stores();
        let user_id = UserID::new(1);

        transactions
            .create(NewTransaction {
                transaction_type: TransactionType::Income,
                ..expense(user_id, "Salary", 5000.0)
            })
            .unwrap();

        let budget = budgets.get_or_init(user_id).unwrap();
        assert_eq!(budget.total_spent, 0.0);
        assert!(budget.category_budgets.is_empty());
    }

    #[test]
    fn create_defaults_date_to_now() {
        let (transactions, _) = get_stores();

        let created = transactions
            .create(expense(UserID::new(1), "Food", 10.0))
            .unwrap();

        assert!(OffsetDateTime::now_utc() - created.date < Duration::seconds(5));
        assert_eq!(created.date, created.created_at);
    }

    #[test]
    fn get_fails_for_other_users_transaction() {
        let (transactions, _) = get_stores();

        let created = transactions
            .create(expense(UserID::new(1), "Food", 10.0))
            .unwrap();

        assert_eq!(
            transactions.get(created.id, UserID::new(2)),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_restores_budget_exactly() {
        let (transactions, budgets) = get_stores();
        let user_id = UserID::new(1);

        let created = transactions.create(expense(user_id, "Food", 120.0)).unwrap();
        transactions.create(expense(user_id, "Food", 30.0)).unwrap();

        transactions.delete(created.id, user_id).unwrap();

        let budget = budgets.get_or_init(user_id).unwrap();
        assert_eq!(budget.total_spent, 30.0);
        assert_eq!(budget.category_budgets[0].spent_amount, 30.0);
    }

    #[test]
    fn delete_fails_for_other_users_transaction() {
        let (transactions, budgets) = get_stores();
        let user_id = UserID::new(1);

        let created = transactions.create(expense(user_id, "Food", 120.0)).unwrap();

        assert_eq!(
            transactions.delete(created.id, UserID::new(2)),
            Err(Error::NotFound)
        );

        // The owner's budget must be untouched by the failed delete.
        let budget = budgets.get_or_init(user_id).unwrap();
        assert_eq!(budget.total_spent, 120.0);
    }

    #[test]
    fn update_moves_spend_between_categories() {
        let (transactions, budgets) = get_stores();
        let user_id = UserID::new(1);

        let created = transactions.create(expense(user_id, "Food", 500.0)).unwrap();

        let updated = transactions
            .update(
                created.id,
                user_id,
                TransactionUpdate {
                    category: Some("Transport".to_owned()),
                    amount: Some(300.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.category, "Transport");
        assert_eq!(updated.amount, 300.0);

        let budget = budgets.get_or_init(user_id).unwrap();
        assert_eq!(budget.total_spent, 300.0);

        let food = budget
            .category_budgets
            .iter()
            .find(|c| c.category == "Food")
            .unwrap();
        let transport = budget
            .category_budgets
            .iter()
            .find(|c| c.category == "Transport")
            .unwrap();
        assert_eq!(food.spent_amount, 0.0);
        assert_eq!(transport.spent_amount, 300.0);
    }

    #[test]
    fn update_to_income_reverses_spend() {
        let (transactions, budgets) = get_stores();
        let user_id = UserID::new(1);

        let created = transactions.create(expense(user_id, "Food", 500.0)).unwrap();

        transactions
            .update(
                created.id,
                user_id,
                TransactionUpdate {
                    transaction_type: Some(TransactionType::Income),
                    ..Default::default()
                },
            )
            .unwrap();

        let budget = budgets.get_or_init(user_id).unwrap();
        assert_eq!(budget.total_spent, 0.0);
    }

    #[test]
    fn query_filters_by_category_and_type() {
        let (transactions, _) = get_stores();
        let user_id = UserID::new(1);

        transactions.create(expense(user_id, "Food", 10.0)).unwrap();
        transactions.create(expense(user_id, "Transport", 20.0)).unwrap();
        transactions
            .create(NewTransaction {
                transaction_type: TransactionType::Income,
                ..expense(user_id, "Food", 100.0)
            })
            .unwrap();

        let (results, total) = transactions
            .query(&TransactionQuery {
                category: Some("Food".to_owned()),
                transaction_type: Some(TransactionType::Expense),
                ..base_query(user_id)
            })
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].amount, 10.0);
    }

    #[test]
    fn query_filters_by_date_range() {
        let (transactions, _) = get_stores();
        let user_id = UserID::new(1);

        for (day, amount) in [(1, 10.0), (15, 20.0), (28, 30.0)] {
            transactions
                .create(NewTransaction {
                    date: Some(datetime!(2026-08-01 12:00 UTC).replace_day(day).unwrap()),
                    ..expense(user_id, "Food", amount)
                })
                .unwrap();
        }

        let (results, total) = transactions
            .query(&TransactionQuery {
                date_range: Some(
                    datetime!(2026-08-10 00:00 UTC)..=datetime!(2026-08-20 00:00 UTC),
                ),
                ..base_query(user_id)
            })
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(results[0].amount, 20.0);
    }

    #[test]
    fn query_pages_and_reports_full_total() {
        let (transactions, _) = get_stores();
        let user_id = UserID::new(1);

        for amount in [10.0, 20.0, 30.0, 40.0, 50.0] {
            transactions.create(expense(user_id, "Food", amount)).unwrap();
        }

        let (results, total) = transactions
            .query(&TransactionQuery {
                offset: 2,
                limit: 2,
                sort_field: SortField::Amount,
                sort_order: SortOrder::Ascending,
                ..base_query(user_id)
            })
            .unwrap();

        assert_eq!(total, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].amount, 30.0);
        assert_eq!(results[1].amount, 40.0);
    }

    #[test]
    fn query_never_returns_other_users_transactions() {
        let (transactions, _) = get_stores();

        transactions.create(expense(UserID::new(1), "Food", 10.0)).unwrap();
        transactions.create(expense(UserID::new(2), "Food", 20.0)).unwrap();

        let (results, total) = transactions.query(&base_query(UserID::new(1))).unwrap();

        assert_eq!(total, 1);
        assert_eq!(results[0].user_id, UserID::new(1));
    }

    #[test]
    fn summary_totals_and_breakdown() {
        let (transactions, _) = get_stores();
        let user_id = UserID::new(1);

        transactions.create(expense(user_id, "Food", 100.0)).unwrap();
        transactions.create(expense(user_id, "Food", 50.0)).unwrap();
        transactions.create(expense(user_id, "Transport", 25.0)).unwrap();
        transactions
            .create(NewTransaction {
                transaction_type: TransactionType::Income,
                ..expense(user_id, "Salary", 500.0)
            })
            .unwrap();

        let summary = transactions.summary(user_id, None).unwrap();

        assert_eq!(summary.total_income, 500.0);
        assert_eq!(summary.total_expenses, 175.0);
        assert_eq!(summary.net_amount, 325.0);
        assert_eq!(summary.transaction_count, 4);
        assert_eq!(summary.category_breakdown["Food"], 150.0);
        assert_eq!(summary.category_breakdown["Transport"], 25.0);
    }

    #[test]
    fn in_range_returns_newest_first() {
        let (transactions, _) = get_stores();
        let user_id = UserID::new(1);

        for day in [5, 20, 10] {
            transactions
                .create(NewTransaction {
                    date: Some(datetime!(2026-08-01 12:00 UTC).replace_day(day).unwrap()),
                    ..expense(user_id, "Food", f64::from(day))
                })
                .unwrap();
        }

        let results = transactions
            .in_range(
                user_id,
                datetime!(2026-08-01 00:00 UTC)..=datetime!(2026-08-31 23:59 UTC),
                true,
            )
            .unwrap();

        let days: Vec<f64> = results.iter().map(|t| t.amount).collect();
        assert_eq!(days, vec![20.0, 10.0, 5.0]);
    }

    #[test]
    fn in_range_can_exclude_income() {
        let (transactions, _) = get_stores();
        let user_id = UserID::new(1);

        transactions
            .create(NewTransaction {
                date: Some(datetime!(2026-08-15 12:00 UTC)),
                ..expense(user_id, "Food", 10.0)
            })
            .unwrap();
        transactions
            .create(NewTransaction {
                transaction_type: TransactionType::Income,
                date: Some(datetime!(2026-08-15 12:00 UTC)),
                ..expense(user_id, "Salary", 500.0)
            })
            .unwrap();

        let range = datetime!(2026-08-01 00:00 UTC)..=datetime!(2026-08-31 23:59 UTC);

        let expenses = transactions.in_range(user_id, range.clone(), true).unwrap();
        let all = transactions.in_range(user_id, range, false).unwrap();

        assert_eq!(expenses.len(), 1);
        assert_eq!(all.len(), 2);
    }
}

//! The reporting endpoints: period-bucketed spending reports and category
//! comparisons between two date windows.
//!
//! Reports are read-only views that combine the budget's totals with detail
//! from the transaction log.

use std::{collections::BTreeMap, ops::RangeInclusive, str::FromStr};

use axum::{
    extract::{Json, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use time::{
    format_description::well_known::Rfc3339, macros::time, Date, Duration, Month, OffsetDateTime,
};

use crate::{
    auth::Claims,
    dates::parse_date_param,
    models::{Budget, Transaction, TransactionType},
    stores::{BudgetStore, TransactionStore},
    AppState, Error,
};

/// The reporting windows a user can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    /// The default period.
    Month,
    Year,
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(Error::InvalidPeriod(other.to_owned())),
        }
    }
}

/// The calendar window a period covers, relative to `today`.
///
/// Weeks run Sunday through Saturday.
fn period_range(period: Period, today: Date) -> RangeInclusive<OffsetDateTime> {
    let (start, end) = match period {
        Period::Day => (today, today),
        Period::Week => {
            let start = today
                - Duration::days(i64::from(today.weekday().number_days_from_sunday()));
            (start, start + Duration::days(6))
        }
        Period::Month => {
            let start = today.replace_day(1).expect("day 1 is valid in every month");
            let end = start
                .replace_day(today.month().length(today.year()))
                .expect("last day of month is valid");
            (start, end)
        }
        Period::Year => {
            let start = Date::from_calendar_date(today.year(), Month::January, 1)
                .expect("January 1 is valid in every year");
            let end = Date::from_calendar_date(today.year(), Month::December, 31)
                .expect("December 31 is valid in every year");
            (start, end)
        }
    };

    start.midnight().assume_utc()..=end.with_time(time!(23:59:59)).assume_utc()
}

/// One chart bar in the time series.
#[derive(Debug, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub label: &'static str,
    pub amount: f64,
    /// The bar's amount normalized to the tallest bar, in 0..=1.
    pub height: f64,
}

fn bucket_labels(period: Period) -> &'static [&'static str] {
    match period {
        Period::Day => &["06:00", "09:00", "12:00", "15:00", "18:00", "21:00"],
        Period::Week => &["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
        Period::Month => &["W1", "W2", "W3", "W4"],
        Period::Year => &[
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ],
    }
}

/// Which bucket a transaction date falls into, or `None` when it falls
/// outside every bucket (before 06:00 on a day report, or past day 28 on a
/// month report).
fn bucket_index(period: Period, date: OffsetDateTime) -> Option<usize> {
    match period {
        Period::Day => {
            let hour = usize::from(date.hour());
            (hour >= 6).then(|| ((hour - 6) / 3).min(5))
        }
        Period::Week => Some(usize::from(date.weekday().number_days_from_sunday())),
        Period::Month => {
            let index = usize::from(date.day() - 1) / 7;
            (index < 4).then_some(index)
        }
        Period::Year => Some(usize::from(u8::from(date.month())) - 1),
    }
}

/// Sum expense transactions into the period's fixed buckets and normalize
/// each bucket against the tallest one for direct chart rendering.
fn build_time_series(period: Period, transactions: &[Transaction]) -> Vec<TimeSeriesPoint> {
    let labels = bucket_labels(period);
    let mut amounts = vec![0.0; labels.len()];

    for transaction in transactions {
        if transaction.transaction_type != TransactionType::Expense {
            continue;
        }

        if let Some(index) = bucket_index(period, transaction.date) {
            amounts[index] += transaction.amount;
        }
    }

    // A floor of 1 keeps an empty period at height 0 rather than NaN.
    let max_amount = amounts.iter().copied().fold(1.0_f64, f64::max);

    labels
        .iter()
        .zip(amounts)
        .map(|(label, amount)| TimeSeriesPoint {
            label,
            amount,
            height: amount / max_amount,
        })
        .collect()
}

/// One category's row in the report breakdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryReportEntry {
    total: f64,
    budget_amount: f64,
    count: u64,
    percentage: i64,
    /// Whether the category came from the allocation plan rather than only
    /// appearing in transactions.
    from_budget: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

/// Merge the allocation plan's categories with the period's expense totals.
///
/// Budget categories appear even with no in-period transactions (showing the
/// ledger's spent amount), and transaction-only categories appear with a zero
/// allocation. Sorted descending by total.
fn category_breakdown(
    budget: &Budget,
    transactions: &[Transaction],
    total_spent: f64,
) -> Map<String, Value> {
    let mut entries: BTreeMap<String, CategoryReportEntry> = budget
        .category_budgets
        .iter()
        .map(|category| {
            (
                category.category.clone(),
                CategoryReportEntry {
                    total: category.spent_amount,
                    budget_amount: category.budget_amount,
                    count: 0,
                    percentage: 0,
                    from_budget: true,
                    icon: Some(category.icon.clone()),
                    color: Some(category.color.clone()),
                },
            )
        })
        .collect();

    let mut period_totals: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for transaction in transactions {
        if transaction.transaction_type != TransactionType::Expense {
            continue;
        }

        let (total, count) = period_totals.entry(&transaction.category).or_default();
        *total += transaction.amount;
        *count += 1;
    }

    for (category, (total, count)) in period_totals {
        match entries.get_mut(category) {
            Some(entry) => {
                entry.total = total;
                entry.count = count;
            }
            None => {
                entries.insert(
                    category.to_owned(),
                    CategoryReportEntry {
                        total,
                        budget_amount: 0.0,
                        count,
                        percentage: 0,
                        from_budget: false,
                        icon: None,
                        color: None,
                    },
                );
            }
        }
    }

    for entry in entries.values_mut() {
        entry.percentage = if total_spent > 0.0 {
            (entry.total / total_spent * 100.0).round() as i64
        } else {
            0
        };
    }

    let mut sorted: Vec<(String, CategoryReportEntry)> = entries.into_iter().collect();
    sorted.sort_by(|(_, a), (_, b)| b.total.total_cmp(&a.total));

    sorted
        .into_iter()
        .map(|(category, entry)| (category, json!(entry)))
        .collect()
}

/// The query parameters accepted by the reports endpoint.
#[derive(Deserialize, Default)]
pub struct ReportParams {
    pub period: Option<String>,
}

/// The query parameters accepted by the comparison endpoint. All four are
/// required.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonParams {
    pub period1_start: Option<String>,
    pub period1_end: Option<String>,
    pub period2_start: Option<String>,
    pub period2_end: Option<String>,
}

fn rfc3339(date: OffsetDateTime) -> String {
    date.format(&Rfc3339)
        .unwrap_or_else(|_| date.unix_timestamp().to_string())
}

/// Handler for the period spending report.
///
/// # Errors
/// Returns [Error::InvalidPeriod] if `period` is not one of day, week, month
/// or year.
pub async fn period_report(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<ReportParams>,
) -> Result<Response, Error> {
    let period = params
        .period
        .as_deref()
        .map(Period::from_str)
        .transpose()?
        .unwrap_or(Period::Month);

    let date_range = period_range(period, OffsetDateTime::now_utc().date());
    let user_id = claims.user_id();

    let budget = state.budget_store.get_or_init(user_id)?;
    let transactions = state
        .transaction_store
        .in_range(user_id, date_range.clone(), false)?;

    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    for transaction in &transactions {
        match transaction.transaction_type {
            TransactionType::Income => total_income += transaction.amount,
            TransactionType::Expense => total_expenses += transaction.amount,
        }
    }

    // The ledger's running total is authoritative; the in-period expense sum
    // only stands in for users with no ledger activity yet.
    let total_spent = if budget.total_spent > 0.0 {
        budget.total_spent
    } else {
        total_expenses
    };
    let budget_used_percentage = if budget.total_budget > 0.0 {
        (total_spent / budget.total_budget * 100.0).round() as i64
    } else {
        0
    };

    let period_label = match period {
        Period::Day => "day",
        Period::Week => "week",
        Period::Month => "month",
        Period::Year => "year",
    };

    Ok(Json(json!({
        "success": true,
        "period": period_label,
        "dateRange": {
            "start": rfc3339(*date_range.start()),
            "end": rfc3339(*date_range.end()),
        },
        "summary": {
            "totalIncome": total_income,
            "totalExpenses": total_expenses,
            "totalSpent": total_spent,
            "totalBudget": budget.total_budget,
            "budgetUsedPercentage": budget_used_percentage,
            "netAmount": total_income - total_expenses,
            "transactionCount": transactions.len(),
        },
        "categoryBreakdown": category_breakdown(&budget, &transactions, total_spent),
        "timeSeriesData": build_time_series(period, &transactions),
        "budgetData": {
            "hasBudget": true,
            "totalBudget": budget.total_budget,
            "totalSpent": budget.total_spent,
            "month": budget.month,
        },
    }))
    .into_response())
}

fn required_param<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, Error> {
    value.as_deref().ok_or(Error::MissingField(name))
}

fn expense_totals_by_category(transactions: &[Transaction]) -> (BTreeMap<String, f64>, f64, usize) {
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = 0.0;

    for transaction in transactions {
        *by_category.entry(transaction.category.clone()).or_default() += transaction.amount;
        total += transaction.amount;
    }

    (by_category, total, transactions.len())
}

fn change_stats(period1_amount: f64, period2_amount: f64) -> (f64, i64, &'static str) {
    let difference = period2_amount - period1_amount;
    let percentage_change = if period1_amount > 0.0 {
        (difference / period1_amount * 100.0).round() as i64
    } else if period2_amount > 0.0 {
        100
    } else {
        0
    };
    let trend = if difference > 0.0 {
        "increased"
    } else if difference < 0.0 {
        "decreased"
    } else {
        "unchanged"
    };

    (difference, percentage_change, trend)
}

/// Handler for comparing expense totals per category between two windows.
///
/// # Errors
/// Returns [Error::MissingField] if any of the four period boundaries is
/// absent, or [Error::InvalidDateRange] if a window does not parse or ends
/// before it starts.
pub async fn category_comparison(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<ComparisonParams>,
) -> Result<Response, Error> {
    let period1_start = parse_date_param(required_param(&params.period1_start, "period1Start")?, false)?;
    let period1_end = parse_date_param(required_param(&params.period1_end, "period1End")?, true)?;
    let period2_start = parse_date_param(required_param(&params.period2_start, "period2Start")?, false)?;
    let period2_end = parse_date_param(required_param(&params.period2_end, "period2End")?, true)?;

    if period1_end < period1_start || period2_end < period2_start {
        return Err(Error::InvalidDateRange);
    }

    let user_id = claims.user_id();
    let period1_transactions =
        state
            .transaction_store
            .in_range(user_id, period1_start..=period1_end, true)?;
    let period2_transactions =
        state
            .transaction_store
            .in_range(user_id, period2_start..=period2_end, true)?;

    let (period1_categories, period1_total, period1_count) =
        expense_totals_by_category(&period1_transactions);
    let (period2_categories, period2_total, period2_count) =
        expense_totals_by_category(&period2_transactions);

    let mut comparison = Map::new();
    let categories: std::collections::BTreeSet<&String> = period1_categories
        .keys()
        .chain(period2_categories.keys())
        .collect();
    for category in categories {
        let period1_amount = period1_categories.get(category).copied().unwrap_or(0.0);
        let period2_amount = period2_categories.get(category).copied().unwrap_or(0.0);
        let (difference, percentage_change, trend) = change_stats(period1_amount, period2_amount);

        comparison.insert(
            category.clone(),
            json!({
                "period1": period1_amount,
                "period2": period2_amount,
                "difference": difference,
                "percentageChange": percentage_change,
                "trend": trend,
            }),
        );
    }

    let (overall_difference, overall_percentage_change, overall_trend) =
        change_stats(period1_total, period2_total);

    Ok(Json(json!({
        "success": true,
        "period1": {
            "start": rfc3339(period1_start),
            "end": rfc3339(period1_end),
            "total": period1_total,
            "transactionCount": period1_count,
        },
        "period2": {
            "start": rfc3339(period2_start),
            "end": rfc3339(period2_end),
            "total": period2_total,
            "transactionCount": period2_count,
        },
        "overall": {
            "difference": overall_difference,
            "percentageChange": overall_percentage_change,
            "trend": overall_trend,
        },
        "categoryComparison": comparison,
    }))
    .into_response())
}

#[cfg(test)]
mod period_tests {
    use time::macros::{date, datetime};

    use super::{bucket_index, period_range, Period};

    #[test]
    fn day_range_covers_single_date() {
        let range = period_range(Period::Day, date!(2026 - 08 - 19));

        assert_eq!(*range.start(), datetime!(2026-08-19 00:00:00 UTC));
        assert_eq!(*range.end(), datetime!(2026-08-19 23:59:59 UTC));
    }

    #[test]
    fn week_range_runs_sunday_to_saturday() {
        // 2026-08-19 is a Wednesday.
        let range = period_range(Period::Week, date!(2026 - 08 - 19));

        assert_eq!(*range.start(), datetime!(2026-08-16 00:00:00 UTC));
        assert_eq!(*range.end(), datetime!(2026-08-22 23:59:59 UTC));
    }

    #[test]
    fn week_range_starts_on_today_when_today_is_sunday() {
        let range = period_range(Period::Week, date!(2026 - 08 - 16));

        assert_eq!(*range.start(), datetime!(2026-08-16 00:00:00 UTC));
    }

    #[test]
    fn month_range_handles_short_months() {
        let range = period_range(Period::Month, date!(2026 - 02 - 10));

        assert_eq!(*range.start(), datetime!(2026-02-01 00:00:00 UTC));
        assert_eq!(*range.end(), datetime!(2026-02-28 23:59:59 UTC));
    }

    #[test]
    fn year_range_covers_whole_year() {
        let range = period_range(Period::Year, date!(2026 - 08 - 19));

        assert_eq!(*range.start(), datetime!(2026-01-01 00:00:00 UTC));
        assert_eq!(*range.end(), datetime!(2026-12-31 23:59:59 UTC));
    }

    #[test]
    fn unknown_period_is_rejected() {
        assert!("decade".parse::<Period>().is_err());
        assert_eq!("Week".parse::<Period>(), Ok(Period::Week));
    }

    #[test]
    fn day_buckets_cover_three_hour_slots() {
        assert_eq!(bucket_index(Period::Day, datetime!(2026-08-19 05:59:00 UTC)), None);
        assert_eq!(bucket_index(Period::Day, datetime!(2026-08-19 06:00:00 UTC)), Some(0));
        assert_eq!(bucket_index(Period::Day, datetime!(2026-08-19 08:59:59 UTC)), Some(0));
        assert_eq!(bucket_index(Period::Day, datetime!(2026-08-19 09:00:00 UTC)), Some(1));
        assert_eq!(bucket_index(Period::Day, datetime!(2026-08-19 21:30:00 UTC)), Some(5));
        assert_eq!(bucket_index(Period::Day, datetime!(2026-08-19 23:59:00 UTC)), Some(5));
    }

    #[test]
    fn month_buckets_skip_days_past_twenty_eight() {
        assert_eq!(bucket_index(Period::Month, datetime!(2026-08-01 12:00:00 UTC)), Some(0));
        assert_eq!(bucket_index(Period::Month, datetime!(2026-08-08 12:00:00 UTC)), Some(1));
        assert_eq!(bucket_index(Period::Month, datetime!(2026-08-28 12:00:00 UTC)), Some(3));
        assert_eq!(bucket_index(Period::Month, datetime!(2026-08-29 12:00:00 UTC)), None);
    }
}

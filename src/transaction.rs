//! The transaction endpoints: CRUD over the Transaction Log plus the list,
//! recent, and summary views.

use std::str::FromStr;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    auth::Claims,
    dates::parse_date_param,
    error::require_field,
    models::{DatabaseID, TransactionType},
    pagination::Pagination,
    stores::{
        NewTransaction, SortField, SortOrder, TransactionQuery, TransactionStore, TransactionUpdate,
    },
    AppState, Error,
};

/// The fields for creating a transaction.
#[derive(Deserialize)]
pub struct CreateTransactionForm {
    #[serde(default)]
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub transaction_type: String,
    pub date: Option<String>,
}

/// The fields for updating a transaction. Omitted fields are left unchanged.
#[derive(Deserialize)]
pub struct UpdateTransactionForm {
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub date: Option<String>,
}

/// The query parameters accepted by the list endpoint.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsParams {
    pub page: Option<u64>,
    /// The page size. `pageSize` is accepted as a synonym.
    #[serde(alias = "pageSize")]
    pub limit: Option<u64>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
}

/// The query parameters accepted by the summary endpoint.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// The query parameters accepted by the recent-transactions endpoint.
#[derive(Deserialize, Default)]
pub struct RecentParams {
    pub limit: Option<u64>,
}

fn parse_transaction_type(value: &str) -> Result<TransactionType, Error> {
    TransactionType::from_str(value.trim())
}

/// Interpret optional start/end query parameters as an inclusive date range.
///
/// # Errors
/// Returns [Error::InvalidDateRange] if only one bound is supplied, a bound
/// does not parse, or the end precedes the start.
fn parse_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<std::ops::RangeInclusive<OffsetDateTime>>, Error> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start = parse_date_param(start, false)?;
            let end = parse_date_param(end, true)?;

            if end < start {
                return Err(Error::InvalidDateRange);
            }

            Ok(Some(start..=end))
        }
        _ => Err(Error::InvalidDateRange),
    }
}

/// Handler for creating a transaction.
///
/// Expenses are reflected in the caller's budget atomically with the insert.
///
/// # Errors
/// Returns an error if the category is blank, the amount is not positive,
/// the type is unknown, or the date does not parse.
pub async fn create_transaction(
    State(state): State<AppState>,
    claims: Claims,
    Json(form): Json<CreateTransactionForm>,
) -> Result<Response, Error> {
    let category = form.category.trim();
    if category.is_empty() {
        return Err(Error::EmptyCategory);
    }
    if form.amount <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }
    require_field(&form.transaction_type, "type")?;
    let transaction_type = parse_transaction_type(&form.transaction_type)?;

    let date = form
        .date
        .as_deref()
        .map(|value| parse_date_param(value, false))
        .transpose()?;

    let transaction = state.transaction_store.create(NewTransaction {
        user_id: claims.user_id(),
        category: category.to_owned(),
        amount: form.amount,
        description: form.description.trim().to_owned(),
        transaction_type,
        date,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "transaction created",
            "transaction": transaction,
        })),
    )
        .into_response())
}

/// Handler for listing transactions with filtering, sorting and paging.
pub async fn list_transactions(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<ListTransactionsParams>,
) -> Result<Response, Error> {
    let (page, page_size) = state.pagination_config.resolve(params.page, params.limit);

    let transaction_type = params
        .transaction_type
        .as_deref()
        .map(parse_transaction_type)
        .transpose()?;
    let date_range = parse_date_range(params.start_date.as_deref(), params.end_date.as_deref())?;

    let query = TransactionQuery {
        user_id: claims.user_id(),
        category: params.category,
        transaction_type,
        date_range,
        offset: (page - 1) * page_size,
        limit: page_size,
        sort_field: params.sort_by.unwrap_or_default(),
        sort_order: params.order.unwrap_or_default(),
    };

    let (transactions, total) = state.transaction_store.query(&query)?;

    Ok(Json(json!({
        "success": true,
        "transactions": transactions,
        "pagination": Pagination::new(page, page_size, total),
    }))
    .into_response())
}

/// The largest number of recent transactions a request may ask for.
const MAX_RECENT_LIMIT: u64 = 50;

/// Handler for the caller's most recent transactions.
pub async fn recent_transactions(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<RecentParams>,
) -> Result<Response, Error> {
    let limit = params.limit.unwrap_or(10).clamp(1, MAX_RECENT_LIMIT);

    let query = TransactionQuery {
        user_id: claims.user_id(),
        category: None,
        transaction_type: None,
        date_range: None,
        offset: 0,
        limit,
        sort_field: SortField::Date,
        sort_order: SortOrder::Descending,
    };

    let (transactions, _) = state.transaction_store.query(&query)?;

    Ok(Json(json!({
        "success": true,
        "transactions": transactions,
    }))
    .into_response())
}

/// Handler for income/expense totals over the transaction log.
pub async fn transaction_summary(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<SummaryParams>,
) -> Result<Response, Error> {
    let date_range = parse_date_range(params.start_date.as_deref(), params.end_date.as_deref())?;

    let summary = state
        .transaction_store
        .summary(claims.user_id(), date_range)?;

    Ok(Json(json!({
        "success": true,
        "summary": summary,
    }))
    .into_response())
}

/// Handler for reading a single transaction.
///
/// # Errors
/// Returns [Error::NotFound] if the id does not exist or belongs to another
/// user.
pub async fn get_transaction(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let transaction = state
        .transaction_store
        .get(transaction_id, claims.user_id())?;

    Ok(Json(json!({
        "success": true,
        "transaction": transaction,
    }))
    .into_response())
}

/// Handler for updating a transaction.
///
/// The old budget contribution is reversed and the new one applied in the
/// same atomic unit as the update itself.
pub async fn update_transaction(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
    Json(form): Json<UpdateTransactionForm>,
) -> Result<Response, Error> {
    if let Some(category) = &form.category {
        if category.trim().is_empty() {
            return Err(Error::EmptyCategory);
        }
    }
    if form.amount.is_some_and(|amount| amount <= 0.0) {
        return Err(Error::NonPositiveAmount);
    }

    let transaction_type = form
        .transaction_type
        .as_deref()
        .map(parse_transaction_type)
        .transpose()?;
    let date = form
        .date
        .as_deref()
        .map(|value| parse_date_param(value, false))
        .transpose()?;

    let transaction = state.transaction_store.update(
        transaction_id,
        claims.user_id(),
        TransactionUpdate {
            category: form.category.map(|category| category.trim().to_owned()),
            amount: form.amount,
            description: form.description.map(|text| text.trim().to_owned()),
            transaction_type,
            date,
        },
    )?;

    Ok(Json(json!({
        "success": true,
        "message": "transaction updated",
        "transaction": transaction,
    }))
    .into_response())
}

/// Handler for deleting a transaction.
///
/// # Errors
/// Returns [Error::NotFound] if the id does not exist or belongs to another
/// user.
pub async fn delete_transaction(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    state
        .transaction_store
        .delete(transaction_id, claims.user_id())?;

    Ok(Json(json!({
        "success": true,
        "message": "transaction deleted",
    }))
    .into_response())
}

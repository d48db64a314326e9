//! The budget endpoints: reading the budget, replacing the allocation plan,
//! and rolling the period over.

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::Claims,
    models::{Budget, CategoryAllocation},
    stores::BudgetStore,
    AppState, Error,
};

/// The fields for replacing the allocation plan.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBudgetForm {
    pub total_budget: f64,
    #[serde(default)]
    pub category_budgets: Vec<CategoryAllocation>,
}

/// The budget as returned to clients, with the derived convenience fields.
fn budget_payload(budget: &Budget) -> Value {
    json!({
        "id": budget.id,
        "userId": budget.user_id,
        "totalBudget": budget.total_budget,
        "totalSpent": budget.total_spent,
        "categoryBudgets": budget.category_budgets,
        "month": budget.month,
        "budgetLeft": budget.budget_left(),
        "budgetUsedPercentage": budget.budget_used_percentage(),
    })
}

/// Handler for reading the caller's budget.
///
/// A zeroed budget is created on first access, so this never fails with
/// NotFound.
pub async fn get_budget(State(state): State<AppState>, claims: Claims) -> Result<Response, Error> {
    let budget = state.budget_store.get_or_init(claims.user_id())?;

    Ok(Json(json!({
        "success": true,
        "budget": budget_payload(&budget),
    }))
    .into_response())
}

/// Handler for replacing the caller's allocation plan.
///
/// Spend history is preserved for categories that omit `spentAmount`; see
/// [BudgetStore::set_allocations].
///
/// # Errors
/// Returns [Error::NegativeAmount] if any amount is negative, or
/// [Error::EmptyCategory] if a category label is blank.
pub async fn put_budget(
    State(state): State<AppState>,
    claims: Claims,
    Json(form): Json<SetBudgetForm>,
) -> Result<Response, Error> {
    if form.total_budget < 0.0 {
        return Err(Error::NegativeAmount("totalBudget"));
    }

    for allocation in &form.category_budgets {
        if allocation.budget_amount < 0.0 {
            return Err(Error::NegativeAmount("budgetAmount"));
        }
        if allocation.spent_amount.is_some_and(|spent| spent < 0.0) {
            return Err(Error::NegativeAmount("spentAmount"));
        }
    }

    let budget = state.budget_store.set_allocations(
        claims.user_id(),
        form.total_budget,
        form.category_budgets,
    )?;

    Ok(Json(json!({
        "success": true,
        "message": "budget updated",
        "budget": budget_payload(&budget),
    }))
    .into_response())
}

/// Handler for rolling the caller's budget into a new accounting period.
///
/// # Errors
/// Returns [Error::NotFound] if the caller has no budget yet.
pub async fn reset_budget(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Response, Error> {
    let budget = state.budget_store.reset_period(claims.user_id())?;

    Ok(Json(json!({
        "success": true,
        "message": "budget reset for the new period",
        "budget": budget_payload(&budget),
    }))
    .into_response())
}

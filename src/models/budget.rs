//! This file defines a user's budget: the allocation plan and the spend
//! totals the Budget Ledger keeps in sync with the transaction log.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::models::{DatabaseID, UserID};

/// The icon assigned to categories created without one.
pub const DEFAULT_CATEGORY_ICON: &str = "category";

/// The color assigned to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#2196F3";

/// A single category's slice of the budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBudget {
    /// The category label, unique within a budget.
    pub category: String,
    /// How much the user plans to spend on this category.
    pub budget_amount: f64,
    /// How much has actually been spent, maintained by the Budget Ledger.
    pub spent_amount: f64,
    /// The icon name shown by clients.
    pub icon: String,
    /// The hex display color shown by clients.
    pub color: String,
}

/// A user's budget for the current accounting period.
///
/// Invariant: `total_spent` equals the sum of the category `spent_amount`
/// values, and only the Budget Ledger writes either of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: DatabaseID,
    /// The user that owns the budget. One budget per user.
    pub user_id: UserID,
    /// The user-set allocation ceiling for the period.
    pub total_budget: f64,
    /// The derived total of all category spent amounts.
    pub total_spent: f64,
    /// The per-category allocations and spend totals.
    pub category_budgets: Vec<CategoryBudget>,
    /// The current accounting period as a "YYYY-MM" label.
    pub month: String,
}

impl Budget {
    /// How much of the allocation remains.
    pub fn budget_left(&self) -> f64 {
        self.total_budget - self.total_spent
    }

    /// The percentage of the allocation spent, rounded to the nearest whole
    /// number. Zero when no allocation has been set, avoiding a division by
    /// zero.
    pub fn budget_used_percentage(&self) -> i64 {
        if self.total_budget > 0.0 {
            (self.total_spent / self.total_budget * 100.0).round() as i64
        } else {
            0
        }
    }
}

/// One category entry in a [set_allocations](crate::stores::BudgetStore::set_allocations)
/// request.
///
/// `spent_amount` is optional on purpose: when omitted the server preserves
/// the spend history it already has for the category, so an allocation edit
/// cannot silently zero out real spending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAllocation {
    pub category: String,
    pub budget_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spent_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Format a date as the "YYYY-MM" period label used by [Budget::month].
pub fn month_label(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

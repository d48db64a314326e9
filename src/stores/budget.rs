//! Defines the budget store trait: the Budget Ledger.

use crate::{
    models::{Budget, CategoryAllocation, UserID},
    Error,
};

/// Maintains each user's budget and owns its consistency invariant:
/// `total_spent` always equals the sum of the category `spent_amount` values,
/// and every expense transaction is reflected in exactly one category entry.
///
/// No other component may write `total_spent` or `spent_amount`.
pub trait BudgetStore {
    /// Return the user's budget, creating a zeroed one if none exists yet.
    ///
    /// Absence is a valid initial state, so this never returns
    /// [Error::NotFound].
    fn get_or_init(&self, user_id: UserID) -> Result<Budget, Error>;

    /// Adjust `total_spent` and the matching category's `spent_amount` by
    /// `delta`, atomically with respect to concurrent calls for the same user.
    ///
    /// Results are clamped at a floor of 0 so drift from earlier partial
    /// failures can never produce negative spend. A missing category entry is
    /// created with a zero allocation.
    fn apply_expense_delta(&self, user_id: UserID, category: &str, delta: f64)
        -> Result<(), Error>;

    /// Replace the allocation plan.
    ///
    /// For each category, a caller-supplied `spent_amount` wins; otherwise the
    /// stored value is preserved; otherwise 0. `total_spent` is recomputed
    /// from the merged categories, never taken from the request.
    fn set_allocations(
        &self,
        user_id: UserID,
        total_budget: f64,
        allocations: Vec<CategoryAllocation>,
    ) -> Result<Budget, Error>;

    /// Roll the budget over into a new accounting period: zero every spent
    /// amount, keep the allocations, and advance `month` to the current
    /// period label.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the user has no budget yet.
    fn reset_period(&self, user_id: UserID) -> Result<Budget, Error>;
}

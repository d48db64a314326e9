//! The API endpoint URIs.

/// The route for registering a new account.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/logout";
/// The route to request a password reset code.
pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
/// The route to prove knowledge of a password reset code.
pub const VERIFY_OTP: &str = "/api/auth/verify-otp";
/// The route to set a new password with a verified reset token.
pub const RESET_PASSWORD: &str = "/api/auth/reset-password";

/// The route to read and update the caller's profile.
pub const PROFILE: &str = "/api/profile";
/// The route to upload or delete the caller's profile picture.
pub const PROFILE_PICTURE: &str = "/api/profile/picture";

/// The route to read and replace the caller's budget.
pub const BUDGET: &str = "/api/budget";
/// The route to roll the budget over into a new accounting period.
pub const BUDGET_RESET: &str = "/api/budget/reset";

/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for the caller's most recent transactions.
pub const RECENT_TRANSACTIONS: &str = "/api/transactions/recent";
/// The route for income/expense totals over the transaction log.
pub const TRANSACTION_SUMMARY: &str = "/api/transactions/summary";

/// The route prefix that serves uploaded profile pictures.
pub const UPLOADS: &str = "/uploads";

/// The route for period-bucketed spending reports.
pub const REPORTS: &str = "/api/reports";
/// The route for comparing category spend across two periods.
pub const CATEGORY_COMPARISON: &str = "/api/reports/category-comparison";

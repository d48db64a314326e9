//! Defines the domain models of the application and their supporting types.

mod budget;
mod otp;
mod password;
mod transaction;
mod user;

pub use budget::{
    month_label, Budget, CategoryAllocation, CategoryBudget, DEFAULT_CATEGORY_COLOR,
    DEFAULT_CATEGORY_ICON,
};
pub use otp::PasswordResetOtp;
pub use password::{PasswordHash, ValidatedPassword, MIN_PASSWORD_LENGTH};
pub use transaction::{Transaction, TransactionType};
pub use user::{User, UserID, UserView};

/// An alias for the integer row IDs used by the database.
pub type DatabaseID = i64;

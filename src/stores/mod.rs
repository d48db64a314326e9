//! Contains traits and implementations for objects that store the domain
//! [models](crate::models).

mod budget;
mod otp;
mod transaction;
mod user;

pub mod sqlite;

pub use budget::BudgetStore;
pub use otp::OtpStore;
pub use transaction::{
    NewTransaction, SortField, SortOrder, SpendingSummary, TransactionQuery, TransactionStore,
    TransactionUpdate,
};
pub use user::{NewUser, ProfileUpdate, UserStore};

//! This file defines the one-time code used to authorize a password reset.

use time::OffsetDateTime;

use crate::models::{DatabaseID, UserID};

/// A password reset one-time code.
///
/// Created when a user requests a reset (replacing any prior codes for that
/// user), flipped to `verified` exactly once, and deleted when the reset
/// completes or the code expires.
#[derive(Clone, Debug, PartialEq)]
pub struct PasswordResetOtp {
    /// The ID of the OTP record.
    pub id: DatabaseID,
    /// The user the code was issued for.
    pub user_id: UserID,
    /// The email the code was sent to, stored lowercase.
    pub email: String,
    /// The 6-digit code.
    pub code: String,
    /// Whether the user has already proven knowledge of the code.
    pub verified: bool,
    /// The hard expiry after which the code is purged.
    pub expires_at: OffsetDateTime,
}

impl PasswordResetOtp {
    /// Whether the code's expiry has passed at time `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

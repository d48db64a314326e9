//! Defines the store trait for password reset one-time codes.

use time::OffsetDateTime;

use crate::{
    models::{DatabaseID, PasswordResetOtp, UserID},
    Error,
};

/// Handles the lifecycle of password reset one-time codes.
///
/// A user has at most one live code: issuing a new one replaces any earlier
/// codes for that user.
pub trait OtpStore {
    /// Delete any earlier codes for `user_id` and store a fresh one.
    fn replace(
        &self,
        user_id: UserID,
        email: &str,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetOtp, Error>;

    /// Find a code for `user_id` matching `code` and the given verification
    /// state. Expired codes are still returned so the caller can report
    /// expiry rather than a generic mismatch.
    fn find(
        &self,
        user_id: UserID,
        code: &str,
        verified: bool,
    ) -> Result<Option<PasswordResetOtp>, Error>;

    /// Find the user's verified code, if they have one. Expired codes are
    /// still returned so the caller can report expiry.
    fn find_verified(&self, user_id: UserID) -> Result<Option<PasswordResetOtp>, Error>;

    /// Mark a code as verified.
    fn mark_verified(&self, id: DatabaseID) -> Result<(), Error>;

    /// Delete a code.
    fn delete(&self, id: DatabaseID) -> Result<(), Error>;

    /// Delete every code issued for `user_id`, e.g. once a password reset
    /// completes.
    fn delete_for_user(&self, user_id: UserID) -> Result<(), Error>;

    /// Delete all codes whose expiry has passed at time `now`.
    fn purge_expired(&self, now: OffsetDateTime) -> Result<(), Error>;
}

//! Defines the mail collaborator used to deliver password reset codes.

use crate::Error;

/// Sends password reset codes to users.
///
/// OTP issuance must succeed independent of mail delivery: callers persist
/// the code first and report a send failure in the response metadata instead
/// of failing the request.
pub trait Mailer: Send + Sync {
    /// Send `code` to `recipient`.
    fn send_otp(&self, recipient: &str, code: &str) -> Result<(), Error>;
}

/// A mailer that writes the code to the server log instead of sending mail.
/// Suitable for tests and local development.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_otp(&self, recipient: &str, code: &str) -> Result<(), Error> {
        tracing::info!("password reset code for {recipient}: {code}");

        Ok(())
    }
}

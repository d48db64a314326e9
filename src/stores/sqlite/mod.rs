//! Implements the store traits on top of a SQLite database.
//!
//! All stores share a single `Arc<Mutex<Connection>>`, so writes within one
//! process are serialized by the mutex. The busy timeout and the retry helper
//! below cover the case where another process holds the database lock.

use std::{thread, time::Duration};

use crate::Error;

mod budget;
mod otp;
mod transaction;
mod user;

pub use budget::SqliteBudgetStore;
pub use otp::SqliteOtpStore;
pub use transaction::SqliteTransactionStore;
pub use user::SqliteUserStore;

/// How many times a write is attempted before giving up with
/// [Error::Conflict].
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Run `operation`, retrying with a short backoff when the database reports
/// it is busy.
pub(crate) fn with_busy_retry<T>(mut operation: impl FnMut() -> Result<T, Error>) -> Result<T, Error> {
    let mut attempt = 1;

    loop {
        match operation() {
            Err(Error::Conflict) if attempt < MAX_WRITE_ATTEMPTS => {
                thread::sleep(Duration::from_millis(25 * u64::from(attempt)));
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod with_busy_retry_tests {
    use crate::Error;

    use super::with_busy_retry;

    #[test]
    fn returns_first_success() {
        let result = with_busy_retry(|| Ok::<_, Error>(42));

        assert_eq!(result, Ok(42));
    }

    #[test]
    fn retries_until_conflict_clears() {
        let mut attempts = 0;

        let result = with_busy_retry(|| {
            attempts += 1;
            if attempts < 3 {
                Err(Error::Conflict)
            } else {
                Ok(attempts)
            }
        });

        assert_eq!(result, Ok(3));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut attempts = 0;

        let result: Result<(), Error> = with_busy_retry(|| {
            attempts += 1;
            Err(Error::Conflict)
        });

        assert_eq!(result, Err(Error::Conflict));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn does_not_retry_other_errors() {
        let mut attempts = 0;

        let result: Result<(), Error> = with_busy_retry(|| {
            attempts += 1;
            Err(Error::NotFound)
        });

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(attempts, 1);
    }
}

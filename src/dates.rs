//! Parsing for the date strings accepted in query parameters.

use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime, Time};

use crate::Error;

/// Parse a query parameter as either an RFC 3339 date-time or a plain
/// "YYYY-MM-DD" date.
///
/// A plain date is widened to the start of that day in UTC, or to the last
/// second of the day when `end_of_day` is set, so that "2026-08-01" to
/// "2026-08-31" covers the whole month inclusively.
///
/// # Errors
/// Returns [Error::InvalidDateRange] if the value parses as neither format.
pub fn parse_date_param(value: &str, end_of_day: bool) -> Result<OffsetDateTime, Error> {
    if let Ok(date_time) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(date_time);
    }

    let format = time::macros::format_description!("[year]-[month]-[day]");
    let date = Date::parse(value, &format).map_err(|_| Error::InvalidDateRange)?;

    let time = if end_of_day {
        Time::from_hms(23, 59, 59).expect("23:59:59 is a valid time")
    } else {
        Time::MIDNIGHT
    };

    Ok(date.with_time(time).assume_utc())
}

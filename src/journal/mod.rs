//! Journal data model and entry storage.
//!
//! - `entry`: the `Entry` and `Message` types for one calendar day
//! - `store`: the `EntryStore` owning the date → entry mapping

pub mod entry;
pub mod store;

pub use entry::{Entry, Message, MessageKind};
pub use store::EntryStore;

use crate::constants::{DATE_FORMAT_COMPACT, DATE_FORMAT_ISO};
use chrono::{DateTime, NaiveDate, Utc};

/// Formats a date as an entry key (`YYYY-MM-DD`).
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use daybook::journal::date_key;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(date_key(date), "2024-01-15");
/// ```
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT_ISO).to_string()
}

/// Entry key for the calendar day containing `now`.
///
/// Day boundaries are evaluated in UTC.
pub fn date_key_for(now: DateTime<Utc>) -> String {
    date_key(now.date_naive())
}

/// Parses a date in `YYYY-MM-DD` or `YYYYMMDD` format.
///
/// # Examples
///
/// ```
/// use daybook::journal::parse_date;
///
/// assert_eq!(parse_date("2024-01-15").unwrap().to_string(), "2024-01-15");
/// assert_eq!(parse_date("20240115").unwrap().to_string(), "2024-01-15");
/// assert!(parse_date("15/01/2024").is_err());
/// ```
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT_ISO)
        .or_else(|_| NaiveDate::parse_from_str(date_str, DATE_FORMAT_COMPACT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_key_for_uses_utc_day() {
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(date_key_for(late), "2024-01-01");
        assert_eq!(date_key_for(early), "2024-01-02");
    }

    #[test]
    fn test_parse_date_rejects_invalid_day() {
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("invalid-date").is_err());
    }
}

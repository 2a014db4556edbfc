//! Calendar date helpers

use chrono::{NaiveDate, Utc};

/// Today's date in UTC, with the time of day stripped.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Format a date as an ISO 8601 calendar date (`YYYY-MM-DD`).
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(iso_date(date), "2024-03-07");
    }
}

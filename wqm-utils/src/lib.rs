//! Shared utility functions for WQM crates.

/// Date utility functions
pub mod dates {
    use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

    /// Calendar-date layouts accepted in the `Date` column, tried in order.
    /// Month-first wins over day-first for slash-separated dates.
    pub const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

    /// Time-of-day suffixes accepted after any of the [`DATE_FORMATS`].
    const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Format a timestamp the way exports write it: date only when the time
    /// is midnight, otherwise "YYYY-MM-DD HH:MM:SS".
    pub fn format_timestamp(ts: &NaiveDateTime) -> String {
        if ts.time() == NaiveTime::MIN {
            format_date(&ts.date())
        } else {
            ts.format("%Y-%m-%d %H:%M:%S").to_string()
        }
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Permissive timestamp parsing for data cells.
    ///
    /// Returns `None` for anything that is not a recognizable calendar date;
    /// callers treat that as a null timestamp, never as a failure.
    pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Some(ts);
        }
        for date_format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, date_format) {
                return Some(date.and_time(NaiveTime::MIN));
            }
            for time_format in TIME_FORMATS {
                let layout = format!("{} {}", date_format, time_format);
                if let Ok(ts) = NaiveDateTime::parse_from_str(s, &layout) {
                    return Some(ts);
                }
            }
        }
        None
    }

    /// "YYYY-MM" label for a month bucket.
    pub fn month_label(year: i32, month: u32) -> String {
        format!("{:04}-{:02}", year, month)
    }

    /// (year, month) of a timestamp.
    pub fn year_month(ts: &NaiveDateTime) -> (i32, u32) {
        (ts.year(), ts.month())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        }

        #[test]
        fn test_parse_timestamp_date_layouts() {
            assert_eq!(parse_timestamp("2023-01-15"), Some(ymd(2023, 1, 15)));
            assert_eq!(parse_timestamp("2023/01/15"), Some(ymd(2023, 1, 15)));
            assert_eq!(parse_timestamp("01/15/2023"), Some(ymd(2023, 1, 15)));
            assert_eq!(parse_timestamp("15.01.2023"), Some(ymd(2023, 1, 15)));
            assert_eq!(parse_timestamp("20230115"), Some(ymd(2023, 1, 15)));
            assert_eq!(parse_timestamp("  2023-01-15 "), Some(ymd(2023, 1, 15)));
        }

        #[test]
        fn test_parse_timestamp_with_time() {
            let expected = NaiveDate::from_ymd_opt(2023, 6, 1)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap();
            assert_eq!(parse_timestamp("2023-06-01 14:30"), Some(expected));
            assert_eq!(parse_timestamp("2023-06-01 14:30:00"), Some(expected));
            assert_eq!(parse_timestamp("2023-06-01T14:30:00"), Some(expected));
            assert_eq!(parse_timestamp("2023-06-01T14:30:00-05:00"), Some(expected));
        }

        #[test]
        fn test_parse_timestamp_rejects_garbage() {
            assert_eq!(parse_timestamp(""), None);
            assert_eq!(parse_timestamp("not a date"), None);
            assert_eq!(parse_timestamp("2023-13-01"), None);
            assert_eq!(parse_timestamp("2023-02-30"), None);
        }

        #[test]
        fn test_format_timestamp() {
            assert_eq!(format_timestamp(&ymd(2023, 6, 15)), "2023-06-15");
            let with_time = NaiveDate::from_ymd_opt(2023, 6, 15)
                .unwrap()
                .and_hms_opt(8, 5, 9)
                .unwrap();
            assert_eq!(format_timestamp(&with_time), "2023-06-15 08:05:09");
        }

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_month_label() {
            assert_eq!(month_label(2023, 1), "2023-01");
            assert_eq!(year_month(&ymd(2024, 11, 3)), (2024, 11));
        }
    }
}

/// Cell-level parsing shared by the loader and exporters.
pub mod cells {
    use anyhow::Context;

    /// Tokens read as a missing value (compared case-insensitively after trim).
    pub const MISSING_TOKENS: [&str; 8] = ["", "na", "n/a", "nan", "null", "none", "-", "---"];

    /// True if the cell holds one of the [`MISSING_TOKENS`].
    pub fn is_missing(cell: &str) -> bool {
        let lowered = cell.trim().to_lowercase();
        MISSING_TOKENS.contains(&lowered.as_str())
    }

    /// Parse a numeric cell.
    ///
    /// `Ok(None)` for a missing value (including a literal NaN), an error
    /// when the cell has content that is not a number.
    pub fn parse_float(cell: &str) -> anyhow::Result<Option<f64>> {
        if is_missing(cell) {
            return Ok(None);
        }
        let value: f64 = cell
            .trim()
            .parse()
            .with_context(|| format!("Not a number: {:?}", cell))?;
        Ok((!value.is_nan()).then_some(value))
    }

}

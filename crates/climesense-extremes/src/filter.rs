//! Selects the historical observations that fall on a target month/day.

use crate::series::{DailySeries, DATE_KEY_FORMAT};
use chrono::{Datelike, NaiveDate};

/// Year of `date_key` when it parses and falls on `month` (and `day`, if given).
pub(crate) fn matches_date(date_key: &str, month: u32, day: Option<u32>) -> Option<i32> {
    let date = NaiveDate::parse_from_str(date_key, DATE_KEY_FORMAT).ok()?;
    if date.month() != month {
        return None;
    }
    match day {
        Some(d) if date.day() != d => None,
        _ => Some(date.year()),
    }
}

/// `(year, value)` pairs from `series` on the target date, in series order.
///
/// With `target_day` absent the whole month matches, so a year can appear
/// once per day of that month. Malformed date keys are skipped.
pub fn filter_by_date(
    series: &DailySeries,
    target_month: u32,
    target_day: Option<u32>,
) -> Vec<(i32, f64)> {
    series
        .iter()
        .filter_map(|(key, value)| {
            matches_date(key, target_month, target_day).map(|year| (year, *value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(entries: &[(&str, f64)]) -> DailySeries {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_filters_month_and_day() {
        let s = series(&[
            ("20190615", 30.0),
            ("20190616", 31.0),
            ("20200615", 32.0),
            ("20200715", 33.0),
        ]);
        assert_eq!(filter_by_date(&s, 6, Some(15)), vec![(2019, 30.0), (2020, 32.0)]);
    }

    #[test]
    fn test_whole_month_when_day_absent() {
        let s = series(&[("20190601", 1.0), ("20190630", 2.0), ("20190701", 3.0)]);
        assert_eq!(filter_by_date(&s, 6, None), vec![(2019, 1.0), (2019, 2.0)]);
    }

    #[test]
    fn test_malformed_keys_are_skipped() {
        let s = series(&[
            ("2019-06-15", 1.0),
            ("banana", 2.0),
            ("20190631", 3.0),
            ("20190615", 4.0),
        ]);
        assert_eq!(filter_by_date(&s, 6, Some(15)), vec![(2019, 4.0)]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let s = series(&[("20190615", 1.0)]);
        assert!(filter_by_date(&s, 12, Some(25)).is_empty());
        assert!(filter_by_date(&DailySeries::new(), 6, None).is_empty());
    }

    #[test]
    fn test_leap_day() {
        let s = series(&[("20200229", 5.0), ("20210301", 6.0)]);
        assert_eq!(filter_by_date(&s, 2, Some(29)), vec![(2020, 5.0)]);
    }
}

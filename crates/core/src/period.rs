//! Time-window filtering of dated series and the coverage/intensity factors
//! derived from it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::filters::FULL_HISTORY_DAYS;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const INTENSITY_FLOOR: f64 = 0.25;

/// A domain's filtered series together with how much history it represents.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodWindow<T> {
    pub points: Vec<T>,
    pub coverage: f64,
    pub intensity: f64,
}

impl<T: Clone> PeriodWindow<T> {
    pub fn over<F>(series: &[T], period_days: u32, date_of: F) -> Self
    where
        F: Fn(&T) -> &str,
    {
        let points = filter_by_period(series, period_days, date_of);
        let coverage = coverage_factor(points.len(), series.len());
        Self { points, coverage, intensity: intensity(coverage) }
    }
}

/// Keeps the entries within `period_days` of the latest dated entry.
///
/// `0` and anything at or above a year return the whole series in its
/// original order. Otherwise the result is sorted ascending by date; entries
/// whose date cannot be parsed are left out.
pub fn filter_by_period<T, F>(series: &[T], period_days: u32, date_of: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    if series.is_empty() {
        return Vec::new();
    }
    if period_days == 0 || period_days >= FULL_HISTORY_DAYS {
        return series.to_vec();
    }

    let mut dated: Vec<(i64, &T)> = series
        .iter()
        .filter_map(|item| parse_timestamp_millis(date_of(item)).map(|millis| (millis, item)))
        .collect();
    dated.sort_by_key(|(millis, _)| *millis);

    let Some(&(anchor, _)) = dated.last() else {
        return Vec::new();
    };
    let window = i64::from(period_days) * MILLIS_PER_DAY;

    dated
        .into_iter()
        .filter(|(millis, _)| anchor - millis <= window)
        .map(|(_, item)| item.clone())
        .collect()
}

/// Fraction of history retained by a window, never zero.
pub fn coverage_factor(filtered_len: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        return 1.0;
    }
    let factor = filtered_len as f64 / total_len as f64;
    if factor > 0.0 {
        factor
    } else {
        1.0 / total_len as f64
    }
}

/// Damped scaling multiplier in `[0.55, 1.0]`.
pub fn intensity(factor: f64) -> f64 {
    0.6 * factor.clamp(INTENSITY_FLOOR, 1.0) + 0.4
}

/// Milliseconds since the epoch for RFC 3339, offset-free ISO date-time,
/// `YYYY-MM-DD` or `YYYY-MM` strings; bare dates are taken as UTC midnight.
pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc).timestamp_millis());
    }
    // Offset-free date-times are read as UTC.
    if let Some(timestamp) = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(timestamp.and_utc().timestamp_millis());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::{coverage_factor, filter_by_period, intensity, parse_timestamp_millis, PeriodWindow};

    #[derive(Clone, Debug, PartialEq)]
    struct Point {
        date: &'static str,
        value: u32,
    }

    fn point(date: &'static str, value: u32) -> Point {
        Point { date, value }
    }

    fn date_of(point: &Point) -> &str {
        point.date
    }

    fn series() -> Vec<Point> {
        vec![
            point("2024-06-01", 6),
            point("2024-01-01", 1),
            point("2024-04-01", 4),
            point("2024-03-01", 3),
            point("2024-05-01", 5),
            point("2024-02-01", 2),
        ]
    }

    #[test]
    fn empty_series_stays_empty() {
        let empty: Vec<Point> = Vec::new();
        assert!(filter_by_period(&empty, 30, date_of).is_empty());
        assert!(filter_by_period(&empty, 0, date_of).is_empty());
        assert!(filter_by_period(&empty, 400, date_of).is_empty());
    }

    #[test]
    fn full_history_sentinel_preserves_original_order() {
        let data = series();
        assert_eq!(filter_by_period(&data, 365, date_of), data);
        assert_eq!(filter_by_period(&data, 730, date_of), data);
        assert_eq!(filter_by_period(&data, 0, date_of), data);
    }

    #[test]
    fn window_is_anchored_at_latest_date_and_inclusive() {
        let data = series();
        let filtered = filter_by_period(&data, 31, date_of);
        let values: Vec<u32> = filtered.iter().map(|p| p.value).collect();
        // May has 31 days, so 2024-05-01 sits exactly on the boundary.
        assert_eq!(values, vec![5, 6]);

        let filtered = filter_by_period(&data, 30, date_of);
        let values: Vec<u32> = filtered.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![6]);
    }

    #[test]
    fn window_result_is_sorted_ascending() {
        let data = series();
        let values: Vec<u32> =
            filter_by_period(&data, 120, date_of).iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3, 4, 5, 6]);
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let data = vec![point("2024-02-01", 1), point("2024-02-01", 2), point("2024-01-01", 0)];
        let values: Vec<u32> =
            filter_by_period(&data, 10, date_of).iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn unparseable_dates_are_dropped_from_windows() {
        let data = vec![point("not a date", 0), point("2024-02-01", 1)];
        let values: Vec<u32> =
            filter_by_period(&data, 30, date_of).iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1]);

        let undated = vec![point("soon", 0)];
        assert!(filter_by_period(&undated, 30, date_of).is_empty());
    }

    #[test]
    fn coverage_factor_never_returns_zero() {
        assert_eq!(coverage_factor(0, 0), 1.0);
        assert!((coverage_factor(3, 10) - 0.3).abs() < 1e-12);
        assert!((coverage_factor(0, 10) - 0.1).abs() < 1e-12);
        assert_eq!(coverage_factor(10, 10), 1.0);
    }

    #[test]
    fn intensity_is_damped_and_floored() {
        assert!((intensity(0.1) - 0.55).abs() < 1e-12);
        assert!((intensity(0.25) - 0.55).abs() < 1e-12);
        assert_eq!(intensity(0.1), intensity(0.25));
        assert!((intensity(1.0) - 1.0).abs() < 1e-12);
        assert!((intensity(3.0) - 1.0).abs() < 1e-12);
        assert!((intensity(0.5) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn window_bundles_coverage_and_intensity() {
        let data = series();
        let window = PeriodWindow::over(&data, 30, date_of);
        assert_eq!(window.points.len(), 1);
        assert!((window.coverage - 1.0 / 6.0).abs() < 1e-12);
        assert!((window.intensity - 0.55).abs() < 1e-12);
    }

    #[test]
    fn timestamps_accept_common_snapshot_formats() {
        let day = parse_timestamp_millis("2024-03-01").expect("plain date");
        let month = parse_timestamp_millis("2024-03").expect("year-month");
        let rfc = parse_timestamp_millis("2024-03-01T00:00:00Z").expect("rfc3339");
        let local = parse_timestamp_millis("2024-03-01T00:00:00").expect("offset-free");
        let spaced = parse_timestamp_millis("2024-03-01 00:00:00").expect("space separated");
        let fractional = parse_timestamp_millis("2024-03-01T00:00:00.000").expect("fractional");
        assert_eq!(day, month);
        assert_eq!(day, rfc);
        assert_eq!(day, local);
        assert_eq!(day, spaced);
        assert_eq!(day, fractional);
        assert_eq!(
            parse_timestamp_millis("2024-03-01T12:30:00").map(|millis| millis - day),
            Some(45_000_000)
        );
        assert!(parse_timestamp_millis("March").is_none());
    }

    #[test]
    fn offset_free_datetimes_stay_inside_windows() {
        let data = vec![
            point("2024-10-01T00:00:00", 10),
            point("2024-11-01 00:00:00", 11),
            point("2024-12-01T00:00:00", 12),
        ];
        let values: Vec<u32> =
            filter_by_period(&data, 90, date_of).iter().map(|p| p.value).collect();
        assert_eq!(values, vec![10, 11, 12]);

        // October 1st sits 61 days before the anchor.
        let values: Vec<u32> =
            filter_by_period(&data, 60, date_of).iter().map(|p| p.value).collect();
        assert_eq!(values, vec![11, 12]);
    }
}

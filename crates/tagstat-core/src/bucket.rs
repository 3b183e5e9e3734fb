//! Mapping of creation timestamps to bucket dates

use chrono::{DateTime, Datelike, Days, Utc};

use crate::types::{BucketDate, Granularity};

/// Bucket a UTC timestamp
///
/// `Day` keeps the calendar date; `Week` moves back to the Monday of the
/// ISO week containing it. Returns `None` when that Monday lies before the
/// earliest date chrono can represent.
///
/// # Examples
/// ```
/// use tagstat_core::bucket::bucket_date;
/// use tagstat_core::types::Granularity;
/// use chrono::{TimeZone, Utc};
///
/// // A Thursday
/// let ts = Utc.with_ymd_and_hms(2024, 3, 7, 18, 30, 0).unwrap();
/// let day = bucket_date(ts, Granularity::Day).unwrap();
/// let week = bucket_date(ts, Granularity::Week).unwrap();
/// assert_eq!(day.to_string(), "2024-03-07");
/// assert_eq!(week.to_string(), "2024-03-04");
/// ```
pub fn bucket_date(ts: DateTime<Utc>, granularity: Granularity) -> Option<BucketDate> {
    let date = ts.date_naive();
    match granularity {
        Granularity::Day => Some(BucketDate::new(date)),
        Granularity::Week => {
            let offset = u64::from(date.weekday().num_days_from_monday());
            date.checked_sub_days(Days::new(offset)).map(BucketDate::new)
        }
    }
}

/// Bucket a unix timestamp in seconds
///
/// Returns `None` when the timestamp or its bucket cannot be represented.
pub fn bucket_epoch(secs: i64, granularity: Granularity) -> Option<BucketDate> {
    DateTime::from_timestamp(secs, 0).and_then(|ts| bucket_date(ts, granularity))
}

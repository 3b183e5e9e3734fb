//! Query window calculation
//!
//! The collection window is given as two offsets in months before "now".
//! Both ends are moved back by whole calendar months (clamping the day to
//! the length of the target month), truncated to midnight UTC, and the end
//! day is included in full by extending the upper bound to the following
//! midnight. The result is the half-open interval `[start, end + 1 day)`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::{Result, TagstatError};

/// Gregorian leap year rule
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` (1-12) of `year`
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Shift a date by a number of calendar months
///
/// The day of month is clamped to the last day of the resulting month, so
/// March 31st shifted by -1 is February 29th in a leap year. Returns `None`
/// only when the result falls outside chrono's supported range.
///
/// # Examples
/// ```
/// use tagstat_core::window::shift_months;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
/// assert_eq!(shift_months(date, -1), NaiveDate::from_ymd_opt(2024, 2, 29));
/// assert_eq!(shift_months(date, 11), NaiveDate::from_ymd_opt(2025, 2, 28));
/// ```
pub fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let zero_based = (date.month0() as i32).checked_add(months)?;
    let year = date.year().checked_add(zero_based.div_euclid(12))?;
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Half-open UTC interval `[start, end)` covered by one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl QueryWindow {
    /// Build a window from explicit bounds
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(TagstatError::InvalidWindow(format!(
                "start {start} is not before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Build the window `from_months` back to `to_months` back, both ends
    /// at whole-day granularity and the end day included
    ///
    /// # Examples
    /// ```
    /// use tagstat_core::window::QueryWindow;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 7, 15, 13, 45, 0).unwrap();
    /// let window = QueryWindow::from_month_offsets(now, 6, 2).unwrap();
    /// assert_eq!(window.first_day().to_string(), "2024-01-15");
    /// assert_eq!(window.last_day().to_string(), "2024-05-15");
    /// assert_eq!(window.end().to_rfc3339(), "2024-05-16T00:00:00+00:00");
    /// ```
    pub fn from_month_offsets(now: DateTime<Utc>, from_months: u32, to_months: u32) -> Result<Self> {
        if from_months <= to_months {
            return Err(TagstatError::InvalidWindow(format!(
                "--months-from ({from_months}) must be greater than --months-to ({to_months})"
            )));
        }

        let today = now.date_naive();
        let start_day = months_back(today, from_months)?;
        let end_day = months_back(today, to_months)?;
        let end_exclusive = end_day
            .succ_opt()
            .ok_or_else(|| TagstatError::InvalidWindow(format!("{end_day} has no successor")))?;

        Self::new(midnight(start_day), midnight(end_exclusive))
    }

    /// Inclusive lower bound
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Inclusive lower bound in unix seconds (`fromdate`)
    pub fn start_epoch(&self) -> i64 {
        self.start.timestamp()
    }

    /// Exclusive upper bound in unix seconds (`todate`)
    pub fn end_epoch(&self) -> i64 {
        self.end.timestamp()
    }

    /// First calendar day in the window
    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Last calendar day fully covered by the window
    pub fn last_day(&self) -> NaiveDate {
        (self.end - Duration::seconds(1)).date_naive()
    }

    /// Whether a timestamp lies inside the window
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {} (inclusive)", self.first_day(), self.last_day())
    }
}

fn months_back(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    let delta = i32::try_from(months)
        .map_err(|_| TagstatError::InvalidWindow(format!("{months} months is out of range")))?;
    shift_months(date, -delta)
        .ok_or_else(|| TagstatError::InvalidWindow(format!("{date} minus {months} months is out of range")))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

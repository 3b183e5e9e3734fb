//! Core domain types for tagstat
//!
//! This module contains the fundamental types used throughout the tagstat
//! crates: validated tag names, bucket dates, the count table the
//! aggregator fills, and the wire types exchanged with the Stack Exchange
//! API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::{Result, TagstatError};

/// Strongly-typed tag name
///
/// Tags are non-empty and contain neither whitespace nor `;`. The API
/// treats `;` in the `tagged` parameter as a conjunction of several tags,
/// which would silently change what is being counted.
///
/// # Examples
/// ```
/// use tagstat_core::types::Tag;
///
/// let tag = Tag::new("rust").unwrap();
/// assert_eq!(tag.as_str(), "rust");
/// assert!(Tag::new("rust;go").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Create a new Tag, rejecting names the API cannot filter on
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TagstatError::InvalidArgument(
                "tag names must not be empty".to_string(),
            ));
        }
        if trimmed.contains(';') || trimmed.chars().any(char::is_whitespace) {
            return Err(TagstatError::InvalidArgument(format!(
                "'{trimmed}' is not a single tag (no whitespace or ';' allowed)"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Time bucket granularity
///
/// # Examples
/// ```
/// use tagstat_core::types::Granularity;
/// use std::str::FromStr;
///
/// assert_eq!(Granularity::from_str("week").unwrap(), Granularity::Week);
/// assert_eq!(Granularity::Day.to_string(), "day");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per calendar day
    #[default]
    Day,
    /// One bucket per ISO week, keyed by its Monday
    Week,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(format!("Invalid granularity: {s} (expected 'day' or 'week')")),
        }
    }
}

/// Calendar date a question is counted under
///
/// Orders chronologically, which for `YYYY-MM-DD` labels is the same as
/// comparing the rendered strings.
///
/// # Examples
/// ```
/// use tagstat_core::types::BucketDate;
/// use chrono::NaiveDate;
///
/// let date = BucketDate::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
/// assert_eq!(date.to_string(), "2024-03-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketDate(NaiveDate);

impl BucketDate {
    /// Create a new BucketDate
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Get the inner NaiveDate
    pub fn inner(&self) -> &NaiveDate {
        &self.0
    }

    /// Format with a chrono format string
    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }
}

impl fmt::Display for BucketDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Key of a single count: one bucket for one tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountKey {
    pub bucket: BucketDate,
    pub tag: Tag,
}

impl CountKey {
    pub fn new(bucket: BucketDate, tag: Tag) -> Self {
        Self { bucket, tag }
    }
}

/// One line of the output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub date: String,
    pub tag: String,
    pub questions_count: u64,
}

/// Question counts keyed by (bucket, tag)
///
/// Counts only ever grow. Iteration is ordered by bucket, then tag.
///
/// # Examples
/// ```
/// use tagstat_core::types::{BucketDate, CountTable, Tag};
/// use chrono::NaiveDate;
///
/// let mut table = CountTable::new();
/// let tag = Tag::new("go").unwrap();
/// let day = BucketDate::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
/// table.increment(day, &tag);
/// table.increment(day, &tag);
/// assert_eq!(table.get(day, &tag), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: BTreeMap<CountKey, u64>,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more question for `tag` in `bucket`, returning the new count
    pub fn increment(&mut self, bucket: BucketDate, tag: &Tag) -> u64 {
        let count = self
            .counts
            .entry(CountKey::new(bucket, tag.clone()))
            .or_insert(0);
        *count += 1;
        *count
    }

    /// Count for a key, zero when absent
    pub fn get(&self, bucket: BucketDate, tag: &Tag) -> u64 {
        self.counts
            .get(&CountKey::new(bucket, tag.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct (bucket, tag) keys
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Sum of the counts recorded for one tag
    pub fn total_for_tag(&self, tag: &Tag) -> u64 {
        self.counts
            .iter()
            .filter(|(key, _)| &key.tag == tag)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CountKey, &u64)> {
        self.counts.iter()
    }

    /// Render the table as output rows
    pub fn rows(&self) -> Vec<CountRow> {
        self.counts
            .iter()
            .map(|(key, count)| CountRow {
                date: key.bucket.to_string(),
                tag: key.tag.to_string(),
                questions_count: *count,
            })
            .collect()
    }
}

/// A question record as returned by the API
///
/// Only `creation_date` is needed for counting. It stays optional so a
/// record without it can be detected instead of failing the page decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    /// Creation time in unix seconds
    #[serde(default)]
    pub creation_date: Option<i64>,
    /// Question id, used in diagnostics
    #[serde(default)]
    pub question_id: Option<u64>,
}

impl RawItem {
    /// Creation time as a UTC timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.creation_date
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// One decoded page of the `/questions` response wrapper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionsPage {
    #[serde(default)]
    pub items: Vec<RawItem>,
    #[serde(default)]
    pub has_more: bool,
    /// Seconds the client must wait before its next request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_remaining: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl QuestionsPage {
    /// Whether the API signalled that the caller's quota is used up
    pub fn is_quota_exhausted(&self) -> bool {
        self.quota_remaining == Some(0)
    }

    /// Mandatory pause before the next request, if any
    pub fn backoff_duration(&self) -> Option<Duration> {
        self.backoff
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// `error_name: error_message (error_id N)` when the page is an error wrapper
    pub fn api_error(&self) -> Option<String> {
        let mut summary = match (self.error_name.as_deref(), self.error_message.as_deref()) {
            (Some(name), Some(message)) => format!("{name}: {message}"),
            (Some(text), None) | (None, Some(text)) => text.to_string(),
            (None, None) => return self.error_id.map(|id| format!("error_id {id}")),
        };
        if let Some(id) = self.error_id {
            summary.push_str(&format!(" (error_id {id})"));
        }
        Some(summary)
    }
}

/// Parameters of a single `/questions` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub site: String,
    pub tag: Tag,
    /// Inclusive lower bound, unix seconds
    pub fromdate: i64,
    /// Exclusive upper bound, unix seconds
    pub todate: i64,
    /// 1-based page number
    pub page: u32,
    pub pagesize: u32,
    /// Optional application key, raises the daily quota
    pub key: Option<String>,
}

impl PageQuery {
    pub const ORDER: &'static str = "asc";
    pub const SORT: &'static str = "creation";
    pub const FILTER: &'static str = "default";

    /// Query string pairs in the order the API documents them
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("site", self.site.clone()),
            ("tagged", self.tag.to_string()),
            ("fromdate", self.fromdate.to_string()),
            ("todate", self.todate.to_string()),
            ("page", self.page.to_string()),
            ("pagesize", self.pagesize.to_string()),
            ("order", Self::ORDER.to_string()),
            ("sort", Self::SORT.to_string()),
            ("filter", Self::FILTER.to_string()),
        ];
        if let Some(key) = &self.key {
            params.push(("key", key.clone()));
        }
        params
    }
}
